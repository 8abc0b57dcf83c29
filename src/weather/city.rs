//! City name normalization and the keys derived from it.

use std::fmt;

use thiserror::Error;

/// Longest accepted city name, in characters, after normalization.
pub const MAX_CITY_LEN: usize = 120;

/// Rejection reasons for a raw city string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("City must be a non-empty string.")]
  Empty,
  #[error("City is too long ({len} characters, at most {MAX_CITY_LEN}).")]
  TooLong { len: usize },
}

/// A validated city name.
///
/// `display` keeps the caller's casing and is what goes upstream and back to
/// clients. `lookup` is the lower-cased form used to address the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CityKey {
  display: String,
  lookup: String,
}

impl CityKey {
  /// Trim, collapse whitespace runs to a single space and validate length.
  pub fn parse(raw: &str) -> Result<Self, ValidationError> {
    let display = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if display.is_empty() {
      return Err(ValidationError::Empty);
    }

    let len = display.chars().count();
    if len > MAX_CITY_LEN {
      return Err(ValidationError::TooLong { len });
    }

    let lookup = display.to_lowercase();
    Ok(Self { display, lookup })
  }

  pub fn display(&self) -> &str {
    &self.display
  }

  pub fn lookup(&self) -> &str {
    &self.lookup
  }
}

impl fmt::Display for CityKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.display)
  }
}

/// Namespaced key under which cache backends store a city's entry.
pub fn cache_key(lookup: &str) -> String {
  format!("weather:{}", lookup)
}

/// Upper bound on a file stem in bytes. Leaves room for the timestamp and
/// collision suffix within the usual 255-byte file name limit.
pub const MAX_STEM_BYTES: usize = 200;

/// Filesystem-safe stem for artifact files.
///
/// Lower-cases, turns spaces into underscores and drops anything that is not
/// alphanumeric, `_` or `-`. The result is cut to [`MAX_STEM_BYTES`] on a
/// character boundary.
pub fn safe_file_stem(city: &str) -> String {
  let mut cleaned = String::new();
  for c in city
    .trim()
    .to_lowercase()
    .replace(' ', "_")
    .chars()
    .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
  {
    if cleaned.len() + c.len_utf8() > MAX_STEM_BYTES {
      break;
    }
    cleaned.push(c);
  }

  if cleaned.is_empty() {
    "unknown".to_string()
  } else {
    cleaned
  }
}
