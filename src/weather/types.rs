use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pointer stored in the metadata cache. Never holds the payload itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
  /// Location of the artifact written for this fetch
  pub artifact_path: String,
  /// When the upstream fetch happened
  pub fetched_at: DateTime<Utc>,
}

/// One audit row per live fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
  pub city: String,
  pub timestamp_utc: DateTime<Utc>,
  pub file_path: String,
}

/// Where a weather result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  /// Served from a stored artifact via the metadata cache
  Cache,
  /// Fetched from the upstream provider during this request
  Live,
}

/// Outcome of a successful weather lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherResult {
  /// Normalized display form of the requested city
  pub city: String,
  pub source: Source,
  /// Upstream payload, verbatim
  pub data: Value,
}

impl WeatherResult {
  pub fn from_cache(city: impl Into<String>, data: Value) -> Self {
    Self {
      city: city.into(),
      source: Source::Cache,
      data,
    }
  }

  pub fn live(city: impl Into<String>, data: Value) -> Self {
    Self {
      city: city.into(),
      source: Source::Live,
      data,
    }
  }
}

/// Raw response from the upstream provider.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
  pub status: u16,
  pub body: Value,
}
