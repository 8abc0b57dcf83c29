//! Core trait for the metadata cache.

use async_trait::async_trait;
use color_eyre::Result;
use std::time::Duration;

use crate::weather::types::CacheEntry;

/// Ephemeral key → [`CacheEntry`] mapping with expiration.
///
/// Keys are lower-cased, whitespace-normalized city names. Backends are free to
/// namespace them further. A backend that cannot be read must return `Err`
/// rather than pretend the key is absent.
#[async_trait]
pub trait MetadataCache: Send + Sync {
  /// Fetch the live entry for `key`, or `None` if missing or expired.
  async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

  /// Store `entry` under `key`, replacing any previous entry, for `ttl`.
  async fn set(&self, key: &str, entry: &CacheEntry, ttl: Duration) -> Result<()>;
}
