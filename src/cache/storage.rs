//! SQLite implementation of the metadata cache.

use async_trait::async_trait;
use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, OptionalExtension};
use std::path::Path;
use std::time::Duration;

use super::traits::MetadataCache;
use crate::db::schema::CACHE_SCHEMA;
use crate::db::Database;
use crate::weather::city::cache_key;
use crate::weather::types::CacheEntry;

/// SQLite-based metadata cache.
///
/// Each row stores the JSON-encoded entry and an absolute expiry in unix
/// milliseconds. Expired rows are never returned and are swept on every write.
#[derive(Clone)]
pub struct SqliteCache {
  db: Database,
}

impl SqliteCache {
  /// Open (or create) the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    Ok(Self {
      db: Database::open(path, CACHE_SCHEMA)?,
    })
  }
}

#[async_trait]
impl MetadataCache for SqliteCache {
  async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
    let key = cache_key(key);
    let now = Utc::now().timestamp_millis();

    let raw: Option<String> = self
      .db
      .call(move |conn| {
        conn
          .query_row(
            "SELECT value FROM metadata_cache WHERE key = ? AND expires_at > ?",
            params![key, now],
            |row| row.get(0),
          )
          .optional()
          .map_err(|e| eyre!("Failed to read cache entry: {}", e))
      })
      .await?;

    match raw {
      Some(raw) => {
        let entry: CacheEntry = serde_json::from_str(&raw)
          .map_err(|e| eyre!("Failed to deserialize cache entry: {}", e))?;
        Ok(Some(entry))
      }
      None => Ok(None),
    }
  }

  async fn set(&self, key: &str, entry: &CacheEntry, ttl: Duration) -> Result<()> {
    let key = cache_key(key);
    let value =
      serde_json::to_string(entry).map_err(|e| eyre!("Failed to serialize cache entry: {}", e))?;
    let now = Utc::now().timestamp_millis();
    let expires_at = now.saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX));

    self
      .db
      .call(move |conn| {
        conn
          .execute(
            "DELETE FROM metadata_cache WHERE expires_at <= ?",
            params![now],
          )
          .map_err(|e| eyre!("Failed to purge expired cache entries: {}", e))?;

        conn
          .execute(
            "INSERT OR REPLACE INTO metadata_cache (key, value, expires_at) VALUES (?, ?, ?)",
            params![key, value, expires_at],
          )
          .map_err(|e| eyre!("Failed to store cache entry: {}", e))?;

        Ok(())
      })
      .await
  }
}
