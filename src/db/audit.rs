//! Append-only audit log of live fetches.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use rusqlite::params;
use std::path::Path;

use super::schema::LOG_SCHEMA;
use super::Database;
use crate::weather::types::LogEntry;

/// Sink for fetch records. Nothing in the service reads them back.
#[async_trait]
pub trait AuditLog: Send + Sync {
  async fn append(&self, entry: &LogEntry) -> Result<()>;
}

/// SQLite-backed audit log (`logs` table).
#[derive(Clone)]
pub struct SqliteAuditLog {
  db: Database,
}

impl SqliteAuditLog {
  pub fn open(path: &Path) -> Result<Self> {
    Ok(Self {
      db: Database::open(path, LOG_SCHEMA)?,
    })
  }

  #[cfg(test)]
  async fn entries(&self) -> Result<Vec<(String, String, String)>> {
    self
      .db
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT city, timestamp_utc, file_path FROM logs ORDER BY id")
          .map_err(|e| eyre!("Failed to prepare query: {}", e))?;
        let rows = stmt
          .query_map([], |row| {
            Ok((
              row.get::<_, String>(0)?,
              row.get::<_, String>(1)?,
              row.get::<_, String>(2)?,
            ))
          })
          .map_err(|e| eyre!("Failed to query logs: {}", e))?
          .collect::<rusqlite::Result<Vec<_>>>()
          .map_err(|e| eyre!("Failed to read log row: {}", e))?;
        Ok(rows)
      })
      .await
  }
}

#[async_trait]
impl AuditLog for SqliteAuditLog {
  async fn append(&self, entry: &LogEntry) -> Result<()> {
    let city = entry.city.clone();
    let timestamp = entry.timestamp_utc.to_rfc3339();
    let file_path = entry.file_path.clone();

    self
      .db
      .call(move |conn| {
        conn
          .execute(
            "INSERT INTO logs (city, timestamp_utc, file_path) VALUES (?, ?, ?)",
            params![city, timestamp, file_path],
          )
          .map_err(|e| eyre!("Failed to append audit log entry: {}", e))?;
        Ok(())
      })
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};

  #[tokio::test]
  async fn test_append_keeps_every_row_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let log = SqliteAuditLog::open(&dir.path().join("app.db")).unwrap();
    let ts = Utc.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap();

    for path in ["/data/a.json", "/data/b.json"] {
      log
        .append(&LogEntry {
          city: "Tbilisi".to_string(),
          timestamp_utc: ts,
          file_path: path.to_string(),
        })
        .await
        .unwrap();
    }

    let rows = log.entries().await.unwrap();
    assert_eq!(
      rows,
      vec![
        (
          "Tbilisi".to_string(),
          "2026-02-18T12:00:00+00:00".to_string(),
          "/data/a.json".to_string()
        ),
        (
          "Tbilisi".to_string(),
          "2026-02-18T12:00:00+00:00".to_string(),
          "/data/b.json".to_string()
        ),
      ]
    );
  }

  #[tokio::test]
  async fn test_log_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.db");

    SqliteAuditLog::open(&path)
      .unwrap()
      .append(&LogEntry {
        city: "Oslo".to_string(),
        timestamp_utc: Utc::now(),
        file_path: "/data/oslo.json".to_string(),
      })
      .await
      .unwrap();

    let reopened = SqliteAuditLog::open(&path).unwrap();
    assert_eq!(reopened.entries().await.unwrap().len(), 1);
  }
}
