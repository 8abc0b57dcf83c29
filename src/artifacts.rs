//! Durable store for raw upstream payloads.
//!
//! Every live fetch produces one pretty-printed JSON file named after the city
//! and the fetch second (`tbilisi_20260218T120000Z.json`). Files are created
//! with create-new semantics and never rewritten. A second write for the same
//! city and second gets a zero-padded `_0001` style suffix, which sorts after
//! the unsuffixed name, so lexical order follows write order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::weather::city::safe_file_stem;

/// Give up after this many same-second collisions for one city.
const MAX_SUFFIX: u32 = 1000;

/// Write-once / read-by-path JSON document store.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
  /// Persist `payload` for `city` fetched at `timestamp`; returns the new path.
  async fn write(&self, city: &str, payload: &Value, timestamp: DateTime<Utc>) -> Result<String>;

  /// Load a previously written artifact.
  async fn read(&self, path: &str) -> Result<Value>;
}

/// Artifact store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalJsonStore {
  dir: PathBuf,
}

impl LocalJsonStore {
  /// Use `dir` as the artifact root, creating it if needed.
  pub fn open(dir: &Path) -> Result<Self> {
    std::fs::create_dir_all(dir)
      .map_err(|e| eyre!("Failed to create data directory {}: {}", dir.display(), e))?;

    Ok(Self {
      dir: dir.to_path_buf(),
    })
  }

  fn candidate(&self, stem: &str, stamp: &str, attempt: u32) -> PathBuf {
    let name = if attempt == 0 {
      format!("{}_{}.json", stem, stamp)
    } else {
      format!("{}_{}_{:04}.json", stem, stamp, attempt)
    };
    self.dir.join(name)
  }
}

#[async_trait]
impl ArtifactStore for LocalJsonStore {
  async fn write(&self, city: &str, payload: &Value, timestamp: DateTime<Utc>) -> Result<String> {
    let stem = safe_file_stem(city);
    let stamp = timestamp.format("%Y%m%dT%H%M%SZ").to_string();
    let raw = serde_json::to_vec_pretty(payload)
      .map_err(|e| eyre!("Failed to serialize artifact for {}: {}", city, e))?;

    for attempt in 0..=MAX_SUFFIX {
      let path = self.candidate(&stem, &stamp, attempt);

      let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
      {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
        Err(e) => return Err(eyre!("Failed to create artifact {}: {}", path.display(), e)),
      };

      file
        .write_all(&raw)
        .await
        .map_err(|e| eyre!("Failed to write artifact {}: {}", path.display(), e))?;
      file
        .sync_all()
        .await
        .map_err(|e| eyre!("Failed to flush artifact {}: {}", path.display(), e))?;

      return Ok(path.to_string_lossy().into_owned());
    }

    Err(eyre!(
      "Too many artifacts for {} at {}; giving up",
      city,
      stamp
    ))
  }

  async fn read(&self, path: &str) -> Result<Value> {
    let bytes = fs::read(path)
      .await
      .map_err(|e| eyre!("Failed to read artifact {}: {}", path, e))?;

    serde_json::from_slice(&bytes).map_err(|e| eyre!("Corrupt artifact {}: {}", path, e))
  }
}
