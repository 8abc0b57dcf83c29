//! Weather lookups with cache-aside over the artifact store.

use chrono::{DateTime, Utc};
use color_eyre::eyre::{eyre, WrapErr};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::artifacts::ArtifactStore;
use crate::cache::MetadataCache;
use crate::db::AuditLog;

use super::city::CityKey;
use super::client::UpstreamClient;
use super::error::WeatherError;
use super::types::{CacheEntry, LogEntry, UpstreamResponse, WeatherResult};

/// Fixed, per-deployment knobs for [`WeatherService`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
  pub api_key: String,
  pub units: String,
  pub cache_ttl: Duration,
  pub upstream_timeout: Duration,
}

/// Answers "what is the weather in X" from cache or upstream.
///
/// Built once at startup with its collaborators bound and shared behind an
/// `Arc`. Holds no per-request state, so concurrent calls need no coordination.
/// Two concurrent misses for one city both go upstream; each writes its own
/// artifact and the cache keeps whichever write lands last.
pub struct WeatherService {
  upstream: Arc<dyn UpstreamClient>,
  artifacts: Arc<dyn ArtifactStore>,
  audit: Arc<dyn AuditLog>,
  cache: Arc<dyn MetadataCache>,
  params: BTreeMap<String, String>,
  cache_ttl: Duration,
  upstream_timeout: Duration,
}

impl WeatherService {
  pub fn new(
    upstream: Arc<dyn UpstreamClient>,
    artifacts: Arc<dyn ArtifactStore>,
    audit: Arc<dyn AuditLog>,
    cache: Arc<dyn MetadataCache>,
    settings: ServiceSettings,
  ) -> Self {
    let params = BTreeMap::from([
      ("appid".to_string(), settings.api_key),
      ("units".to_string(), settings.units),
    ]);

    Self {
      upstream,
      artifacts,
      audit,
      cache,
      params,
      cache_ttl: settings.cache_ttl,
      upstream_timeout: settings.upstream_timeout,
    }
  }

  /// Look up current weather for a free-text city name.
  ///
  /// 1. Normalize the name (no I/O on failure)
  /// 2. On a cache hit, return the stored artifact
  /// 3. On a miss, call upstream once and classify the status
  /// 4. Persist artifact, audit row and cache entry, in that order
  pub async fn get_weather(&self, raw_city: &str) -> Result<WeatherResult, WeatherError> {
    let city = CityKey::parse(raw_city)?;

    if let Some(entry) = self
      .cache
      .get(city.lookup())
      .await
      .wrap_err_with(|| format!("Cache lookup for {} failed", city.lookup()))?
    {
      debug!(city = %city, path = %entry.artifact_path, "cache hit");
      // The cache claims the artifact exists; a failed read is a real fault.
      let data = self
        .artifacts
        .read(&entry.artifact_path)
        .await
        .wrap_err_with(|| format!("Cached artifact for {} is unreadable", city))?;
      return Ok(WeatherResult::from_cache(city.display(), data));
    }

    debug!(city = %city, "cache miss");
    let response = self.call_upstream(&city).await?;
    let payload = classify(&city, response)?;

    let fetched_at = Utc::now();
    let payload = self.persist(&city, payload, fetched_at).await?;
    info!(city = %city, fetched_at = %fetched_at.to_rfc3339(), "live fetch stored");

    Ok(WeatherResult::live(city.display(), payload))
  }

  async fn call_upstream(&self, city: &CityKey) -> Result<UpstreamResponse, WeatherError> {
    let call = self.upstream.fetch(city.display(), &self.params);

    match tokio::time::timeout(self.upstream_timeout, call).await {
      Ok(Ok(response)) => Ok(response),
      Ok(Err(e)) => {
        warn!(city = %city, error = %e, "upstream request failed");
        Err(WeatherError::upstream_unavailable())
      }
      Err(_) => {
        warn!(city = %city, timeout = ?self.upstream_timeout, "upstream request timed out");
        Err(WeatherError::upstream_unavailable())
      }
    }
  }

  /// Write artifact, then audit row, then cache entry.
  ///
  /// Runs on its own task so the sequence finishes even if the caller goes
  /// away mid-request. No rollback: every write uses a fresh path or replaces
  /// a whole cache entry.
  async fn persist(
    &self,
    city: &CityKey,
    payload: Value,
    fetched_at: DateTime<Utc>,
  ) -> Result<Value, WeatherError> {
    let artifacts = Arc::clone(&self.artifacts);
    let audit = Arc::clone(&self.audit);
    let cache = Arc::clone(&self.cache);
    let ttl = self.cache_ttl;
    let display = city.display().to_string();
    let lookup = city.lookup().to_string();

    let task = tokio::spawn(async move {
      let path = artifacts
        .write(&display, &payload, fetched_at)
        .await
        .wrap_err_with(|| format!("Failed to store artifact for {}", display))?;

      audit
        .append(&LogEntry {
          city: display.clone(),
          timestamp_utc: fetched_at,
          file_path: path.clone(),
        })
        .await
        .wrap_err_with(|| format!("Failed to log fetch for {}", display))?;

      cache
        .set(
          &lookup,
          &CacheEntry {
            artifact_path: path,
            fetched_at,
          },
          ttl,
        )
        .await
        .wrap_err_with(|| format!("Failed to cache entry for {}", lookup))?;

      Ok::<_, color_eyre::Report>(payload)
    });

    let payload = task
      .await
      .map_err(|e| eyre!("Write sequence task failed: {}", e))??;

    Ok(payload)
  }
}

/// Map an upstream response to a payload or a client-facing error.
fn classify(city: &CityKey, response: UpstreamResponse) -> Result<Value, WeatherError> {
  match response.status {
    404 => Err(WeatherError::NotFound {
      city: city.display().to_string(),
    }),
    status if status >= 400 => {
      warn!(city = %city, status, "upstream returned error status");
      Err(WeatherError::upstream_status(status))
    }
    status => match response.body {
      body @ Value::Object(_) => Ok(body),
      _ => {
        warn!(city = %city, status, "upstream returned a non-object body");
        Err(WeatherError::upstream_status(status))
      }
    },
  }
}
