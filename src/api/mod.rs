//! HTTP REST API
//!
//! Thin adapter over [`WeatherService`]: it parses the query string, calls the
//! service and turns each outcome into a status code and JSON body.

mod error;

use axum::{
  extract::{Query, State},
  routing::get,
  Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::weather::types::Source;
use crate::weather::WeatherService;

pub use error::ApiError;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
  pub weather: Arc<WeatherService>,
}

/// Query params for /weather
#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
  /// City name, e.g. "Tbilisi". Missing is treated like empty.
  #[serde(default)]
  pub city: String,
}

/// JSON response for /weather
#[derive(Debug, Serialize, Deserialize)]
pub struct WeatherResponse {
  /// Normalized city name
  pub city: String,
  /// When this response was produced (RFC 3339, UTC)
  pub timestamp_utc: String,
  pub source: Source,
  /// Raw upstream payload
  pub data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
  pub status: String,
}

/// GET /weather?city=... - Current weather for a city
async fn get_weather(
  State(state): State<AppState>,
  Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherResponse>, ApiError> {
  let result = state.weather.get_weather(&query.city).await?;

  Ok(Json(WeatherResponse {
    city: result.city,
    timestamp_utc: Utc::now().to_rfc3339(),
    source: result.source,
    data: result.data,
  }))
}

/// GET /health - Health check endpoint
async fn health_check() -> Json<HealthResponse> {
  Json(HealthResponse {
    status: "ok".to_string(),
  })
}

/// Create the HTTP router
pub fn create_router(weather: Arc<WeatherService>) -> Router {
  let state = AppState { weather };

  Router::new()
    .route("/health", get(health_check))
    .route("/weather", get(get_weather))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Serve the API on `bind` until ctrl-c.
pub async fn serve(weather: Arc<WeatherService>, bind: &str) -> color_eyre::Result<()> {
  use color_eyre::eyre::eyre;

  let app = create_router(weather);

  let listener = tokio::net::TcpListener::bind(bind)
    .await
    .map_err(|e| eyre!("Failed to bind {}: {}", bind, e))?;
  tracing::info!("HTTP server listening on {}", bind);

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      tracing::info!("Shutting down");
    })
    .await
    .map_err(|e| eyre!("HTTP server failed: {}", e))?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::artifacts::LocalJsonStore;
  use crate::cache::{MemoryCache, MetadataCache};
  use crate::db::SqliteAuditLog;
  use crate::weather::client::UpstreamClient;
  use crate::weather::types::{CacheEntry, UpstreamResponse};
  use crate::weather::ServiceSettings;
  use async_trait::async_trait;
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use serde_json::json;
  use std::collections::BTreeMap;
  use std::time::Duration;
  use tower::ServiceExt; // for `oneshot`

  /// Answers 404 for "NoSuchCity", 503 for "Flaky", 200 otherwise.
  struct ScriptedUpstream;

  #[async_trait]
  impl UpstreamClient for ScriptedUpstream {
    async fn fetch(
      &self,
      query: &str,
      _params: &BTreeMap<String, String>,
    ) -> color_eyre::Result<UpstreamResponse> {
      let (status, body) = match query {
        "NoSuchCity" => (404, json!({"cod": "404", "message": "city not found"})),
        "Flaky" => (503, Value::Null),
        _ => (200, json!({"name": query, "main": {"temp": 12}})),
      };
      Ok(UpstreamResponse { status, body })
    }
  }

  struct TestApp {
    _dir: tempfile::TempDir,
    cache: MemoryCache,
    router: Router,
  }

  fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let cache = MemoryCache::new();

    let service = WeatherService::new(
      Arc::new(ScriptedUpstream),
      Arc::new(LocalJsonStore::open(&dir.path().join("data")).unwrap()),
      Arc::new(SqliteAuditLog::open(&dir.path().join("app.db")).unwrap()),
      Arc::new(cache.clone()),
      ServiceSettings {
        api_key: "test-key".to_string(),
        units: "metric".to_string(),
        cache_ttl: Duration::from_secs(300),
        upstream_timeout: Duration::from_secs(5),
      },
    );

    TestApp {
      _dir: dir,
      cache,
      router: create_router(Arc::new(service)),
    }
  }

  async fn send_get(router: &Router, uri: &str) -> Result<(StatusCode, Value), String> {
    let request = Request::builder()
      .uri(uri)
      .body(Body::empty())
      .map_err(|e| e.to_string())?;

    let response = router
      .clone()
      .oneshot(request)
      .await
      .map_err(|e| format!("Request failed: {:?}", e))?;

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .map_err(|e| e.to_string())?;
    let body = serde_json::from_slice(&bytes).map_err(|e| e.to_string())?;

    Ok((status, body))
  }

  #[tokio::test]
  async fn test_live_then_cached() -> Result<(), String> {
    let app = test_app();

    let (status, body) = send_get(&app.router, "/weather?city=%20%20Tbilisi%20").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Tbilisi");
    assert_eq!(body["source"], "live");
    assert_eq!(body["data"]["main"]["temp"], 12);
    assert!(body["timestamp_utc"].as_str().is_some());

    let (status, body) = send_get(&app.router, "/weather?city=tbilisi").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "tbilisi");
    assert_eq!(body["source"], "cache");
    assert_eq!(body["data"]["name"], "Tbilisi");
    Ok(())
  }

  #[tokio::test]
  async fn test_validation_is_400() -> Result<(), String> {
    let app = test_app();

    let (status, body) = send_get(&app.router, "/weather?city=%20%20%20").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "City must be a non-empty string.");

    let (status, _) = send_get(&app.router, "/weather").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
  }

  #[tokio::test]
  async fn test_not_found_is_404() -> Result<(), String> {
    let app = test_app();

    let (status, body) = send_get(&app.router, "/weather?city=NoSuchCity").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "City not found: NoSuchCity");
    Ok(())
  }

  #[tokio::test]
  async fn test_upstream_error_is_502() -> Result<(), String> {
    let app = test_app();

    let (status, body) = send_get(&app.router, "/weather?city=Flaky").await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["detail"], "Upstream weather API error (status 503)");
    Ok(())
  }

  #[tokio::test]
  async fn test_dangling_cache_entry_is_500() -> Result<(), String> {
    let app = test_app();
    app
      .cache
      .set(
        "oslo",
        &CacheEntry {
          artifact_path: "/nonexistent/oslo.json".to_string(),
          fetched_at: Utc::now(),
        },
        Duration::from_secs(300),
      )
      .await
      .map_err(|e| e.to_string())?;

    let (status, body) = send_get(&app.router, "/weather?city=Oslo").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Internal server error");
    Ok(())
  }

  #[tokio::test]
  async fn test_health() -> Result<(), String> {
    let app = test_app();

    let (status, body) = send_get(&app.router, "/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
  }
}
