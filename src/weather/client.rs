use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use url::Url;

use super::types::UpstreamResponse;

/// The upstream weather provider, seen as a request/response function.
///
/// Implementations return `Ok` for every HTTP status, including errors.
/// Only transport failures (DNS, connect, reset, timeout) are `Err`.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
  async fn fetch(&self, query: &str, params: &BTreeMap<String, String>)
    -> Result<UpstreamResponse>;
}

/// OpenWeatherMap current-weather client.
#[derive(Clone)]
pub struct OpenWeatherClient {
  http: reqwest::Client,
  base_url: Url,
}

impl OpenWeatherClient {
  pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("weather-cache/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }
}

#[async_trait]
impl UpstreamClient for OpenWeatherClient {
  async fn fetch(
    &self,
    query: &str,
    params: &BTreeMap<String, String>,
  ) -> Result<UpstreamResponse> {
    let mut pairs: Vec<(&str, &str)> = vec![("q", query)];
    pairs.extend(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let response = self
      .http
      .get(self.base_url.clone())
      .query(&pairs)
      .send()
      .await
      .map_err(|e| eyre!("Weather request for {} failed: {}", query, e))?;

    let status = response.status().as_u16();
    let bytes = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read weather response body: {}", e))?;

    Ok(UpstreamResponse {
      status,
      body: parse_body(&bytes),
    })
  }
}

/// Error pages are not always JSON; anything unparseable becomes `Null`.
fn parse_body(bytes: &[u8]) -> Value {
  serde_json::from_slice(bytes).unwrap_or(Value::Null)
}
