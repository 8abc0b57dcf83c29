use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub upstream: UpstreamConfig,
  pub storage: StorageConfig,
  pub cache: CacheConfig,
  pub server: ServerConfig,
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
  pub base_url: String,
  /// Unit system passed to the provider (`metric`, `imperial`, `standard`)
  pub units: String,
  pub timeout_secs: f64,
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      units: "metric".to_string(),
      timeout_secs: 10.0,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
  /// Directory holding one JSON artifact per live fetch
  pub data_dir: PathBuf,
  /// SQLite database for the fetch audit log
  pub sqlite_path: PathBuf,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      data_dir: PathBuf::from("data"),
      sqlite_path: PathBuf::from("app.db"),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  /// Entries survive restarts
  #[default]
  Sqlite,
  /// Entries live only as long as the process
  Memory,
}

impl FromStr for CacheBackend {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "sqlite" => Ok(Self::Sqlite),
      "memory" => Ok(Self::Memory),
      other => Err(eyre!("Unknown cache backend '{}' (expected sqlite or memory)", other)),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub backend: CacheBackend,
  pub ttl_secs: u64,
  /// Database file for the sqlite backend
  pub path: PathBuf,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      backend: CacheBackend::Sqlite,
      ttl_secs: 300,
      path: PathBuf::from("cache.db"),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub bind: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind: "127.0.0.1:8000".to_string(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Also write logs to this file (rotated daily)
  pub file: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./weather-cache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/weather-cache/config.yaml
  ///
  /// With no file at all, built-in defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("weather-cache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("weather-cache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self> {
    // An empty file deserializes to unit, not to a mapping.
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  /// Override settings from environment variables.
  fn apply_env<F>(&mut self, var: F) -> Result<()>
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(v) = var("OPENWEATHER_BASE_URL") {
      self.upstream.base_url = v;
    }
    if let Some(v) = var("UNITS") {
      self.upstream.units = v;
    }
    if let Some(v) = var("HTTP_TIMEOUT_SECONDS") {
      self.upstream.timeout_secs = parse_env("HTTP_TIMEOUT_SECONDS", &v)?;
    }
    if let Some(v) = var("DATA_DIR") {
      self.storage.data_dir = PathBuf::from(v);
    }
    if let Some(v) = var("SQLITE_PATH") {
      self.storage.sqlite_path = PathBuf::from(v);
    }
    if let Some(v) = var("CACHE_BACKEND") {
      self.cache.backend = v.parse()?;
    }
    if let Some(v) = var("CACHE_TTL_SECONDS") {
      self.cache.ttl_secs = parse_env("CACHE_TTL_SECONDS", &v)?;
    }
    if let Some(v) = var("CACHE_PATH") {
      self.cache.path = PathBuf::from(v);
    }
    if let Some(v) = var("BIND_ADDR") {
      self.server.bind = v;
    }
    if let Some(v) = var("LOG_FILE") {
      self.log.file = Some(PathBuf::from(v));
    }
    Ok(())
  }

  fn validate(&self) -> Result<()> {
    self.upstream_url()?;
    self.upstream_timeout()?;
    Ok(())
  }

  /// Parsed provider endpoint.
  pub fn upstream_url(&self) -> Result<Url> {
    Url::parse(&self.upstream.base_url)
      .map_err(|e| eyre!("Invalid upstream base_url '{}': {}", self.upstream.base_url, e))
  }

  pub fn upstream_timeout(&self) -> Result<Duration> {
    Duration::try_from_secs_f64(self.upstream.timeout_secs)
      .ok()
      .filter(|d| !d.is_zero())
      .ok_or_else(|| {
        eyre!(
          "Invalid upstream timeout_secs {}: must be a positive number",
          self.upstream.timeout_secs
        )
      })
  }

  pub fn cache_ttl(&self) -> Duration {
    Duration::from_secs(self.cache.ttl_secs)
  }

  /// Get the OpenWeatherMap API key from the environment.
  ///
  /// Checks OPENWEATHER_API_KEY.
  pub fn get_api_key() -> Result<String> {
    std::env::var("OPENWEATHER_API_KEY")
      .map_err(|_| eyre!("API key not found. Set the OPENWEATHER_API_KEY environment variable."))
  }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  value
    .trim()
    .parse()
    .map_err(|e| eyre!("Invalid value for {} ('{}'): {}", name, value, e))
}
