mod api;
mod artifacts;
mod cache;
mod config;
mod db;
mod logging;
mod weather;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::artifacts::{ArtifactStore, LocalJsonStore};
use crate::cache::{MemoryCache, MetadataCache, SqliteCache};
use crate::config::{CacheBackend, Config};
use crate::db::SqliteAuditLog;
use crate::weather::{OpenWeatherClient, ServiceSettings, WeatherService};

#[derive(Parser, Debug)]
#[command(name = "weather-cache")]
#[command(about = "Current-weather API with a cache-aside artifact store")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./weather-cache.yaml or $XDG_CONFIG_HOME/weather-cache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Address to listen on, e.g. 0.0.0.0:8000
  #[arg(short, long)]
  bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override bind address if specified on command line
  let config = if let Some(bind) = args.bind {
    Config {
      server: config::ServerConfig { bind },
      ..config
    }
  } else {
    config
  };

  let _log_guard = logging::init(config.log.file.as_deref())?;

  let service = build_service(&config)?;
  api::serve(Arc::new(service), &config.server.bind).await
}

/// Wire the service to its collaborators once, at startup.
fn build_service(config: &Config) -> Result<WeatherService> {
  let upstream = OpenWeatherClient::new(config.upstream_url()?, config.upstream_timeout()?)?;
  let artifacts: Arc<dyn ArtifactStore> = Arc::new(LocalJsonStore::open(&config.storage.data_dir)?);
  let audit = SqliteAuditLog::open(&config.storage.sqlite_path)?;

  let cache: Arc<dyn MetadataCache> = match config.cache.backend {
    CacheBackend::Sqlite => Arc::new(SqliteCache::open(&config.cache.path)?),
    CacheBackend::Memory => Arc::new(MemoryCache::new()),
  };

  tracing::info!(
    data_dir = %config.storage.data_dir.display(),
    audit_db = %config.storage.sqlite_path.display(),
    cache = ?config.cache.backend,
    ttl_secs = config.cache.ttl_secs,
    "weather service configured"
  );

  Ok(WeatherService::new(
    Arc::new(upstream),
    artifacts,
    Arc::new(audit),
    cache,
    ServiceSettings {
      api_key: Config::get_api_key()?,
      units: config.upstream.units.clone(),
      cache_ttl: config.cache_ttl(),
      upstream_timeout: config.upstream_timeout()?,
    },
  ))
}
