use thiserror::Error;

use super::city::ValidationError;

/// Every way a weather lookup can fail.
#[derive(Debug, Error)]
pub enum WeatherError {
  /// Malformed city input; nothing was attempted.
  #[error(transparent)]
  Validation(#[from] ValidationError),

  /// The provider says the city does not exist.
  #[error("City not found: {city}")]
  NotFound { city: String },

  /// Provider returned an error status, or the call itself failed (`status` is `None`).
  #[error("Upstream weather API error{}", .status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
  Upstream { status: Option<u16> },

  /// Cache, artifact store or audit log failed.
  #[error("Infrastructure failure: {0}")]
  Infrastructure(color_eyre::Report),
}

impl WeatherError {
  pub fn upstream_status(status: u16) -> Self {
    Self::Upstream {
      status: Some(status),
    }
  }

  pub fn upstream_unavailable() -> Self {
    Self::Upstream { status: None }
  }
}

impl From<color_eyre::Report> for WeatherError {
  fn from(report: color_eyre::Report) -> Self {
    Self::Infrastructure(report)
  }
}
