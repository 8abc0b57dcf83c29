use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::{Deserialize, Serialize};

use crate::weather::WeatherError;

/// JSON error body: `{"detail": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
  #[serde(skip)]
  status: u16,
  pub detail: String,
}

impl ApiError {
  pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
    Self {
      status: status.as_u16(),
      detail: detail.into(),
    }
  }

  pub fn status_code(&self) -> StatusCode {
    StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
  }
}

impl From<WeatherError> for ApiError {
  fn from(err: WeatherError) -> Self {
    match &err {
      WeatherError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
      WeatherError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, err.to_string()),
      WeatherError::Upstream { .. } => Self::new(StatusCode::BAD_GATEWAY, err.to_string()),
      WeatherError::Infrastructure(report) => {
        // Log the full chain; clients only get a generic message.
        tracing::error!("Infrastructure failure: {:?}", report);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status_code();
    (status, Json(self)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::weather::city::ValidationError;
  use color_eyre::eyre::eyre;

  #[test]
  fn test_status_mapping() {
    let cases = [
      (
        WeatherError::from(ValidationError::Empty),
        StatusCode::BAD_REQUEST,
      ),
      (
        WeatherError::NotFound {
          city: "Atlantis".to_string(),
        },
        StatusCode::NOT_FOUND,
      ),
      (WeatherError::upstream_status(500), StatusCode::BAD_GATEWAY),
      (WeatherError::upstream_unavailable(), StatusCode::BAD_GATEWAY),
      (
        WeatherError::Infrastructure(eyre!("disk on fire")),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];

    for (err, expected) in cases {
      assert_eq!(ApiError::from(err).status_code(), expected);
    }
  }

  #[test]
  fn test_infrastructure_detail_is_generic() {
    let api = ApiError::from(WeatherError::Infrastructure(eyre!("/secret/path missing")));
    assert_eq!(api.detail, "Internal server error");
  }

  #[test]
  fn test_body_only_has_detail() {
    let json = serde_json::to_value(ApiError::new(StatusCode::NOT_FOUND, "nope")).unwrap();
    assert_eq!(json, serde_json::json!({"detail": "nope"}));
  }
}
