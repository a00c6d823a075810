//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracer_core::{ErrorKind, store::StoreError, validate::ValidationErrors};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(ValidationErrors),

  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  Timeout(String),

  #[error("{0}")]
  Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a directory store failure. Conflicts are duplicate registrations.
  pub fn store<E: StoreError>(e: E) -> Self {
    if e.is_conflict() {
      Self::Conflict(e.to_string())
    } else {
      Self::Upstream(Box::new(e))
    }
  }
}

impl From<tracer_core::Error> for ApiError {
  fn from(e: tracer_core::Error) -> Self {
    match e.kind() {
      ErrorKind::NotFound => Self::NotFound(e.to_string()),
      ErrorKind::Conflict => Self::Conflict(e.to_string()),
      ErrorKind::Timeout => Self::Timeout(e.to_string()),
      ErrorKind::Validation => match e {
        tracer_core::Error::Validation(errors) => Self::BadRequest(errors),
        other => Self::Upstream(Box::new(other)),
      },
      ErrorKind::Upstream => Self::Upstream(Box::new(e)),
    }
  }
}

impl From<ValidationErrors> for ApiError {
  fn from(errors: ValidationErrors) -> Self { Self::BadRequest(errors) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(errors) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": format!("invalid request: {errors}"), "details": errors }),
      ),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::Timeout(m) => {
        (StatusCode::REQUEST_TIMEOUT, json!({ "error": m }))
      }
      ApiError::Upstream(e) => {
        tracing::error!(error = %e, "upstream failure");
        (StatusCode::BAD_GATEWAY, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
