//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use rota_core::Error as DutyError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  /// Anything the duty store reported, already converted to the core type.
  #[error(transparent)]
  Duty(#[from] DutyError),
}

impl ApiError {
  /// Convert a backend error through its core representation.
  pub fn store<E: Into<DutyError>>(err: E) -> Self { Self::Duty(err.into()) }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Duty(e) => match e {
        DutyError::SectorNotFound(_)
        | DutyError::UserNotFound(_)
        | DutyError::PoolEntryNotFound { .. } => StatusCode::NOT_FOUND,
        DutyError::ConflictExists { .. } => StatusCode::CONFLICT,
        DutyError::NoActivePool(_)
        | DutyError::UserNotInPool { .. }
        | DutyError::UserNotEligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DutyError::InvalidPeriod(_) => StatusCode::BAD_REQUEST,
        DutyError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  fn kind(&self) -> &'static str {
    match self {
      ApiError::BadRequest(_) => "bad_request",
      ApiError::Duty(e) => e.kind(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = json!({ "error": self.to_string(), "kind": self.kind() });
    (status, Json(body)).into_response()
  }
}
