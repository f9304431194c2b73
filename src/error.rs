//! API error type and its mapping to HTTP responses.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::db::DbLockError;
use crate::session::SessionLockError;

#[derive(Debug)]
pub enum AppError {
  // 400
  BadRequest(String),
  // 404
  NotFound(String),
  // 500, message is logged but not returned to the client
  Internal(String),
}

impl fmt::Display for AppError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::BadRequest(msg) => write!(f, "bad request: {}", msg),
      Self::NotFound(msg) => write!(f, "not found: {}", msg),
      Self::Internal(msg) => write!(f, "internal error: {}", msg),
    }
  }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
      Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
      Self::Internal(msg) => {
        tracing::error!("Internal error: {}", msg);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
      }
    };

    (status, Json(json!({ "error": message }))).into_response()
  }
}

impl From<rusqlite::Error> for AppError {
  fn from(err: rusqlite::Error) -> Self {
    Self::Internal(err.to_string())
  }
}

impl From<DbLockError> for AppError {
  fn from(err: DbLockError) -> Self {
    Self::Internal(err.to_string())
  }
}

impl From<SessionLockError> for AppError {
  fn from(err: SessionLockError) -> Self {
    Self::Internal(err.to_string())
  }
}

impl From<serde_json::Error> for AppError {
  fn from(err: serde_json::Error) -> Self {
    Self::BadRequest(err.to_string())
  }
}

pub type AppResult<T> = Result<T, AppError>;
