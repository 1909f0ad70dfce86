//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure carries a machine-readable [`ErrorCode`] next to the human
//! message, so clients branch on the code and treat the text as display-only.
//! Matching on message substrings is exactly the fragility this replaces.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

// ─── Codes ───────────────────────────────────────────────────────────────────

/// Stable, machine-readable error discriminants exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
  Unauthenticated,
  Forbidden,
  NotFound,
  BadRequest,
  InvalidTransition,
  StaleToken,
  ActionInFlight,
  NotOpenForResponses,
  AlreadyResponded,
  Internal,
}

// ─── Error ───────────────────────────────────────────────────────────────────

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("invalid transition: {0}")]
  InvalidTransition(String),

  /// The caller's concurrency token is out of date; re-fetch and retry.
  #[error("stale token: {0}")]
  StaleToken(String),

  /// The same transition for the same survey is already being processed.
  #[error("action in flight: {0}")]
  ActionInFlight(String),

  #[error("not open for responses: {0}")]
  NotOpenForResponses(String),

  #[error("already responded: {0}")]
  AlreadyResponded(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn code(&self) -> ErrorCode {
    match self {
      Self::Unauthenticated(_) => ErrorCode::Unauthenticated,
      Self::Forbidden(_) => ErrorCode::Forbidden,
      Self::NotFound(_) => ErrorCode::NotFound,
      Self::BadRequest(_) => ErrorCode::BadRequest,
      Self::InvalidTransition(_) => ErrorCode::InvalidTransition,
      Self::StaleToken(_) => ErrorCode::StaleToken,
      Self::ActionInFlight(_) => ErrorCode::ActionInFlight,
      Self::NotOpenForResponses(_) => ErrorCode::NotOpenForResponses,
      Self::AlreadyResponded(_) => ErrorCode::AlreadyResponded,
      Self::Store(_) => ErrorCode::Internal,
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::InvalidTransition(_)
      | Self::ActionInFlight(_)
      | Self::NotOpenForResponses(_)
      | Self::AlreadyResponded(_) => StatusCode::CONFLICT,
      Self::StaleToken(_) => StatusCode::PRECONDITION_FAILED,
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn message(&self) -> String {
    match self {
      Self::Unauthenticated(m)
      | Self::Forbidden(m)
      | Self::NotFound(m)
      | Self::BadRequest(m)
      | Self::InvalidTransition(m)
      | Self::StaleToken(m)
      | Self::ActionInFlight(m)
      | Self::NotOpenForResponses(m)
      | Self::AlreadyResponded(m) => m.clone(),
      Self::Store(e) => e.to_string(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = json!({ "code": self.code(), "error": self.message() });
    (self.status(), Json(body)).into_response()
  }
}

// ─── Domain error mapping ────────────────────────────────────────────────────

impl From<canvass_core::Error> for ApiError {
  fn from(e: canvass_core::Error) -> Self {
    use canvass_core::Error as E;
    match e {
      E::SurveyNotFound(id) => Self::NotFound(format!("survey {id} not found")),
      E::InvalidTransition { .. } => Self::InvalidTransition(e.to_string()),
      E::StaleToken(_) => Self::StaleToken(e.to_string()),
      E::NotOpenForResponses(_) => Self::NotOpenForResponses(e.to_string()),
      E::AlreadyResponded { .. } => Self::AlreadyResponded(e.to_string()),
      other => Self::Store(Box::new(other)),
    }
  }
}

/// Map a store-level error through the core taxonomy.
pub(crate) fn store_err<E: Into<canvass_core::Error>>(e: E) -> ApiError {
  ApiError::from(e.into())
}
