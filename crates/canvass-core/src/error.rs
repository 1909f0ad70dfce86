//! Error types for `canvass-core`.
//!
//! Domain failures are individual variants so transport layers can map them
//! to structured error codes; backend-specific failures collapse into
//! [`Error::Storage`].

use thiserror::Error;
use uuid::Uuid;

use crate::survey::SurveyStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("survey not found: {0}")]
  SurveyNotFound(Uuid),

  #[error("invalid status transition: {from} -> {to}")]
  InvalidTransition {
    from: SurveyStatus,
    to:   SurveyStatus,
  },

  /// The caller's `updated_at` token no longer matches the stored record —
  /// someone else wrote in between. The caller must re-fetch and retry.
  #[error("stale update token for survey {0}")]
  StaleToken(Uuid),

  #[error("survey {0} is not open for responses")]
  NotOpenForResponses(Uuid),

  #[error("respondent {respondent} already answered survey {survey_id}")]
  AlreadyResponded {
    survey_id:  Uuid,
    respondent: Uuid,
  },

  #[error("unknown status discriminant: {0:?}")]
  UnknownStatus(String),

  #[error("unknown survey kind discriminant: {0:?}")]
  UnknownKind(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
