//! Responses and the computed results view.
//!
//! A response is immutable once recorded. Results are never stored; they are
//! materialised on read from the survey and its responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::survey::Survey;

/// A single submitted response. At most one per `(survey, respondent)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
  pub response_id:  Uuid,
  pub survey_id:    Uuid,
  pub respondent:   Uuid,
  /// Schema-free answer payload; the answer structure is owned by the survey
  /// definition, not by this store.
  pub answers:      serde_json::Value,
  pub submitted_at: DateTime<Utc>,
}

/// Input to [`crate::store::SurveyStore::record_response`].
/// `submitted_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewResponse {
  pub survey_id:  Uuid,
  pub respondent: Uuid,
  pub answers:    serde_json::Value,
}

/// The computed read model for a survey's results — never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsView {
  pub survey:    Survey,
  /// The point in time at which this view was materialised.
  pub as_of:     DateTime<Utc>,
  /// All responses with `submitted_at <= as_of`, oldest first.
  pub responses: Vec<Response>,
}

impl ResultsView {
  pub fn total(&self) -> usize { self.responses.len() }
}
