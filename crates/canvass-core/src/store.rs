//! The `SurveyStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `canvass-store-sqlite`). Higher layers (`canvass-api`, `canvass-cli`)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  response::{NewResponse, Response, ResultsView},
  survey::{NewSurvey, Survey, SurveyKind, SurveyStatus},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`SurveyStore::list_surveys`].
///
/// Filters on *stored* status — effective status is a display concern and is
/// resolved above the store.
#[derive(Debug, Clone, Default)]
pub struct SurveyFilter {
  /// Free-text filter applied over title and object.
  pub text:       Option<String>,
  pub kind:       Option<SurveyKind>,
  pub status:     Option<SurveyStatus>,
  /// Restrict to surveys owned by this actor.
  pub created_by: Option<Uuid>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Canvass survey store backend.
///
/// Status transitions and review toggles are check-and-set writes keyed on
/// the caller's last-seen `updated_at` token; a mismatch is reported as
/// [`crate::Error::StaleToken`] and nothing is written.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SurveyStore: Send + Sync {
  type Error: std::error::Error
    + Into<crate::Error>
    + Send
    + Sync
    + 'static;

  // ── Surveys ───────────────────────────────────────────────────────────

  /// Create and persist a new survey. Status starts at `pending`;
  /// `created_at` and `updated_at` are set by the store.
  fn create_survey(
    &self,
    input: NewSurvey,
  ) -> impl Future<Output = Result<Survey, Self::Error>> + Send + '_;

  /// Retrieve a survey by UUID. Returns `None` if not found.
  fn get_survey(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Survey>, Self::Error>> + Send + '_;

  /// List surveys matching `filter`, newest first.
  fn list_surveys<'a>(
    &'a self,
    filter: &'a SurveyFilter,
  ) -> impl Future<Output = Result<Vec<Survey>, Self::Error>> + Send + 'a;

  // ── Lifecycle writes ──────────────────────────────────────────────────

  /// Request the transition to `target`, carrying the last-seen
  /// `updated_at` as `token`.
  ///
  /// Fails with `SurveyNotFound`, `StaleToken` (checked before the
  /// transition table), or `InvalidTransition`. On success returns the
  /// updated record, which callers re-adopt as ground truth.
  fn change_status(
    &self,
    id:     Uuid,
    target: SurveyStatus,
    token:  DateTime<Utc>,
  ) -> impl Future<Output = Result<Survey, Self::Error>> + Send + '_;

  /// Set the review-permission flag, carrying the last-seen `updated_at`
  /// as `token`. The flag is independently toggleable in any status; it
  /// only takes effect once the survey is closed.
  fn set_review_permission(
    &self,
    id:    Uuid,
    allow: bool,
    token: DateTime<Utc>,
  ) -> impl Future<Output = Result<Survey, Self::Error>> + Send + '_;

  // ── Responses ─────────────────────────────────────────────────────────

  /// Record a response. Fails unless the survey's effective status is
  /// `active` at the store's current time, or if the respondent already
  /// answered.
  fn record_response(
    &self,
    input: NewResponse,
  ) -> impl Future<Output = Result<Response, Self::Error>> + Send + '_;

  /// Materialise a [`ResultsView`] for a survey. Returns `None` if the
  /// survey does not exist. `as_of` defaults to now.
  fn get_results(
    &self,
    survey_id: Uuid,
    as_of:     Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Option<ResultsView>, Self::Error>> + Send + '_;
}
