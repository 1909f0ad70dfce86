//! Survey records — the unit of content managed by Canvass.
//!
//! A survey's `status` is authoritative server state: it changes only through
//! [`crate::store::SurveyStore::change_status`]. Everything a client displays
//! is derived from the latest fetched snapshot by the pure functions in
//! [`crate::policy`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The kind of instrument a survey record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyKind {
  Survey,
  Quiz,
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// The stored lifecycle state of a survey.
///
/// Transitions are one-directional in practice
/// (`pending → active ⇄ paused → closed`); `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
  Pending,
  Active,
  Paused,
  Closed,
}

impl SurveyStatus {
  /// No transition ever leaves `Closed`.
  pub fn is_terminal(self) -> bool { matches!(self, Self::Closed) }

  /// Whether a direct transition from `self` to `target` is permitted.
  ///
  /// The permitted edges are exactly: `pending → active`, `active → paused`,
  /// `active → closed`, `paused → active`, `paused → closed`.
  pub fn can_transition_to(self, target: SurveyStatus) -> bool {
    use SurveyStatus::*;
    matches!(
      (self, target),
      (Pending, Active)
        | (Active, Paused)
        | (Active, Closed)
        | (Paused, Active)
        | (Paused, Closed)
    )
  }

  /// The lowercase wire/database discriminant.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Active => "active",
      Self::Paused => "paused",
      Self::Closed => "closed",
    }
  }
}

impl std::fmt::Display for SurveyStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Survey ──────────────────────────────────────────────────────────────────

/// A survey as persisted by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
  pub survey_id:    Uuid,
  pub title:        String,
  pub kind:         SurveyKind,
  /// The thing being evaluated (a course, a lecture, an event). Free text.
  pub object:       Option<String>,
  pub status:       SurveyStatus,
  /// Intended opening of the active window. Informational only — reaching
  /// `start_at` never activates a survey; an explicit transition does.
  pub start_at:     Option<DateTime<Utc>>,
  /// Intended end of the active window; consulted by the effective-status
  /// resolver for display-only expiry.
  pub end_at:       Option<DateTime<Utc>>,
  /// Whether non-privileged actors may revisit results after closure.
  /// Consulted only when the effective status is `closed`.
  pub allow_review: bool,
  pub created_by:   Uuid,
  pub created_at:   DateTime<Utc>,
  /// Bumped on every successful write. Doubles as the optimistic concurrency
  /// token: mutations carry the last-seen value back and are rejected when it
  /// no longer matches.
  pub updated_at:   DateTime<Utc>,
}

// ─── NewSurvey ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::SurveyStore::create_survey`].
/// Status always starts at `Pending`; both timestamps are set by the store.
#[derive(Debug, Clone)]
pub struct NewSurvey {
  pub title:      String,
  pub kind:       SurveyKind,
  pub object:     Option<String>,
  pub start_at:   Option<DateTime<Utc>>,
  pub end_at:     Option<DateTime<Utc>>,
  pub created_by: Uuid,
}
