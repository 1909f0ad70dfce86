//! The survey lifecycle policy.
//!
//! Two pure functions sit at the centre of the system:
//!
//! - [`effective_status`] maps a stored survey snapshot plus the current time
//!   to the status actually displayed and acted upon;
//! - [`available_actions`] maps an effective status, a role, and the review
//!   flag to the ordered action set offered to that actor.
//!
//! Both are deterministic functions of their inputs, carry no hidden state,
//! and must be re-evaluated on every time tick and every data refresh. They
//! never persist anything — a survey that displays as expired still has
//! `active` in the store until someone closes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  actor::{Actor, Role},
  survey::{Survey, SurveyStatus},
};

// ─── Effective status ────────────────────────────────────────────────────────

/// Resolve the status to display for `survey` at instant `now`.
///
/// Priority rules:
/// 1. a stored `closed` is terminal and wins over any timestamp;
/// 2. a stored `active` or `paused` survey whose `end_at` has passed shows as
///    `closed` — a soft, display-only expiry;
/// 3. everything else passes through unchanged. Pause never auto-resumes,
///    and `pending` never auto-activates from reaching `start_at`.
pub fn effective_status(survey: &Survey, now: DateTime<Utc>) -> SurveyStatus {
  let expired = survey.end_at.is_some_and(|end| now > end);
  match survey.status {
    SurveyStatus::Closed => SurveyStatus::Closed,
    SurveyStatus::Active | SurveyStatus::Paused if expired => SurveyStatus::Closed,
    other => other,
  }
}

/// Whether `survey` currently accepts responses.
pub fn is_open_for_responses(survey: &Survey, now: DateTime<Utc>) -> bool {
  effective_status(survey, now) == SurveyStatus::Active
}

// ─── Actions ─────────────────────────────────────────────────────────────────

/// An action an actor may invoke on a survey.
///
/// The first three request status transitions; the last two are navigation
/// into a read-only results view and never mutate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyAction {
  Activate,
  Pause,
  Close,
  ViewResults,
  ReviewResults,
}

impl SurveyAction {
  /// The status this action requests; `None` for navigation actions.
  pub fn target_status(self) -> Option<SurveyStatus> {
    match self {
      Self::Activate => Some(SurveyStatus::Active),
      Self::Pause => Some(SurveyStatus::Paused),
      Self::Close => Some(SurveyStatus::Closed),
      Self::ViewResults | Self::ReviewResults => None,
    }
  }
}

/// The transition action that requests `target`, if any. `Pending` is never a
/// transition target — surveys are born pending.
pub fn transition_action(target: SurveyStatus) -> Option<SurveyAction> {
  match target {
    SurveyStatus::Active => Some(SurveyAction::Activate),
    SurveyStatus::Paused => Some(SurveyAction::Pause),
    SurveyStatus::Closed => Some(SurveyAction::Close),
    SurveyStatus::Pending => None,
  }
}

/// The ordered, duplicate-free action list for an actor of `role` looking at
/// a survey with `effective` status.
///
/// Privileged roles get the transition set for the status plus `ViewResults`
/// for anything past `Pending`. Unprivileged actors get `ReviewResults` on a
/// closed survey with review enabled, and nothing otherwise.
pub fn available_actions(
  effective:    SurveyStatus,
  role:         Role,
  allow_review: bool,
) -> Vec<SurveyAction> {
  use SurveyAction::*;

  if !role.is_privileged() {
    return if effective == SurveyStatus::Closed && allow_review {
      vec![ReviewResults]
    } else {
      Vec::new()
    };
  }

  let mut actions = match effective {
    SurveyStatus::Pending => vec![Activate],
    SurveyStatus::Active => vec![Pause, Close],
    SurveyStatus::Paused => vec![Activate, Close],
    SurveyStatus::Closed => Vec::new(),
  };
  if effective != SurveyStatus::Pending {
    actions.push(ViewResults);
  }
  actions
}

// ─── Visibility ──────────────────────────────────────────────────────────────

/// Whether `actor` may request transitions and toggle review on `survey`.
/// Lecturers manage only what they created; participants manage nothing.
pub fn can_manage(actor: &Actor, survey: &Survey) -> bool {
  match actor.role {
    Role::Admin => true,
    Role::Lecturer => survey.created_by == actor.actor_id,
    Role::Participant => false,
  }
}

/// Whether `survey` is visible to `actor` at all.
///
/// Participants see surveys they could act on: ones currently open for
/// responses, and closed ones whose results were released for review.
pub fn can_view(actor: &Actor, survey: &Survey, now: DateTime<Utc>) -> bool {
  match actor.role {
    Role::Admin => true,
    Role::Lecturer => survey.created_by == actor.actor_id,
    Role::Participant => match effective_status(survey, now) {
      SurveyStatus::Active => true,
      SurveyStatus::Closed => survey.allow_review,
      _ => false,
    },
  }
}

/// Whether `actor` may open the results view. Mirrors [`available_actions`]:
/// privileged actors past `pending`, participants only on review-enabled
/// closed surveys.
pub fn can_view_results(
  actor:  &Actor,
  survey: &Survey,
  now:    DateTime<Utc>,
) -> bool {
  let effective = effective_status(survey, now);
  match actor.role {
    Role::Admin => effective != SurveyStatus::Pending,
    Role::Lecturer => {
      survey.created_by == actor.actor_id && effective != SurveyStatus::Pending
    }
    Role::Participant => {
      effective == SurveyStatus::Closed && survey.allow_review
    }
  }
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// The derived, client-facing record: the stored survey bundled with its
/// effective status and the actions available to the requesting actor.
/// Recomputed on every read, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyProjection {
  pub survey:           Survey,
  pub effective_status: SurveyStatus,
  pub actions:          Vec<SurveyAction>,
}

impl SurveyProjection {
  pub fn project(survey: Survey, role: Role, now: DateTime<Utc>) -> Self {
    let effective = effective_status(&survey, now);
    let actions = available_actions(effective, role, survey.allow_review);
    Self { survey, effective_status: effective, actions }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
