//! Unit tests for API plumbing: role parsing and error-code mapping.

use canvass_core::{actor::Role, survey::SurveyStatus};
use uuid::Uuid;

use crate::{ApiError, ErrorCode, actor::parse_role, error::store_err};

// ─── Role parsing ────────────────────────────────────────────────────────────

#[test]
fn known_roles_parse_case_insensitively() {
  assert_eq!(parse_role("admin"), Role::Admin);
  assert_eq!(parse_role("Admin"), Role::Admin);
  assert_eq!(parse_role("LECTURER"), Role::Lecturer);
}

#[test]
fn unknown_roles_are_unprivileged() {
  assert_eq!(parse_role("student"), Role::Participant);
  assert_eq!(parse_role(""), Role::Participant);
  assert_eq!(parse_role("root"), Role::Participant);
}

// ─── Error codes ─────────────────────────────────────────────────────────────

#[test]
fn domain_errors_map_to_structured_codes() {
  let id = Uuid::new_v4();

  let cases: Vec<(canvass_core::Error, ErrorCode)> = vec![
    (canvass_core::Error::SurveyNotFound(id), ErrorCode::NotFound),
    (
      canvass_core::Error::InvalidTransition {
        from: SurveyStatus::Closed,
        to:   SurveyStatus::Active,
      },
      ErrorCode::InvalidTransition,
    ),
    (canvass_core::Error::StaleToken(id), ErrorCode::StaleToken),
    (
      canvass_core::Error::NotOpenForResponses(id),
      ErrorCode::NotOpenForResponses,
    ),
    (
      canvass_core::Error::AlreadyResponded { survey_id: id, respondent: id },
      ErrorCode::AlreadyResponded,
    ),
  ];

  for (err, code) in cases {
    assert_eq!(store_err(err).code(), code);
  }
}

#[test]
fn opaque_errors_map_to_internal() {
  let err = canvass_core::Error::UnknownStatus("archived".into());
  assert_eq!(store_err(err).code(), ErrorCode::Internal);
}

#[test]
fn codes_serialize_as_snake_case() {
  assert_eq!(
    serde_json::to_string(&ErrorCode::StaleToken).unwrap(),
    "\"stale_token\""
  );
  assert_eq!(
    serde_json::to_string(&ErrorCode::NotOpenForResponses).unwrap(),
    "\"not_open_for_responses\""
  );
}

#[test]
fn api_error_exposes_status_and_code_together() {
  let err = ApiError::StaleToken("stale update token".into());
  assert_eq!(err.code(), ErrorCode::StaleToken);

  let err = ApiError::ActionInFlight("close already running".into());
  assert_eq!(err.code(), ErrorCode::ActionInFlight);
}
