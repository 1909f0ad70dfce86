//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use canvass_core::{
  clock::{Clock as _, FixedClock},
  response::NewResponse,
  store::{SurveyFilter, SurveyStore},
  survey::{NewSurvey, SurveyKind, SurveyStatus},
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::SqliteStore;

fn start_time() -> chrono::DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

async fn store() -> (SqliteStore, Arc<FixedClock>) {
  let clock = Arc::new(FixedClock::new(start_time()));
  let store = SqliteStore::open_in_memory_with_clock(clock.clone())
    .await
    .expect("in-memory store");
  (store, clock)
}

fn new_survey(created_by: Uuid) -> NewSurvey {
  NewSurvey {
    title: "Lecture evaluation".into(),
    kind: SurveyKind::Survey,
    object: Some("Databases 101".into()),
    start_at: None,
    end_at: None,
    created_by,
  }
}

/// Activate a freshly-created pending survey, returning the updated record.
async fn activate(
  s: &SqliteStore,
  id: Uuid,
  token: chrono::DateTime<Utc>,
) -> canvass_core::survey::Survey {
  s.change_status(id, SurveyStatus::Active, token).await.unwrap()
}

// ─── Surveys ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_survey() {
  let (s, _) = store().await;

  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();
  assert_eq!(created.status, SurveyStatus::Pending);
  assert!(!created.allow_review);
  assert_eq!(created.created_at, created.updated_at);

  let fetched = s.get_survey(created.survey_id).await.unwrap().unwrap();
  assert_eq!(fetched.survey_id, created.survey_id);
  assert_eq!(fetched.title, "Lecture evaluation");
  assert_eq!(fetched.object.as_deref(), Some("Databases 101"));
  assert_eq!(fetched.updated_at, created.updated_at);
}

#[tokio::test]
async fn get_survey_missing_returns_none() {
  let (s, _) = store().await;
  assert!(s.get_survey(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_surveys_all_and_filtered() {
  let (s, _) = store().await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();

  s.create_survey(new_survey(alice)).await.unwrap();
  s.create_survey(new_survey(alice)).await.unwrap();
  let mut quiz = new_survey(bob);
  quiz.kind = SurveyKind::Quiz;
  quiz.title = "Final quiz".into();
  s.create_survey(quiz).await.unwrap();

  let all = s.list_surveys(&SurveyFilter::default()).await.unwrap();
  assert_eq!(all.len(), 3);

  let own = s
    .list_surveys(&SurveyFilter {
      created_by: Some(alice),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(own.len(), 2);
  assert!(own.iter().all(|sv| sv.created_by == alice));

  let quizzes = s
    .list_surveys(&SurveyFilter {
      kind: Some(SurveyKind::Quiz),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(quizzes.len(), 1);
  assert_eq!(quizzes[0].title, "Final quiz");
}

#[tokio::test]
async fn list_surveys_by_text() {
  let (s, _) = store().await;
  let creator = Uuid::new_v4();

  s.create_survey(new_survey(creator)).await.unwrap();
  let mut other = new_survey(creator);
  other.title = "Workshop feedback".into();
  other.object = None;
  s.create_survey(other).await.unwrap();

  let hits = s
    .list_surveys(&SurveyFilter {
      text: Some("Workshop".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].title, "Workshop feedback");
}

// ─── Status transitions ──────────────────────────────────────────────────────

#[tokio::test]
async fn activate_pending_survey() {
  let (s, clock) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();

  clock.advance(Duration::minutes(1));
  let updated = activate(&s, created.survey_id, created.updated_at).await;

  assert_eq!(updated.status, SurveyStatus::Active);
  assert!(updated.updated_at > created.updated_at);

  // The stored record matches the returned one.
  let fetched = s.get_survey(created.survey_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, SurveyStatus::Active);
  assert_eq!(fetched.updated_at, updated.updated_at);
}

#[tokio::test]
async fn full_lifecycle_walk() {
  let (s, clock) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();

  clock.advance(Duration::minutes(1));
  let active = activate(&s, created.survey_id, created.updated_at).await;

  clock.advance(Duration::minutes(1));
  let paused = s
    .change_status(created.survey_id, SurveyStatus::Paused, active.updated_at)
    .await
    .unwrap();
  assert_eq!(paused.status, SurveyStatus::Paused);

  clock.advance(Duration::minutes(1));
  let resumed = s
    .change_status(created.survey_id, SurveyStatus::Active, paused.updated_at)
    .await
    .unwrap();
  assert_eq!(resumed.status, SurveyStatus::Active);

  clock.advance(Duration::minutes(1));
  let closed = s
    .change_status(created.survey_id, SurveyStatus::Closed, resumed.updated_at)
    .await
    .unwrap();
  assert_eq!(closed.status, SurveyStatus::Closed);
}

#[tokio::test]
async fn invalid_transition_rejected_and_nothing_written() {
  let (s, _) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();

  let err = s
    .change_status(created.survey_id, SurveyStatus::Paused, created.updated_at)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(canvass_core::Error::InvalidTransition {
      from: SurveyStatus::Pending,
      to:   SurveyStatus::Paused,
    })
  ));

  let fetched = s.get_survey(created.survey_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, SurveyStatus::Pending);
  assert_eq!(fetched.updated_at, created.updated_at);
}

#[tokio::test]
async fn closed_survey_cannot_be_reopened() {
  let (s, clock) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();

  clock.advance(Duration::minutes(1));
  let active = activate(&s, created.survey_id, created.updated_at).await;
  clock.advance(Duration::minutes(1));
  let closed = s
    .change_status(created.survey_id, SurveyStatus::Closed, active.updated_at)
    .await
    .unwrap();

  let err = s
    .change_status(created.survey_id, SurveyStatus::Active, closed.updated_at)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(canvass_core::Error::InvalidTransition { .. })
  ));
}

#[tokio::test]
async fn stale_token_rejected() {
  let (s, clock) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();

  clock.advance(Duration::minutes(1));
  activate(&s, created.survey_id, created.updated_at).await;

  // Re-using the pre-activation token must fail, even though the requested
  // transition (active -> closed) would otherwise be legal.
  let err = s
    .change_status(created.survey_id, SurveyStatus::Closed, created.updated_at)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(canvass_core::Error::StaleToken(_))
  ));

  let fetched = s.get_survey(created.survey_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, SurveyStatus::Active);
}

#[tokio::test]
async fn change_status_missing_survey_errors() {
  let (s, clock) = store().await;
  let err = s
    .change_status(Uuid::new_v4(), SurveyStatus::Active, clock.now())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(canvass_core::Error::SurveyNotFound(_))
  ));
}

// ─── Review permission ───────────────────────────────────────────────────────

#[tokio::test]
async fn toggle_review_permission() {
  let (s, clock) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();

  clock.advance(Duration::minutes(1));
  let updated = s
    .set_review_permission(created.survey_id, true, created.updated_at)
    .await
    .unwrap();
  assert!(updated.allow_review);
  assert!(updated.updated_at > created.updated_at);

  clock.advance(Duration::minutes(1));
  let reverted = s
    .set_review_permission(created.survey_id, false, updated.updated_at)
    .await
    .unwrap();
  assert!(!reverted.allow_review);
}

#[tokio::test]
async fn toggle_review_with_stale_token_errors() {
  let (s, clock) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();

  clock.advance(Duration::minutes(1));
  s.set_review_permission(created.survey_id, true, created.updated_at)
    .await
    .unwrap();

  let err = s
    .set_review_permission(created.survey_id, false, created.updated_at)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(canvass_core::Error::StaleToken(_))
  ));

  let fetched = s.get_survey(created.survey_id).await.unwrap().unwrap();
  assert!(fetched.allow_review);
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_response_on_active_survey() {
  let (s, clock) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();
  clock.advance(Duration::minutes(1));
  activate(&s, created.survey_id, created.updated_at).await;

  let respondent = Uuid::new_v4();
  let response = s
    .record_response(NewResponse {
      survey_id:  created.survey_id,
      respondent,
      answers:    json!({"q1": 4, "q2": "helpful"}),
    })
    .await
    .unwrap();

  assert_eq!(response.survey_id, created.survey_id);
  assert_eq!(response.respondent, respondent);
  assert_eq!(response.submitted_at, clock.now());
}

#[tokio::test]
async fn response_to_pending_survey_rejected() {
  let (s, _) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();

  let err = s
    .record_response(NewResponse {
      survey_id:  created.survey_id,
      respondent: Uuid::new_v4(),
      answers:    json!({}),
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(canvass_core::Error::NotOpenForResponses(_))
  ));
}

#[tokio::test]
async fn response_after_end_at_rejected_even_if_still_active() {
  let (s, clock) = store().await;
  let mut input = new_survey(Uuid::new_v4());
  input.end_at = Some(start_time() + Duration::hours(1));
  let created = s.create_survey(input).await.unwrap();
  activate(&s, created.survey_id, created.updated_at).await;

  // Stored status is still `active`, but the window has passed.
  clock.advance(Duration::hours(2));
  let err = s
    .record_response(NewResponse {
      survey_id:  created.survey_id,
      respondent: Uuid::new_v4(),
      answers:    json!({}),
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(canvass_core::Error::NotOpenForResponses(_))
  ));
}

#[tokio::test]
async fn duplicate_respondent_rejected() {
  let (s, clock) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();
  clock.advance(Duration::minutes(1));
  activate(&s, created.survey_id, created.updated_at).await;

  let respondent = Uuid::new_v4();
  s.record_response(NewResponse {
    survey_id:  created.survey_id,
    respondent,
    answers:    json!({"q1": 1}),
  })
  .await
  .unwrap();

  let err = s
    .record_response(NewResponse {
      survey_id:  created.survey_id,
      respondent,
      answers:    json!({"q1": 2}),
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(canvass_core::Error::AlreadyResponded { .. })
  ));
}

#[tokio::test]
async fn concurrent_duplicate_responses_report_already_responded() {
  let (s, clock) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();
  clock.advance(Duration::minutes(1));
  activate(&s, created.survey_id, created.updated_at).await;

  // Two in-flight submissions for the same respondent: exactly one lands,
  // the other must surface as the domain duplicate error, not a raw
  // constraint failure.
  let respondent = Uuid::new_v4();
  let submit = || {
    s.record_response(NewResponse {
      survey_id:  created.survey_id,
      respondent,
      answers:    json!({"q1": 1}),
    })
  };
  let (a, b) = tokio::join!(submit(), submit());

  let (ok, err) = match (a, b) {
    (Ok(ok), Err(err)) | (Err(err), Ok(ok)) => (ok, err),
    other => panic!("expected exactly one success, got {other:?}"),
  };
  assert_eq!(ok.respondent, respondent);
  assert!(matches!(
    err,
    crate::Error::Core(canvass_core::Error::AlreadyResponded { .. })
  ));

  let view = s
    .get_results(created.survey_id, None)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(view.total(), 1);
}

// ─── Results ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn results_missing_survey_returns_none() {
  let (s, _) = store().await;
  assert!(s.get_results(Uuid::new_v4(), None).await.unwrap().is_none());
}

#[tokio::test]
async fn results_collect_responses_in_order() {
  let (s, clock) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();
  clock.advance(Duration::minutes(1));
  activate(&s, created.survey_id, created.updated_at).await;

  let first = Uuid::new_v4();
  let second = Uuid::new_v4();
  s.record_response(NewResponse {
    survey_id:  created.survey_id,
    respondent: first,
    answers:    json!({"q1": 5}),
  })
  .await
  .unwrap();
  clock.advance(Duration::minutes(5));
  s.record_response(NewResponse {
    survey_id:  created.survey_id,
    respondent: second,
    answers:    json!({"q1": 3}),
  })
  .await
  .unwrap();

  let view = s
    .get_results(created.survey_id, None)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(view.total(), 2);
  assert_eq!(view.responses[0].respondent, first);
  assert_eq!(view.responses[1].respondent, second);
  assert_eq!(view.survey.survey_id, created.survey_id);
}

#[tokio::test]
async fn results_as_of_excludes_later_responses() {
  let (s, clock) = store().await;
  let created = s.create_survey(new_survey(Uuid::new_v4())).await.unwrap();
  clock.advance(Duration::minutes(1));
  activate(&s, created.survey_id, created.updated_at).await;

  s.record_response(NewResponse {
    survey_id:  created.survey_id,
    respondent: Uuid::new_v4(),
    answers:    json!({}),
  })
  .await
  .unwrap();

  let cutoff = clock.now();
  clock.advance(Duration::minutes(10));
  s.record_response(NewResponse {
    survey_id:  created.survey_id,
    respondent: Uuid::new_v4(),
    answers:    json!({}),
  })
  .await
  .unwrap();

  let view = s
    .get_results(created.survey_id, Some(cutoff))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(view.total(), 1);
  assert_eq!(view.as_of, cutoff);
}
