//! Handlers for `/surveys` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/surveys` | Visibility-filtered; optional `status`, `kind`, `text`, `limit`, `offset` |
//! | `POST` | `/surveys` | Privileged roles only; body: [`CreateBody`] |
//! | `GET`  | `/surveys/:id` | Projection for the calling actor |
//! | `POST` | `/surveys/:id/status` | Body: [`ChangeStatusBody`]; gated per `(survey, action)` |
//! | `POST` | `/surveys/:id/review-permission` | Body: [`SetReviewBody`] |
//!
//! Every response carries a [`SurveyProjection`] — the stored record plus the
//! effective status and action set for the requesting actor — so clients
//! re-adopt server truth after each call.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use canvass_core::{
  policy::{self, SurveyProjection},
  store::{SurveyFilter, SurveyStore},
  survey::{NewSurvey, Survey, SurveyKind, SurveyStatus},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  actor::CallerIdentity,
  error::{ApiError, store_err},
};

/// Fetch a survey or map its absence to a 404.
async fn fetch_or_404<S>(state: &AppState<S>, id: Uuid) -> Result<Survey, ApiError>
where
  S: SurveyStore,
{
  state
    .store
    .get_survey(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("survey {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub text:   Option<String>,
  pub kind:   Option<SurveyKind>,
  /// Filter on *stored* status.
  pub status: Option<SurveyStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /surveys[?status=...][&kind=...][&text=...]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CallerIdentity(actor): CallerIdentity,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<SurveyProjection>>, ApiError>
where
  S: SurveyStore,
{
  let mut filter = SurveyFilter {
    text:   params.text,
    kind:   params.kind,
    status: params.status,
    created_by: None,
    limit:  params.limit,
    offset: params.offset,
  };

  // Lecturers only ever see their own surveys; push that into the query.
  if actor.role == canvass_core::actor::Role::Lecturer {
    filter.created_by = Some(actor.actor_id);
  }

  let now = state.clock.now();
  let mut surveys = state
    .store
    .list_surveys(&filter)
    .await
    .map_err(store_err)?;
  surveys.retain(|s| policy::can_view(&actor, s, now));

  let projections = surveys
    .into_iter()
    .map(|s| SurveyProjection::project(s, actor.role, now))
    .collect();
  Ok(Json(projections))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:    String,
  pub kind:     SurveyKind,
  pub object:   Option<String>,
  pub start_at: Option<DateTime<Utc>>,
  pub end_at:   Option<DateTime<Utc>>,
}

/// `POST /surveys` — 201 + the pending survey, projected for the creator.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CallerIdentity(actor): CallerIdentity,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SurveyStore,
{
  if !actor.role.is_privileged() {
    return Err(ApiError::Forbidden(
      "only admins and lecturers may create surveys".into(),
    ));
  }

  let survey = state
    .store
    .create_survey(NewSurvey {
      title:      body.title,
      kind:       body.kind,
      object:     body.object,
      start_at:   body.start_at,
      end_at:     body.end_at,
      created_by: actor.actor_id,
    })
    .await
    .map_err(store_err)?;

  tracing::info!(survey_id = %survey.survey_id, "survey created");

  let projection =
    SurveyProjection::project(survey, actor.role, state.clock.now());
  Ok((StatusCode::CREATED, Json(projection)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /surveys/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CallerIdentity(actor): CallerIdentity,
  Path(id): Path<Uuid>,
) -> Result<Json<SurveyProjection>, ApiError>
where
  S: SurveyStore,
{
  let survey = fetch_or_404(&state, id).await?;

  let now = state.clock.now();
  if !policy::can_view(&actor, &survey, now) {
    return Err(ApiError::Forbidden(format!(
      "survey {id} is not visible to this actor"
    )));
  }

  Ok(Json(SurveyProjection::project(survey, actor.role, now)))
}

// ─── Change status ────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /surveys/:id/status`.
///
/// `expected_updated_at` is the concurrency token: the `updated_at` of the
/// snapshot the caller decided on, carried through unmodified.
#[derive(Debug, Deserialize)]
pub struct ChangeStatusBody {
  pub status:              SurveyStatus,
  pub expected_updated_at: DateTime<Utc>,
}

/// `POST /surveys/:id/status`
pub async fn change_status<S>(
  State(state): State<AppState<S>>,
  CallerIdentity(actor): CallerIdentity,
  Path(id): Path<Uuid>,
  Json(body): Json<ChangeStatusBody>,
) -> Result<Json<SurveyProjection>, ApiError>
where
  S: SurveyStore,
{
  let survey = fetch_or_404(&state, id).await?;
  if !policy::can_manage(&actor, &survey) {
    return Err(ApiError::Forbidden(format!(
      "actor may not manage survey {id}"
    )));
  }

  let action = policy::transition_action(body.status).ok_or_else(|| {
    ApiError::BadRequest("no transition targets the pending status".into())
  })?;

  // Hold the gate for the duration of the store call; released on drop.
  let _guard = state.gate.try_acquire(id, action).ok_or_else(|| {
    ApiError::ActionInFlight(format!(
      "a {action:?} request for survey {id} is already being processed"
    ))
  })?;

  let updated = state
    .store
    .change_status(id, body.status, body.expected_updated_at)
    .await
    .map_err(store_err)?;

  tracing::info!(
    survey_id = %id,
    from = %survey.status,
    to = %updated.status,
    "survey status changed"
  );
  state.hints.publish(id);

  Ok(Json(SurveyProjection::project(
    updated,
    actor.role,
    state.clock.now(),
  )))
}

// ─── Review permission ────────────────────────────────────────────────────────

/// JSON body accepted by `POST /surveys/:id/review-permission`.
#[derive(Debug, Deserialize)]
pub struct SetReviewBody {
  pub allow_review:        bool,
  pub expected_updated_at: DateTime<Utc>,
}

/// `POST /surveys/:id/review-permission`
pub async fn set_review<S>(
  State(state): State<AppState<S>>,
  CallerIdentity(actor): CallerIdentity,
  Path(id): Path<Uuid>,
  Json(body): Json<SetReviewBody>,
) -> Result<Json<SurveyProjection>, ApiError>
where
  S: SurveyStore,
{
  let survey = fetch_or_404(&state, id).await?;
  if !policy::can_manage(&actor, &survey) {
    return Err(ApiError::Forbidden(format!(
      "actor may not manage survey {id}"
    )));
  }

  let updated = state
    .store
    .set_review_permission(id, body.allow_review, body.expected_updated_at)
    .await
    .map_err(store_err)?;

  tracing::info!(
    survey_id = %id,
    allow_review = body.allow_review,
    "review permission changed"
  );
  state.hints.publish(id);

  Ok(Json(SurveyProjection::project(
    updated,
    actor.role,
    state.clock.now(),
  )))
}
