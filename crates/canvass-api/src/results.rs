//! Handlers for response submission and results views.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/surveys/:id/responses` | Submit as the calling actor; 201 |
//! | `GET`  | `/surveys/:id/results` | Read-only; gated by role and `allow_review` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use canvass_core::{
  policy,
  response::{NewResponse, ResultsView},
  store::SurveyStore,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  actor::CallerIdentity,
  error::{ApiError, store_err},
};

// ─── Submit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  /// Schema-free answer payload.
  #[serde(default)]
  pub answers: serde_json::Value,
}

/// `POST /surveys/:id/responses` — the respondent is the calling actor.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  CallerIdentity(actor): CallerIdentity,
  Path(id): Path<Uuid>,
  Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SurveyStore,
{
  let response = state
    .store
    .record_response(NewResponse {
      survey_id:  id,
      respondent: actor.actor_id,
      answers:    body.answers,
    })
    .await
    .map_err(store_err)?;

  tracing::info!(survey_id = %id, "response recorded");
  Ok((StatusCode::CREATED, Json(response)))
}

// ─── Results ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResultsParams {
  /// Point-in-time filter on `submitted_at`. Defaults to now.
  pub as_of: Option<DateTime<Utc>>,
}

/// `GET /surveys/:id/results[?as_of=...]`
pub async fn results<S>(
  State(state): State<AppState<S>>,
  CallerIdentity(actor): CallerIdentity,
  Path(id): Path<Uuid>,
  Query(params): Query<ResultsParams>,
) -> Result<Json<ResultsView>, ApiError>
where
  S: SurveyStore,
{
  let survey = state
    .store
    .get_survey(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("survey {id} not found")))?;

  let now = state.clock.now();
  if !policy::can_view_results(&actor, &survey, now) {
    return Err(ApiError::Forbidden(format!(
      "results of survey {id} are not available to this actor"
    )));
  }

  let view = state
    .store
    .get_results(id, params.as_of)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("survey {id} not found")))?;

  Ok(Json(view))
}
