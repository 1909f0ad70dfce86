//! Async HTTP client wrapping the Canvass JSON API.
//!
//! Every mutation carries the last-seen `updated_at` token through
//! unmodified and re-adopts the record the server returns. Server failures
//! arrive as `{code, error}` bodies; [`explain`] maps the structured code to
//! actionable text and falls back to the server message verbatim for codes
//! it does not recognise.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use canvass_core::{
  policy::SurveyProjection,
  response::{Response, ResultsView},
  survey::{SurveyKind, SurveyStatus},
};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

// ─── Config ───────────────────────────────────────────────────────────────────

/// Connection and identity settings for the Canvass API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub actor_id: Uuid,
  pub role:     String,
}

// ─── Error body ───────────────────────────────────────────────────────────────

/// The structured error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  code:  String,
  error: String,
}

/// Map a structured error code to actionable text. Unrecognised codes fall
/// back to the server-provided message.
fn explain(body: &ErrorBody) -> String {
  match body.code.as_str() {
    "stale_token" => {
      "the survey changed since you last fetched it; run the command again"
        .into()
    }
    "invalid_transition" => {
      format!("that transition is not allowed ({})", body.error)
    }
    "action_in_flight" => {
      "the same action is already being processed; wait and re-check".into()
    }
    "not_open_for_responses" => {
      "this survey is not currently accepting responses".into()
    }
    "already_responded" => "you already answered this survey".into(),
    "forbidden" => format!("not permitted: {}", body.error),
    _ => body.error.clone(),
  }
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// A hint received from the invalidation watch endpoint.
#[derive(Debug, Deserialize)]
pub struct Hint {
  pub survey_id: Uuid,
}

/// Async HTTP client for the Canvass JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(90))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn identify(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req
      .header("x-actor-id", self.config.actor_id.to_string())
      .header("x-actor-role", &self.config.role)
  }

  /// Deserialise a success body, or surface the structured error.
  async fn unwrap_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
    what: &str,
  ) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
      return resp
        .json()
        .await
        .with_context(|| format!("deserialising {what}"));
    }
    match resp.json::<ErrorBody>().await {
      Ok(body) => Err(anyhow!("{what}: {}", explain(&body))),
      Err(_) => Err(anyhow!("{what} → {status}")),
    }
  }

  // ── Surveys ───────────────────────────────────────────────────────────────

  /// `GET /api/surveys`
  pub async fn list_surveys(&self) -> Result<Vec<SurveyProjection>> {
    let resp = self
      .identify(self.client.get(self.url("/surveys")))
      .send()
      .await
      .context("GET /surveys failed")?;
    Self::unwrap_response(resp, "listing surveys").await
  }

  /// `GET /api/surveys/:id`
  pub async fn get_survey(&self, id: Uuid) -> Result<SurveyProjection> {
    let resp = self
      .identify(self.client.get(self.url(&format!("/surveys/{id}"))))
      .send()
      .await
      .context("GET /surveys/:id failed")?;
    Self::unwrap_response(resp, "fetching survey").await
  }

  /// `POST /api/surveys`
  pub async fn create_survey(
    &self,
    title:    &str,
    kind:     SurveyKind,
    object:   Option<&str>,
    start_at: Option<DateTime<Utc>>,
    end_at:   Option<DateTime<Utc>>,
  ) -> Result<SurveyProjection> {
    let resp = self
      .identify(self.client.post(self.url("/surveys")))
      .json(&json!({
        "title": title,
        "kind": kind,
        "object": object,
        "start_at": start_at,
        "end_at": end_at,
      }))
      .send()
      .await
      .context("POST /surveys failed")?;
    Self::unwrap_response(resp, "creating survey").await
  }

  /// `POST /api/surveys/:id/status` — carries `token` through unmodified.
  pub async fn change_status(
    &self,
    id:     Uuid,
    target: SurveyStatus,
    token:  DateTime<Utc>,
  ) -> Result<SurveyProjection> {
    let resp = self
      .identify(self.client.post(self.url(&format!("/surveys/{id}/status"))))
      .json(&json!({
        "status": target,
        "expected_updated_at": token,
      }))
      .send()
      .await
      .context("POST /surveys/:id/status failed")?;
    Self::unwrap_response(resp, "changing status").await
  }

  /// `POST /api/surveys/:id/review-permission`
  pub async fn set_review_permission(
    &self,
    id:    Uuid,
    allow: bool,
    token: DateTime<Utc>,
  ) -> Result<SurveyProjection> {
    let resp = self
      .identify(
        self
          .client
          .post(self.url(&format!("/surveys/{id}/review-permission"))),
      )
      .json(&json!({
        "allow_review": allow,
        "expected_updated_at": token,
      }))
      .send()
      .await
      .context("POST /surveys/:id/review-permission failed")?;
    Self::unwrap_response(resp, "setting review permission").await
  }

  // ── Responses and results ─────────────────────────────────────────────────

  /// `POST /api/surveys/:id/responses`
  pub async fn submit_response(
    &self,
    id:      Uuid,
    answers: serde_json::Value,
  ) -> Result<Response> {
    let resp = self
      .identify(
        self
          .client
          .post(self.url(&format!("/surveys/{id}/responses"))),
      )
      .json(&json!({ "answers": answers }))
      .send()
      .await
      .context("POST /surveys/:id/responses failed")?;
    Self::unwrap_response(resp, "submitting response").await
  }

  /// `GET /api/surveys/:id/results`
  pub async fn get_results(&self, id: Uuid) -> Result<ResultsView> {
    let resp = self
      .identify(
        self.client.get(self.url(&format!("/surveys/{id}/results"))),
      )
      .send()
      .await
      .context("GET /surveys/:id/results failed")?;
    Self::unwrap_response(resp, "fetching results").await
  }

  // ── Invalidation hints ────────────────────────────────────────────────────

  /// `GET /api/invalidations/watch` — `None` on a quiet timeout.
  pub async fn watch_invalidations(
    &self,
    timeout_secs: u64,
  ) -> Result<Option<Hint>> {
    let resp = self
      .identify(self.client.get(self.url("/invalidations/watch")))
      .query(&[("timeout_secs", timeout_secs.to_string())])
      .send()
      .await
      .context("GET /invalidations/watch failed")?;

    if resp.status() == reqwest::StatusCode::NO_CONTENT {
      return Ok(None);
    }
    Ok(Some(Self::unwrap_response(resp, "watching hints").await?))
  }
}
