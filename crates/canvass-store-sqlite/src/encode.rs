//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Answer payloads are stored
//! as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use canvass_core::{
  response::Response,
  survey::{Survey, SurveyKind, SurveyStatus},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── SurveyStatus ────────────────────────────────────────────────────────────

pub fn encode_status(s: SurveyStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<SurveyStatus> {
  match s {
    "pending" => Ok(SurveyStatus::Pending),
    "active" => Ok(SurveyStatus::Active),
    "paused" => Ok(SurveyStatus::Paused),
    "closed" => Ok(SurveyStatus::Closed),
    other => {
      Err(canvass_core::Error::UnknownStatus(other.to_owned()).into())
    }
  }
}

// ─── SurveyKind ──────────────────────────────────────────────────────────────

pub fn encode_kind(k: SurveyKind) -> &'static str {
  match k {
    SurveyKind::Survey => "survey",
    SurveyKind::Quiz => "quiz",
  }
}

pub fn decode_kind(s: &str) -> Result<SurveyKind> {
  match s {
    "survey" => Ok(SurveyKind::Survey),
    "quiz" => Ok(SurveyKind::Quiz),
    other => Err(canvass_core::Error::UnknownKind(other.to_owned()).into()),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `surveys` row.
pub struct RawSurvey {
  pub survey_id:    String,
  pub title:        String,
  pub kind:         String,
  pub object:       Option<String>,
  pub status:       String,
  pub start_at:     Option<String>,
  pub end_at:       Option<String>,
  pub allow_review: bool,
  pub created_by:   String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawSurvey {
  pub fn into_survey(self) -> Result<Survey> {
    Ok(Survey {
      survey_id:    decode_uuid(&self.survey_id)?,
      title:        self.title,
      kind:         decode_kind(&self.kind)?,
      object:       self.object,
      status:       decode_status(&self.status)?,
      start_at:     self.start_at.as_deref().map(decode_dt).transpose()?,
      end_at:       self.end_at.as_deref().map(decode_dt).transpose()?,
      allow_review: self.allow_review,
      created_by:   decode_uuid(&self.created_by)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `responses` row.
pub struct RawResponse {
  pub response_id:  String,
  pub survey_id:    String,
  pub respondent:   String,
  pub answers:      String,
  pub submitted_at: String,
}

impl RawResponse {
  pub fn into_response(self) -> Result<Response> {
    Ok(Response {
      response_id:  decode_uuid(&self.response_id)?,
      survey_id:    decode_uuid(&self.survey_id)?,
      respondent:   decode_uuid(&self.respondent)?,
      answers:      serde_json::from_str(&self.answers)?,
      submitted_at: decode_dt(&self.submitted_at)?,
    })
  }
}

/// The fixed column list used by every survey SELECT, in [`RawSurvey`] order.
pub const SURVEY_COLUMNS: &str = "survey_id, title, kind, object, status, \
   start_at, end_at, allow_review, created_by, created_at, updated_at";

pub fn survey_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSurvey> {
  Ok(RawSurvey {
    survey_id:    row.get(0)?,
    title:        row.get(1)?,
    kind:         row.get(2)?,
    object:       row.get(3)?,
    status:       row.get(4)?,
    start_at:     row.get(5)?,
    end_at:       row.get(6)?,
    allow_review: row.get(7)?,
    created_by:   row.get(8)?,
    created_at:   row.get(9)?,
    updated_at:   row.get(10)?,
  })
}
