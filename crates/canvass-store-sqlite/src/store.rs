//! [`SqliteStore`] — the SQLite implementation of [`SurveyStore`].

use std::{path::Path, sync::Arc};

use canvass_core::{
  clock::{Clock, SystemClock},
  policy,
  response::{NewResponse, Response, ResultsView},
  store::{SurveyFilter, SurveyStore},
  survey::{NewSurvey, Survey, SurveyStatus},
};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawResponse, RawSurvey, SURVEY_COLUMNS, encode_dt, encode_kind,
    encode_status, encode_uuid, survey_from_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Canvass survey store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  clock: Arc<dyn Clock>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with_clock(path, Arc::new(SystemClock)).await
  }

  /// Open a store with an injected clock. All server-assigned timestamps
  /// (`created_at`, `updated_at`, `submitted_at`) and the response-window
  /// check come from it.
  pub async fn open_with_clock(
    path:  impl AsRef<Path>,
    clock: Arc<dyn Clock>,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, clock };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with_clock(Arc::new(SystemClock)).await
  }

  /// In-memory store with an injected clock.
  pub async fn open_in_memory_with_clock(
    clock: Arc<dyn Clock>,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, clock };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch a survey row by id.
  async fn fetch_survey(&self, id: Uuid) -> Result<Option<Survey>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSurvey> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SURVEY_COLUMNS} FROM surveys WHERE survey_id = ?1"
              ),
              rusqlite::params![id_str],
              survey_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSurvey::into_survey).transpose()
  }

  /// Conditional write keyed on the caller's `updated_at` token.
  ///
  /// Zero affected rows after a successful validation read means a
  /// concurrent writer got there first; distinguish that from a vanished
  /// row and report accordingly.
  async fn checked_update(
    &self,
    id:       Uuid,
    token:    DateTime<Utc>,
    set_sql:  &'static str,
    set_arg:  String,
    stamp:    DateTime<Utc>,
  ) -> Result<()> {
    let id_str = encode_uuid(id);
    let token_str = encode_dt(token);
    let stamp_str = encode_dt(stamp);

    let affected = self
      .conn
      .call(move |conn| {
        let affected = conn.execute(
          &format!(
            "UPDATE surveys SET {set_sql} = ?1, updated_at = ?2
             WHERE survey_id = ?3 AND updated_at = ?4"
          ),
          rusqlite::params![set_arg, stamp_str, id_str, token_str],
        )?;
        Ok(affected)
      })
      .await?;

    if affected == 0 {
      return match self.fetch_survey(id).await? {
        None => Err(canvass_core::Error::SurveyNotFound(id).into()),
        Some(_) => Err(canvass_core::Error::StaleToken(id).into()),
      };
    }
    Ok(())
  }
}

// ─── SurveyStore impl ────────────────────────────────────────────────────────

impl SurveyStore for SqliteStore {
  type Error = Error;

  // ── Surveys ───────────────────────────────────────────────────────────────

  async fn create_survey(&self, input: NewSurvey) -> Result<Survey> {
    let now = self.clock.now();
    let survey = Survey {
      survey_id:    Uuid::new_v4(),
      title:        input.title,
      kind:         input.kind,
      object:       input.object,
      status:       SurveyStatus::Pending,
      start_at:     input.start_at,
      end_at:       input.end_at,
      allow_review: false,
      created_by:   input.created_by,
      created_at:   now,
      updated_at:   now,
    };

    let id_str       = encode_uuid(survey.survey_id);
    let title        = survey.title.clone();
    let kind_str     = encode_kind(survey.kind).to_owned();
    let object       = survey.object.clone();
    let status_str   = encode_status(survey.status).to_owned();
    let start_str    = survey.start_at.map(encode_dt);
    let end_str      = survey.end_at.map(encode_dt);
    let creator_str  = encode_uuid(survey.created_by);
    let created_str  = encode_dt(survey.created_at);
    let updated_str  = encode_dt(survey.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO surveys (
             survey_id, title, kind, object, status,
             start_at, end_at, allow_review,
             created_by, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            title,
            kind_str,
            object,
            status_str,
            start_str,
            end_str,
            creator_str,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(survey)
  }

  async fn get_survey(&self, id: Uuid) -> Result<Option<Survey>> {
    self.fetch_survey(id).await
  }

  async fn list_surveys(&self, filter: &SurveyFilter) -> Result<Vec<Survey>> {
    let text_pattern = filter.text.as_deref().map(|t| format!("%{t}%"));
    let kind_str     = filter.kind.map(encode_kind).map(str::to_owned);
    let status_str   = filter.status.map(encode_status).map(str::to_owned);
    let creator_str  = filter.created_by.map(encode_uuid);
    let limit_val    = filter.limit.unwrap_or(100) as i64;
    let offset_val   = filter.offset.unwrap_or(0) as i64;

    let raws: Vec<RawSurvey> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically; parameter slots stay fixed.
        let mut conds: Vec<&'static str> = vec![];
        if text_pattern.is_some() {
          conds.push("(title LIKE ?1 OR object LIKE ?1)");
        }
        if kind_str.is_some() {
          conds.push("kind = ?2");
        }
        if status_str.is_some() {
          conds.push("status = ?3");
        }
        if creator_str.is_some() {
          conds.push("created_by = ?4");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {SURVEY_COLUMNS} FROM surveys
           {where_clause}
           ORDER BY created_at DESC
           LIMIT ?5 OFFSET ?6"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              text_pattern.as_deref(),
              kind_str.as_deref(),
              status_str.as_deref(),
              creator_str.as_deref(),
              limit_val,
              offset_val,
            ],
            survey_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSurvey::into_survey).collect()
  }

  // ── Lifecycle writes ──────────────────────────────────────────────────────

  async fn change_status(
    &self,
    id:     Uuid,
    target: SurveyStatus,
    token:  DateTime<Utc>,
  ) -> Result<Survey> {
    let current = self
      .fetch_survey(id)
      .await?
      .ok_or(canvass_core::Error::SurveyNotFound(id))?;

    // A stale token outranks the transition check: the caller is reasoning
    // about a record that no longer exists.
    if current.updated_at != token {
      return Err(canvass_core::Error::StaleToken(id).into());
    }
    if !current.status.can_transition_to(target) {
      return Err(
        canvass_core::Error::InvalidTransition {
          from: current.status,
          to:   target,
        }
        .into(),
      );
    }

    let now = self.clock.now();
    self
      .checked_update(id, token, "status", encode_status(target).to_owned(), now)
      .await?;

    Ok(Survey { status: target, updated_at: now, ..current })
  }

  async fn set_review_permission(
    &self,
    id:    Uuid,
    allow: bool,
    token: DateTime<Utc>,
  ) -> Result<Survey> {
    let current = self
      .fetch_survey(id)
      .await?
      .ok_or(canvass_core::Error::SurveyNotFound(id))?;

    if current.updated_at != token {
      return Err(canvass_core::Error::StaleToken(id).into());
    }

    let now = self.clock.now();
    let flag = if allow { "1" } else { "0" };
    self
      .checked_update(id, token, "allow_review", flag.to_owned(), now)
      .await?;

    Ok(Survey { allow_review: allow, updated_at: now, ..current })
  }

  // ── Responses ─────────────────────────────────────────────────────────────

  async fn record_response(&self, input: NewResponse) -> Result<Response> {
    let survey = self
      .fetch_survey(input.survey_id)
      .await?
      .ok_or(canvass_core::Error::SurveyNotFound(input.survey_id))?;

    let now = self.clock.now();
    if !policy::is_open_for_responses(&survey, now) {
      return Err(
        canvass_core::Error::NotOpenForResponses(input.survey_id).into(),
      );
    }

    let survey_id_str  = encode_uuid(input.survey_id);
    let respondent_str = encode_uuid(input.respondent);

    let response = Response {
      response_id:  Uuid::new_v4(),
      survey_id:    input.survey_id,
      respondent:   input.respondent,
      answers:      input.answers,
      submitted_at: now,
    };

    let id_str      = encode_uuid(response.response_id);
    let answers_str = response.answers.to_string();
    let at_str      = encode_dt(response.submitted_at);

    // The UNIQUE (survey_id, respondent) constraint is the duplicate guard;
    // a pre-flight SELECT would race against concurrent submissions.
    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO responses
             (response_id, survey_id, respondent, answers, submitted_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            id_str,
            survey_id_str,
            respondent_str,
            answers_str,
            at_str,
          ],
        ) {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(
        canvass_core::Error::AlreadyResponded {
          survey_id:  input.survey_id,
          respondent: input.respondent,
        }
        .into(),
      );
    }

    Ok(response)
  }

  async fn get_results(
    &self,
    survey_id: Uuid,
    as_of:     Option<DateTime<Utc>>,
  ) -> Result<Option<ResultsView>> {
    let survey = match self.fetch_survey(survey_id).await? {
      Some(s) => s,
      None => return Ok(None),
    };

    let as_of_resolved = as_of.unwrap_or_else(|| self.clock.now());
    let survey_id_str = encode_uuid(survey_id);
    let as_of_str = encode_dt(as_of_resolved);

    let raws: Vec<RawResponse> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT response_id, survey_id, respondent, answers, submitted_at
           FROM responses
           WHERE survey_id = ?1 AND submitted_at <= ?2
           ORDER BY submitted_at ASC",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![survey_id_str, as_of_str], |row| {
            Ok(RawResponse {
              response_id:  row.get(0)?,
              survey_id:    row.get(1)?,
              respondent:   row.get(2)?,
              answers:      row.get(3)?,
              submitted_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    let responses: Vec<Response> = raws
      .into_iter()
      .map(RawResponse::into_response)
      .collect::<Result<_>>()?;

    Ok(Some(ResultsView { survey, as_of: as_of_resolved, responses }))
  }
}
