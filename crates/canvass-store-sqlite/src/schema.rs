//! SQL schema for the Canvass SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS surveys (
    survey_id    TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    kind         TEXT NOT NULL,              -- 'survey' | 'quiz'
    object       TEXT,
    status       TEXT NOT NULL DEFAULT 'pending',
    start_at     TEXT,                       -- ISO 8601 UTC or NULL
    end_at       TEXT,
    allow_review INTEGER NOT NULL DEFAULT 0,
    created_by   TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL               -- doubles as the optimistic concurrency token
);

-- Responses are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS responses (
    response_id  TEXT PRIMARY KEY,
    survey_id    TEXT NOT NULL REFERENCES surveys(survey_id),
    respondent   TEXT NOT NULL,
    answers      TEXT NOT NULL DEFAULT '{}', -- JSON payload
    submitted_at TEXT NOT NULL,              -- ISO 8601 UTC; server-assigned
    UNIQUE (survey_id, respondent)
);

CREATE INDEX IF NOT EXISTS surveys_status_idx   ON surveys(status);
CREATE INDEX IF NOT EXISTS surveys_creator_idx  ON surveys(created_by);
CREATE INDEX IF NOT EXISTS responses_survey_idx ON responses(survey_id);

PRAGMA user_version = 1;
";
