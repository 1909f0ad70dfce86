//! Error type for `canvass-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] canvass_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

/// Collapse into the core error so transport layers can map domain failures
/// to structured codes without knowing this backend exists.
impl From<Error> for canvass_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => canvass_core::Error::Storage(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
