//! Best-effort invalidation hints.
//!
//! After every successful mutation the API publishes a hint naming the
//! affected survey. Connected clients use hints only as a nudge to re-fetch;
//! missing one is fine because the store remains the sole source of truth and
//! clients poll anyway. This is explicitly not a consistency protocol.

use std::time::Duration;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use canvass_core::store::SurveyStore;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// A nudge to re-fetch one survey.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Hint {
  pub survey_id: Uuid,
}

/// Fan-out channel for [`Hint`]s. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HintBus {
  tx: broadcast::Sender<Hint>,
}

impl HintBus {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity);
    Self { tx }
  }

  /// Publish a hint. Having no listeners is not an error.
  pub fn publish(&self, survey_id: Uuid) {
    let _ = self.tx.send(Hint { survey_id });
  }

  pub fn subscribe(&self) -> broadcast::Receiver<Hint> {
    self.tx.subscribe()
  }
}

impl Default for HintBus {
  fn default() -> Self { Self::new(64) }
}

// ─── Watch handler ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WatchParams {
  /// How long to wait for a hint before giving up, in seconds.
  /// Defaults to 25, capped at 60.
  pub timeout_secs: Option<u64>,
}

/// `GET /invalidations/watch[?timeout_secs=...]`
///
/// Long-poll: responds with the next hint as JSON, or `204 No Content` once
/// the timeout elapses. Hints published before the call are not replayed.
pub async fn watch<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<WatchParams>,
) -> Result<Response, ApiError>
where
  S: SurveyStore,
{
  let mut rx = state.hints.subscribe();
  let wait = Duration::from_secs(params.timeout_secs.unwrap_or(25).min(60));

  let deadline = tokio::time::sleep(wait);
  tokio::pin!(deadline);

  loop {
    tokio::select! {
      _ = &mut deadline => return Ok(StatusCode::NO_CONTENT.into_response()),
      received = rx.recv() => match received {
        Ok(hint) => return Ok(Json(hint).into_response()),
        // Falling behind only means hints were dropped; keep waiting for
        // the next one rather than failing an advisory channel.
        Err(broadcast::error::RecvError::Lagged(_)) => continue,
        Err(broadcast::error::RecvError::Closed) => {
          return Ok(StatusCode::NO_CONTENT.into_response());
        }
      },
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn subscribers_receive_published_hints() {
    let bus = HintBus::default();
    let mut rx = bus.subscribe();

    let id = Uuid::new_v4();
    bus.publish(id);

    let hint = rx.recv().await.unwrap();
    assert_eq!(hint.survey_id, id);
  }

  #[test]
  fn publish_without_subscribers_is_silent() {
    let bus = HintBus::default();
    bus.publish(Uuid::new_v4());
  }
}
