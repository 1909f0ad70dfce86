//! JSON REST API for Canvass.
//!
//! Exposes an axum [`Router`] backed by any
//! [`canvass_core::store::SurveyStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility; caller identity arrives as headers (see
//! [`actor`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", canvass_api::api_router(state))
//! ```

pub mod actor;
pub mod error;
pub mod gate;
pub mod invalidate;
pub mod results;
pub mod surveys;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use canvass_core::{
  clock::{Clock, SystemClock},
  store::SurveyStore,
};

pub use error::{ApiError, ErrorCode};
pub use gate::ActionGate;
pub use invalidate::{Hint, HintBus};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store: Arc<S>,
  pub clock: Arc<dyn Clock>,
  pub gate:  Arc<ActionGate>,
  pub hints: HintBus,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self::with_clock(store, Arc::new(SystemClock))
  }

  pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
    Self {
      store,
      clock,
      gate: Arc::new(ActionGate::new()),
      hints: HintBus::default(),
    }
  }
}

// Manual impl: `S` itself need not be `Clone` behind the `Arc`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store: self.store.clone(),
      clock: self.clock.clone(),
      gate:  self.gate.clone(),
      hints: self.hints.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SurveyStore + Send + Sync + 'static,
{
  Router::new()
    // Surveys
    .route(
      "/surveys",
      get(surveys::list::<S>).post(surveys::create::<S>),
    )
    .route("/surveys/{id}", get(surveys::get_one::<S>))
    .route("/surveys/{id}/status", post(surveys::change_status::<S>))
    .route(
      "/surveys/{id}/review-permission",
      post(surveys::set_review::<S>),
    )
    // Responses and results
    .route("/surveys/{id}/responses", post(results::submit::<S>))
    .route("/surveys/{id}/results", get(results::results::<S>))
    // Invalidation hints
    .route("/invalidations/watch", get(invalidate::watch::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
