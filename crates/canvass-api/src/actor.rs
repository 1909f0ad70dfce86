//! Caller identity extraction.
//!
//! Authentication is handled upstream (session layer or reverse proxy); the
//! resulting identity is asserted on each request via the `x-actor-id` and
//! `x-actor-role` headers. Unknown role strings deliberately map to the
//! unprivileged role rather than erroring.

use axum::{extract::FromRequestParts, http::request::Parts};
use canvass_core::actor::{Actor, Role};
use uuid::Uuid;

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Extractor wrapper around [`Actor`].
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub Actor);

pub(crate) fn parse_role(s: &str) -> Role {
  match s.to_ascii_lowercase().as_str() {
    "admin" => Role::Admin,
    "lecturer" => Role::Lecturer,
    _ => Role::Participant,
  }
}

impl<S> FromRequestParts<S> for CallerIdentity
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let id_raw = parts
      .headers
      .get(ACTOR_ID_HEADER)
      .and_then(|v| v.to_str().ok())
      .ok_or_else(|| {
        ApiError::Unauthenticated(format!("missing {ACTOR_ID_HEADER} header"))
      })?;

    let actor_id = Uuid::parse_str(id_raw).map_err(|_| {
      ApiError::BadRequest(format!(
        "{ACTOR_ID_HEADER} is not a valid UUID: {id_raw:?}"
      ))
    })?;

    let role = parts
      .headers
      .get(ACTOR_ROLE_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(parse_role)
      .unwrap_or(Role::Participant);

    Ok(CallerIdentity(Actor { actor_id, role }))
  }
}
