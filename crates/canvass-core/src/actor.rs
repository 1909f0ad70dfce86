//! Actor identity — who is asking.
//!
//! Authentication happens outside this system; callers arrive with an
//! already-asserted identity. The role controls which lifecycle actions are
//! exposed and which surveys are visible.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The permission class of the calling user.
///
/// Anything that is not `Admin` or `Lecturer` is unprivileged and maps to
/// `Participant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Lecturer,
  Participant,
}

impl Role {
  /// Privileged roles may create surveys, request transitions, and view
  /// results of their (visible) surveys.
  pub fn is_privileged(self) -> bool {
    matches!(self, Self::Admin | Self::Lecturer)
  }
}

/// An asserted caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub actor_id: Uuid,
  pub role:     Role,
}
