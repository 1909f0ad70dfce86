//! Duplicate-submission guard for lifecycle transitions.
//!
//! One transition per `(survey, action)` key may be in flight at a time.
//! Acquisition returns an RAII guard; the key is released on drop, on both
//! the success and the failure path.

use std::{collections::HashSet, sync::Mutex};

use canvass_core::policy::SurveyAction;
use uuid::Uuid;

type Key = (Uuid, SurveyAction);

/// The set of transitions currently being processed.
#[derive(Debug, Default)]
pub struct ActionGate {
  inflight: Mutex<HashSet<Key>>,
}

impl ActionGate {
  pub fn new() -> Self { Self::default() }

  /// Claim `(survey_id, action)`. Returns `None` if the same transition is
  /// already in flight.
  pub fn try_acquire(
    &self,
    survey_id: Uuid,
    action:    SurveyAction,
  ) -> Option<ActionGuard<'_>> {
    let key = (survey_id, action);
    let mut inflight =
      self.inflight.lock().unwrap_or_else(|e| e.into_inner());
    if inflight.insert(key) {
      Some(ActionGuard { gate: self, key })
    } else {
      None
    }
  }

  #[cfg(test)]
  fn is_held(&self, survey_id: Uuid, action: SurveyAction) -> bool {
    self
      .inflight
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .contains(&(survey_id, action))
  }
}

/// Releases its key when dropped.
#[derive(Debug)]
pub struct ActionGuard<'a> {
  gate: &'a ActionGate,
  key:  Key,
}

impl Drop for ActionGuard<'_> {
  fn drop(&mut self) {
    self
      .gate
      .inflight
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .remove(&self.key);
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn acquire_release_cycle() {
    let gate = ActionGate::new();
    let id = Uuid::new_v4();

    let guard = gate.try_acquire(id, SurveyAction::Activate);
    assert!(guard.is_some());
    assert!(gate.is_held(id, SurveyAction::Activate));

    drop(guard);
    assert!(!gate.is_held(id, SurveyAction::Activate));
    assert!(gate.try_acquire(id, SurveyAction::Activate).is_some());
  }

  #[test]
  fn duplicate_acquisition_fails_while_held() {
    let gate = ActionGate::new();
    let id = Uuid::new_v4();

    let _guard = gate.try_acquire(id, SurveyAction::Close).unwrap();
    assert!(gate.try_acquire(id, SurveyAction::Close).is_none());
  }

  #[test]
  fn keys_are_independent_per_survey_and_action() {
    let gate = ActionGate::new();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    let _guard = gate.try_acquire(a, SurveyAction::Pause).unwrap();
    // Different action on the same survey, same action on another survey.
    assert!(gate.try_acquire(a, SurveyAction::Close).is_some());
    assert!(gate.try_acquire(b, SurveyAction::Pause).is_some());
  }
}
