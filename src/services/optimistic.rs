//! Optimistic local mutation with rollback.
//!
//! The local value changes first so the client sees the new state at once.
//! If the backing write fails the previous value is restored and the caller
//! gets a notice to show. Failed writes are not retried.

use serde::Serialize;
use std::fmt::Display;

/// A local change that can still be undone
#[must_use = "an applied change must be committed or rolled back"]
pub struct Optimistic<T> {
  previous: T,
}

impl<T> Optimistic<T> {
  /// Replace `target` with `value`, remembering what was there
  pub fn apply(target: &mut T, value: T) -> Self {
    let previous = std::mem::replace(target, value);
    Self { previous }
  }

  /// Keep the new value
  pub fn commit(self) {}

  /// Restore the value from before `apply`
  pub fn rollback(self, target: &mut T) {
    *target = self.previous;
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MutationOutcome {
  Applied,
  Reverted { notice: String },
}

impl MutationOutcome {
  pub fn is_applied(&self) -> bool {
    matches!(self, Self::Applied)
  }
}

/// Apply `value` to `target`, then persist it with `write`.
///
/// On a failed write the local change is rolled back.
pub fn run<T, E, W>(target: &mut T, value: T, write: W, notice: &str) -> MutationOutcome
where
  E: Display,
  W: FnOnce(&T) -> Result<(), E>,
{
  let pending = Optimistic::apply(target, value);
  match write(target) {
    Ok(()) => {
      pending.commit();
      MutationOutcome::Applied
    }
    Err(e) => {
      tracing::warn!("{}: {}", notice, e);
      pending.rollback(target);
      MutationOutcome::Reverted {
        notice: notice.to_string(),
      }
    }
  }
}
