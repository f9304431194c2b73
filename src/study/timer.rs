//! Per-card countdown for timed sessions.

use serde::Serialize;

use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TickOutcome {
  Running(u32),
  Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
  budget: u32,
  remaining: u32,
}

impl Countdown {
  pub fn new(budget: u32) -> Self {
    Self { budget, remaining: budget }
  }

  /// Countdown with the standard per-card budget
  pub fn per_card() -> Self {
    Self::new(config::TIMED_CARD_SECONDS)
  }

  pub fn remaining(&self) -> u32 {
    self.remaining
  }

  /// One second elapses. Stays expired until `reset`.
  pub fn tick(&mut self) -> TickOutcome {
    self.remaining = self.remaining.saturating_sub(1);
    if self.remaining == 0 {
      TickOutcome::Expired
    } else {
      TickOutcome::Running(self.remaining)
    }
  }

  pub fn reset(&mut self) {
    self.remaining = self.budget;
  }
}
