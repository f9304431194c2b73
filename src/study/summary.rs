//! End-of-session tally and score.

use serde::Serialize;

/// Percentage of answered cards that were correct, rounded.
///
/// Skipped cards don't count. Zero when nothing was answered.
pub fn score(correct: u32, wrong: u32) -> u32 {
  let answered = correct + wrong;
  if answered == 0 {
    return 0;
  }
  (correct as f64 / answered as f64 * 100.0).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
  pub correct: u32,
  pub wrong: u32,
  pub skipped: u32,
  pub studied: u32,
  pub score: u32,
  pub elapsed_secs: i64,
}

impl Summary {
  pub fn new(correct: u32, wrong: u32, skipped: u32, elapsed_secs: i64) -> Self {
    Self {
      correct,
      wrong,
      skipped,
      studied: correct + wrong + skipped,
      score: score(correct, wrong),
      elapsed_secs,
    }
  }

  /// "85%"
  pub fn score_label(&self) -> String {
    format!("{}%", self.score)
  }

  /// "4m 05s"
  pub fn elapsed_label(&self) -> String {
    let secs = self.elapsed_secs.max(0);
    format!("{}m {:02}s", secs / 60, secs % 60)
  }
}
