use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the working list of a session is ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CardOrder {
  /// Stable by card position
  #[default]
  Linear,
  Random,
}

/// Per-session configuration. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyOptions {
  pub order: CardOrder,
  /// Each card gets a fixed countdown; expiry counts as wrong
  pub timed: bool,
  /// Reshuffle and restart at the end of the list instead of finishing
  pub continuous_shuffle: bool,
  pub exclude_ignored: bool,
  pub favorites_only: bool,
}

impl Default for StudyOptions {
  fn default() -> Self {
    Self {
      order: CardOrder::Linear,
      timed: false,
      continuous_shuffle: false,
      exclude_ignored: true,
      favorites_only: false,
    }
  }
}

/// Where the cards of a session come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StudySource {
  Deck(i64),
  AllCards,
  /// Temporary study deck over a community snapshot
  Community(i64),
}

impl StudySource {
  /// Only sessions over a real deck produce persisted statistics
  pub fn is_persisted(&self) -> bool {
    matches!(self, Self::Deck(_))
  }

  /// Card flags can only be written back for the learner's own cards
  pub fn allows_card_mutation(&self) -> bool {
    !matches!(self, Self::Community(_))
  }
}

/// One completed study run. Created at completion, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
  pub id: i64,
  pub deck_id: i64,
  pub started_at: DateTime<Utc>,
  pub ended_at: DateTime<Utc>,
  pub correct: u32,
  pub incorrect: u32,
  pub skipped: u32,
  pub elapsed_secs: i64,
  /// Percentage 0-100
  pub score: u32,
}
