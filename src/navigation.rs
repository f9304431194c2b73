//! Views the client can be sent to.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
  Home,
  Decks,
  Deck { id: i64 },
  Study { session_id: String },
  Summary { session_id: String },
  /// Preview of a published deck, studied as a temporary deck
  Community { id: i64 },
  Stats { deck_id: i64 },
}
