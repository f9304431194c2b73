use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

impl Difficulty {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "beginner" => Some(Self::Beginner),
      "intermediate" => Some(Self::Intermediate),
      "advanced" => Some(Self::Advanced),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Beginner => "beginner",
      Self::Intermediate => "intermediate",
      Self::Advanced => "advanced",
    }
  }
}

/// Source/target language for language-learning decks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
  pub source: String,
  pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
  pub id: i64,
  pub name: String,
  pub emoji: String,
  pub color: String,
  pub category: Option<String>,
  pub subtopic: Option<String>,
  pub difficulty: Difficulty,
  pub language: Option<LanguagePair>,
  pub card_count: i64,
  /// Community copy this deck was published as, if any
  pub community_id: Option<i64>,
  pub created_at: DateTime<Utc>,
}

/// Editable deck attributes, as submitted by a client
#[derive(Debug, Clone, Deserialize)]
pub struct DeckDraft {
  pub name: String,
  #[serde(default = "default_emoji")]
  pub emoji: String,
  #[serde(default = "default_color")]
  pub color: String,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub subtopic: Option<String>,
  #[serde(default)]
  pub difficulty: Difficulty,
  #[serde(default)]
  pub language: Option<LanguagePair>,
}

fn default_emoji() -> String {
  "📚".to_string()
}

fn default_color() -> String {
  "#6366f1".to_string()
}

impl DeckDraft {
  pub fn validate(&self) -> Result<(), String> {
    if self.name.trim().is_empty() {
      return Err("Deck name cannot be empty".to_string());
    }
    if let Some(lang) = &self.language {
      if lang.source.trim().is_empty() || lang.target.trim().is_empty() {
        return Err("Language pair needs both a source and a target".to_string());
      }
    }
    Ok(())
  }
}

/// Published snapshot of a deck, importable by other users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityDeck {
  pub id: i64,
  pub source_deck_id: Option<i64>,
  pub name: String,
  pub emoji: String,
  pub color: String,
  pub category: Option<String>,
  pub difficulty: Difficulty,
  pub card_count: i64,
  pub published_at: DateTime<Utc>,
}
