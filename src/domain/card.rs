use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage tag for a card's quiz variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
  Classic,
  MultipleChoice,
  TypeAnswer,
}

impl CardType {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "classic" => Some(Self::Classic),
      "multiple_choice" => Some(Self::MultipleChoice),
      "type_answer" => Some(Self::TypeAnswer),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Classic => "classic",
      Self::MultipleChoice => "multiple_choice",
      Self::TypeAnswer => "type_answer",
    }
  }
}

/// Answer shape of a card. Each variant carries only the fields its quiz needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CardKind {
  /// Flip card, rated by the learner
  Classic { back: String },
  /// `options` are author-supplied distractors and may be empty
  MultipleChoice {
    #[serde(default)]
    options: Vec<String>,
    correct_answers: Vec<String>,
  },
  /// Free text compared against `back` and `accepted_answers`
  TypeAnswer {
    back: String,
    #[serde(default)]
    accepted_answers: Vec<String>,
  },
}

impl CardKind {
  pub fn card_type(&self) -> CardType {
    match self {
      Self::Classic { .. } => CardType::Classic,
      Self::MultipleChoice { .. } => CardType::MultipleChoice,
      Self::TypeAnswer { .. } => CardType::TypeAnswer,
    }
  }

  /// The answer shown when the card is revealed.
  ///
  /// Multiple-choice cards join their correct answers.
  pub fn primary_answer(&self) -> String {
    match self {
      Self::Classic { back } | Self::TypeAnswer { back, .. } => back.clone(),
      Self::MultipleChoice { correct_answers, .. } => correct_answers.join(", "),
    }
  }

  /// Answers a sibling card may borrow as distractors
  pub fn distractor_candidates(&self) -> Vec<String> {
    match self {
      Self::Classic { back } | Self::TypeAnswer { back, .. } => vec![back.clone()],
      Self::MultipleChoice { correct_answers, .. } => correct_answers.clone(),
    }
  }
}

/// Image and audio references attached to one side of a card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub audio: Option<String>,
}

impl Media {
  pub fn is_empty(&self) -> bool {
    self.image.is_none() && self.audio.is_none()
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
  pub id: i64,
  pub deck_id: i64,
  pub front: String,
  pub kind: CardKind,
  #[serde(default, skip_serializing_if = "Media::is_empty")]
  pub front_media: Media,
  #[serde(default, skip_serializing_if = "Media::is_empty")]
  pub back_media: Media,
  pub favorite: bool,
  /// Soft exclusion: ignored cards stay in the deck but can be filtered out of sessions
  pub ignored: bool,
  pub position: i64,
  pub created_at: DateTime<Utc>,
}

impl Card {
  pub fn new(deck_id: i64, front: String, kind: CardKind) -> Self {
    Self {
      id: 0,
      deck_id,
      front,
      kind,
      front_media: Media::default(),
      back_media: Media::default(),
      favorite: false,
      ignored: false,
      position: 0,
      created_at: Utc::now(),
    }
  }

  pub fn card_type(&self) -> CardType {
    self.kind.card_type()
  }
}

/// Editable content of a card, as submitted by a client
#[derive(Debug, Clone, Deserialize)]
pub struct CardDraft {
  pub front: String,
  pub kind: CardKind,
  #[serde(default)]
  pub front_media: Media,
  #[serde(default)]
  pub back_media: Media,
  #[serde(default)]
  pub favorite: bool,
}

impl CardDraft {
  /// Check that the draft carries the fields its card type requires
  pub fn validate(&self) -> Result<(), String> {
    if self.front.trim().is_empty() {
      return Err("Card front cannot be empty".to_string());
    }
    match &self.kind {
      CardKind::Classic { back } | CardKind::TypeAnswer { back, .. } => {
        if back.trim().is_empty() {
          return Err("Card back cannot be empty".to_string());
        }
      }
      CardKind::MultipleChoice { correct_answers, .. } => {
        if !correct_answers.iter().any(|a| !a.trim().is_empty()) {
          return Err("Multiple choice cards need at least one correct answer".to_string());
        }
      }
    }
    Ok(())
  }

  pub fn into_card(self, deck_id: i64, position: i64) -> Card {
    Card {
      front_media: self.front_media,
      back_media: self.back_media,
      favorite: self.favorite,
      position,
      ..Card::new(deck_id, self.front, self.kind)
    }
  }
}

/// Partial update of a card's learner flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFlagsPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub favorite: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ignored: Option<bool>,
}
