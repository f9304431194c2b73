//! Presentation modes: how a card is quizzed and how an answer is graded.
//!
//! The mode follows the card's stored type. Each mode renders a `Quiz` for
//! the client and grades the matching `Answer` shape.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config;
use crate::domain::{Card, CardKind, CardType, Media};
use crate::validation::{check_choices, check_typed_answer};

/// What the client shows for the current card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Quiz {
  /// Reveal-and-rate. The back is sent up front; the client decides when to show it.
  Flip {
    card_id: i64,
    front: String,
    back: String,
    #[serde(skip_serializing_if = "Media::is_empty")]
    front_media: Media,
    #[serde(skip_serializing_if = "Media::is_empty")]
    back_media: Media,
  },
  MultipleChoice {
    card_id: i64,
    front: String,
    #[serde(skip_serializing_if = "Media::is_empty")]
    front_media: Media,
    choices: Vec<String>,
    /// More than one choice must be selected
    multi: bool,
  },
  TypeAnswer {
    card_id: i64,
    front: String,
    #[serde(skip_serializing_if = "Media::is_empty")]
    front_media: Media,
  },
}

/// A learner's response to the current card
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
  /// Flip cards: the learner says whether they knew it
  SelfReport { correct: bool },
  Choices { selected: Vec<String> },
  Typed { text: String },
  /// Move on without answering
  Skip,
}

/// The answer shape doesn't fit the card's type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerMismatch {
  pub card_type: CardType,
}

impl fmt::Display for AnswerMismatch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "answer does not match a {} card", self.card_type.as_str())
  }
}

impl std::error::Error for AnswerMismatch {}

/// Render the quiz for a card. `siblings` are the other cards of the session,
/// used for distractors when the card has none of its own. They are only
/// walked for multiple choice cards.
pub fn render<'a, R: Rng + ?Sized>(
  card: &Card,
  siblings: impl IntoIterator<Item = &'a Card>,
  rng: &mut R,
) -> Quiz {
  match &card.kind {
    CardKind::Classic { back } => Quiz::Flip {
      card_id: card.id,
      front: card.front.clone(),
      back: back.clone(),
      front_media: card.front_media.clone(),
      back_media: card.back_media.clone(),
    },
    CardKind::MultipleChoice { correct_answers, .. } => Quiz::MultipleChoice {
      card_id: card.id,
      front: card.front.clone(),
      front_media: card.front_media.clone(),
      choices: generate_choices(card, siblings, rng),
      multi: correct_answers.len() > 1,
    },
    CardKind::TypeAnswer { .. } => Quiz::TypeAnswer {
      card_id: card.id,
      front: card.front.clone(),
      front_media: card.front_media.clone(),
    },
  }
}

/// Correct answers plus distractors, shuffled.
///
/// Author-supplied options are used as-is. Without them, wrong answers are
/// sampled from sibling cards, up to `DISTRACTOR_COUNT`.
pub fn generate_choices<'a, R: Rng + ?Sized>(
  card: &Card,
  siblings: impl IntoIterator<Item = &'a Card>,
  rng: &mut R,
) -> Vec<String> {
  let CardKind::MultipleChoice { options, correct_answers } = &card.kind else {
    return Vec::new();
  };

  let mut correct = correct_answers.clone();
  correct.sort();
  correct.dedup();

  let mut distractors: Vec<String> = options
    .iter()
    .filter(|o| !o.trim().is_empty() && !correct.contains(*o))
    .cloned()
    .collect();
  distractors.sort();
  distractors.dedup();

  if distractors.is_empty() {
    // Borrow answers from sibling cards
    let mut borrowed: Vec<String> = siblings
      .into_iter()
      .filter(|c| c.id != card.id)
      .flat_map(|c| c.kind.distractor_candidates())
      .filter(|a| !a.trim().is_empty() && !correct.contains(a))
      .collect();
    borrowed.sort();
    borrowed.dedup();
    borrowed.shuffle(rng);
    borrowed.truncate(config::DISTRACTOR_COUNT);
    distractors = borrowed;
  }

  let mut choices = correct;
  choices.extend(distractors);
  choices.shuffle(rng);
  choices
}

/// Grade an answer against a card.
///
/// `Ok(None)` means skipped.
pub fn grade(card: &Card, answer: &Answer) -> Result<Option<bool>, AnswerMismatch> {
  let mismatch = AnswerMismatch { card_type: card.card_type() };
  match (answer, &card.kind) {
    (Answer::Skip, _) => Ok(None),
    (Answer::SelfReport { correct }, CardKind::Classic { .. }) => Ok(Some(*correct)),
    (Answer::Choices { selected }, CardKind::MultipleChoice { correct_answers, .. }) => {
      Ok(Some(check_choices(selected, correct_answers)))
    }
    (Answer::Typed { text }, CardKind::TypeAnswer { back, accepted_answers }) => {
      Ok(Some(check_typed_answer(text, back, accepted_answers)))
    }
    _ => Err(mismatch),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  fn card(id: i64, kind: CardKind) -> Card {
    let mut c = Card::new(1, format!("q{}", id), kind);
    c.id = id;
    c
  }

  fn mc(id: i64, options: &[&str], correct: &[&str]) -> Card {
    card(
      id,
      CardKind::MultipleChoice {
        options: options.iter().map(|s| s.to_string()).collect(),
        correct_answers: correct.iter().map(|s| s.to_string()).collect(),
      },
    )
  }

  fn classic(id: i64, back: &str) -> Card {
    card(id, CardKind::Classic { back: back.to_string() })
  }

  #[test]
  fn test_render_dispatches_on_type() {
    let mut rng = StdRng::seed_from_u64(1);
    assert!(matches!(render(&classic(1, "a"), &[], &mut rng), Quiz::Flip { .. }));
    assert!(matches!(render(&mc(2, &["x"], &["a"]), &[], &mut rng), Quiz::MultipleChoice { .. }));
    let typed = card(3, CardKind::TypeAnswer { back: "a".into(), accepted_answers: vec![] });
    assert!(matches!(render(&typed, &[], &mut rng), Quiz::TypeAnswer { .. }));
  }

  #[test]
  fn test_type_answer_quiz_hides_answer() {
    let mut rng = StdRng::seed_from_u64(1);
    let typed = card(3, CardKind::TypeAnswer { back: "Paris".into(), accepted_answers: vec![] });
    let json = serde_json::to_string(&render(&typed, &[], &mut rng)).unwrap();
    assert!(!json.contains("Paris"));
    assert!(json.contains(r#""mode":"type_answer""#));
  }

  #[test]
  fn test_choices_use_author_options() {
    let mut rng = StdRng::seed_from_u64(1);
    let c = mc(1, &["B", "C", "D"], &["A"]);
    let mut choices = generate_choices(&c, &[classic(2, "Z")], &mut rng);
    choices.sort();
    assert_eq!(choices, vec!["A", "B", "C", "D"]);
  }

  #[test]
  fn test_choices_multi_correct() {
    let mut rng = StdRng::seed_from_u64(1);
    let c = mc(1, &["C"], &["A", "B"]);
    let mut choices = generate_choices(&c, &[], &mut rng);
    choices.sort();
    assert_eq!(choices, vec!["A", "B", "C"]);
    match render(&c, &[], &mut rng) {
      Quiz::MultipleChoice { multi, .. } => assert!(multi),
      other => panic!("unexpected quiz {:?}", other),
    }
  }

  #[test]
  fn test_choices_fall_back_to_siblings() {
    let mut rng = StdRng::seed_from_u64(9);
    let c = mc(1, &[], &["Paris"]);
    let siblings = vec![
      c.clone(),
      classic(2, "Madrid"),
      classic(3, "Rome"),
      classic(4, "Paris"),
      classic(5, "Berlin"),
      classic(6, "Lisbon"),
    ];
    let choices = generate_choices(&c, &siblings, &mut rng);
    assert_eq!(choices.len(), 1 + config::DISTRACTOR_COUNT);
    assert_eq!(choices.iter().filter(|c| *c == "Paris").count(), 1);
  }

  #[test]
  fn test_choices_with_few_siblings() {
    let mut rng = StdRng::seed_from_u64(9);
    let c = mc(1, &[], &["A"]);
    let mut choices = generate_choices(&c, &[c.clone(), classic(2, "B")], &mut rng);
    choices.sort();
    assert_eq!(choices, vec!["A", "B"]);
  }

  #[test]
  fn test_grade_partial_multiple_choice_is_wrong() {
    let c = mc(1, &["C"], &["A", "B"]);
    let answer = Answer::Choices { selected: vec!["A".into()] };
    assert_eq!(grade(&c, &answer), Ok(Some(false)));
    let answer = Answer::Choices { selected: vec!["B".into(), "A".into()] };
    assert_eq!(grade(&c, &answer), Ok(Some(true)));
  }

  #[test]
  fn test_grade_typed_with_alternates() {
    let c = card(
      1,
      CardKind::TypeAnswer { back: "Paris".into(), accepted_answers: vec!["paris".into(), "PARIS ".into()] },
    );
    assert_eq!(grade(&c, &Answer::Typed { text: " paris".into() }), Ok(Some(true)));
    assert_eq!(grade(&c, &Answer::Typed { text: "Lyon".into() }), Ok(Some(false)));
  }

  #[test]
  fn test_grade_self_report_and_skip() {
    let c = classic(1, "a");
    assert_eq!(grade(&c, &Answer::SelfReport { correct: true }), Ok(Some(true)));
    assert_eq!(grade(&c, &Answer::SelfReport { correct: false }), Ok(Some(false)));
    assert_eq!(grade(&c, &Answer::Skip), Ok(None));
  }

  #[test]
  fn test_grade_rejects_wrong_shape() {
    let c = classic(1, "a");
    let err = grade(&c, &Answer::Typed { text: "a".into() }).unwrap_err();
    assert_eq!(err.card_type, CardType::Classic);
    assert_eq!(err.to_string(), "answer does not match a classic card");
  }

  #[test]
  fn test_answer_deserialize() {
    let a: Answer = serde_json::from_str(r#"{"kind":"typed","text":"x"}"#).unwrap();
    assert_eq!(a, Answer::Typed { text: "x".into() });
    let a: Answer = serde_json::from_str(r#"{"kind":"skip"}"#).unwrap();
    assert_eq!(a, Answer::Skip);
  }
}
