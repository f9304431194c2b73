//! The study session state machine.
//!
//! `Empty` and `Finished` are terminal for the per-card loop; `restart` goes
//! back through filtering and ordering. Phase transitions:
//!
//! ```text
//! start ─┬─> Empty
//!        └─> Active ──(list end, continuous shuffle)──> Active (reshuffled)
//!              └──────(list end | finish)─────────────> Finished
//! ```

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::domain::{Card, StudyOptions, StudySession, StudySource};
use crate::navigation::View;

use super::modes::{self, Answer, AnswerMismatch, Quiz};
use super::ordering;
use super::summary::Summary;
use super::timer::{Countdown, TickOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  /// Filters left nothing to study
  Empty,
  Active,
  Finished,
}

/// Running counters. `studied` counts every card moved past, skips included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
  pub correct: u32,
  pub wrong: u32,
  pub skipped: u32,
  pub studied: u32,
}

impl Tally {
  fn record(&mut self, signal: Option<bool>) {
    match signal {
      Some(true) => self.correct += 1,
      Some(false) => self.wrong += 1,
      None => self.skipped += 1,
    }
    self.studied += 1;
  }
}

/// Result of submitting an answer for the current card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
  pub card_id: i64,
  /// None when skipped
  pub correct: Option<bool>,
  /// The answer to reveal
  pub expected: String,
  pub phase: Phase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
  NotActive(Phase),
  Mismatch(AnswerMismatch),
}

impl std::fmt::Display for SubmitError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::NotActive(phase) => write!(f, "session is not active ({:?})", phase),
      Self::Mismatch(m) => write!(f, "{}", m),
    }
  }
}

impl std::error::Error for SubmitError {}

#[derive(Debug, Clone)]
pub struct Session {
  source: StudySource,
  options: StudyOptions,
  /// Every card loaded for the session, unfiltered
  pool: Vec<Card>,
  /// Working list: indices into `pool`
  order: Vec<usize>,
  position: usize,
  phase: Phase,
  tally: Tally,
  /// Completed reshuffles in continuous mode
  rounds: u32,
  countdown: Option<Countdown>,
  quiz: Option<Quiz>,
  started_at: DateTime<Utc>,
  ended_at: Option<DateTime<Utc>>,
}

impl Session {
  /// Filter and order `cards`, then enter the per-card loop (or `Empty`)
  pub fn start<R: Rng + ?Sized>(
    source: StudySource,
    cards: Vec<Card>,
    options: StudyOptions,
    now: DateTime<Utc>,
    rng: &mut R,
  ) -> Self {
    let mut session = Self {
      source,
      options,
      pool: cards,
      order: Vec::new(),
      position: 0,
      phase: Phase::Empty,
      tally: Tally::default(),
      rounds: 0,
      countdown: None,
      quiz: None,
      started_at: now,
      ended_at: None,
    };
    session.begin(now, rng);
    session
  }

  fn begin<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) {
    self.order = ordering::prepare(&self.pool, &self.options, rng);
    self.position = 0;
    self.tally = Tally::default();
    self.rounds = 0;
    self.started_at = now;
    self.ended_at = None;

    if self.order.is_empty() {
      tracing::debug!("Study session over {:?} has no cards after filtering", self.source);
      self.phase = Phase::Empty;
      self.countdown = None;
      self.quiz = None;
    } else {
      self.phase = Phase::Active;
      self.enter_card(rng);
    }
  }

  /// Render the current card and restart its countdown
  fn enter_card<R: Rng + ?Sized>(&mut self, rng: &mut R) {
    if self.options.timed {
      self.countdown.get_or_insert_with(Countdown::per_card).reset();
    }
    self.quiz = self.current().map(|card| modes::render(card, self.cards(), rng));
  }

  pub fn source(&self) -> StudySource {
    self.source
  }

  pub fn options(&self) -> &StudyOptions {
    &self.options
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn tally(&self) -> Tally {
    self.tally
  }

  pub fn position(&self) -> usize {
    self.position
  }

  /// Length of the working list
  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  pub fn rounds(&self) -> u32 {
    self.rounds
  }

  pub fn started_at(&self) -> DateTime<Utc> {
    self.started_at
  }

  /// Cards of the working list, in session order
  pub fn cards(&self) -> impl Iterator<Item = &Card> {
    self.order.iter().map(|&i| &self.pool[i])
  }

  pub fn current(&self) -> Option<&Card> {
    if self.phase != Phase::Active {
      return None;
    }
    self.order.get(self.position).map(|&i| &self.pool[i])
  }

  pub fn quiz(&self) -> Option<&Quiz> {
    self.quiz.as_ref()
  }

  /// Seconds left on the current card in timed mode
  pub fn remaining_secs(&self) -> Option<u32> {
    self.countdown.map(|c| c.remaining())
  }

  /// Local copy of a session card, for flag edits
  pub fn card_mut(&mut self, card_id: i64) -> Option<&mut Card> {
    self.pool.iter_mut().find(|c| c.id == card_id)
  }

  /// Record a correctness signal for the current card and advance.
  ///
  /// `None` is a skip. Ignored unless the session is active.
  pub fn answer<R: Rng + ?Sized>(&mut self, signal: Option<bool>, now: DateTime<Utc>, rng: &mut R) {
    if self.phase != Phase::Active {
      return;
    }
    self.tally.record(signal);
    self.advance(now, rng);
  }

  /// Grade `answer` against the current card, record it and advance
  pub fn submit<R: Rng + ?Sized>(
    &mut self,
    answer: &Answer,
    now: DateTime<Utc>,
    rng: &mut R,
  ) -> Result<Feedback, SubmitError> {
    let card = self.current().ok_or(SubmitError::NotActive(self.phase))?;
    let card_id = card.id;
    let expected = card.kind.primary_answer();
    let correct = modes::grade(card, answer).map_err(SubmitError::Mismatch)?;

    self.answer(correct, now, rng);
    Ok(Feedback {
      card_id,
      correct,
      expected,
      phase: self.phase,
    })
  }

  fn advance<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) {
    self.position += 1;
    if self.position < self.order.len() {
      self.enter_card(rng);
      return;
    }

    if self.options.continuous_shuffle {
      self.order.shuffle(rng);
      self.position = 0;
      self.rounds += 1;
      tracing::debug!("Reshuffled session for round {}", self.rounds + 1);
      self.enter_card(rng);
    } else {
      self.finish(now);
    }
  }

  /// One second of the current card's countdown elapses.
  ///
  /// Expiry counts as a wrong answer and advances. Returns None when the
  /// session is untimed or no longer active.
  pub fn tick<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> Option<TickOutcome> {
    if self.phase != Phase::Active {
      return None;
    }
    let outcome = self.countdown.as_mut()?.tick();
    if outcome == TickOutcome::Expired {
      self.answer(Some(false), now, rng);
    }
    Some(outcome)
  }

  /// Stop the session. No-op unless active.
  pub fn finish(&mut self, now: DateTime<Utc>) {
    if self.phase != Phase::Active {
      return;
    }
    self.phase = Phase::Finished;
    self.ended_at = Some(now);
    self.countdown = None;
    self.quiz = None;
  }

  /// Run filtering and ordering again over the original cards with fresh counters.
  ///
  /// The store is not consulted again: cards added or deleted since the
  /// session started are not picked up, only flag changes made in-session.
  pub fn restart<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) {
    self.begin(now, rng);
  }

  pub fn summary(&self, now: DateTime<Utc>) -> Summary {
    let ended = self.ended_at.unwrap_or(now);
    let elapsed = (ended - self.started_at).num_seconds().max(0);
    Summary::new(self.tally.correct, self.tally.wrong, self.tally.skipped, elapsed)
  }

  pub fn ended_at(&self) -> Option<DateTime<Utc>> {
    self.ended_at
  }

  /// The record to persist, for finished sessions over a real deck
  pub fn record(&self) -> Option<StudySession> {
    let StudySource::Deck(deck_id) = self.source else {
      return None;
    };
    let ended_at = self.ended_at?;
    let summary = self.summary(ended_at);
    Some(StudySession {
      id: 0,
      deck_id,
      started_at: self.started_at,
      ended_at,
      correct: summary.correct,
      incorrect: summary.wrong,
      skipped: summary.skipped,
      elapsed_secs: summary.elapsed_secs,
      score: summary.score,
    })
  }

  /// Where to go when the learner leaves the session
  pub fn exit_view(&self) -> View {
    match self.source {
      StudySource::Deck(id) => View::Deck { id },
      StudySource::Community(id) => View::Community { id },
      StudySource::AllCards => View::Home,
    }
  }
}
