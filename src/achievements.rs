//! Achievement flags observed from completed sessions.
//!
//! Observations are a side effect of finishing a session. They never gate
//! anything in the study flow.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config;
use crate::study::Summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
  /// Finished a session between midnight and 5am
  NightOwl,
  /// Finished a session between 5am and 8am
  EarlyBird,
  Marathon,
  QuickStudy,
  Perfectionist,
}

impl Achievement {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "night_owl" => Some(Self::NightOwl),
      "early_bird" => Some(Self::EarlyBird),
      "marathon" => Some(Self::Marathon),
      "quick_study" => Some(Self::QuickStudy),
      "perfectionist" => Some(Self::Perfectionist),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NightOwl => "night_owl",
      Self::EarlyBird => "early_bird",
      Self::Marathon => "marathon",
      Self::QuickStudy => "quick_study",
      Self::Perfectionist => "perfectionist",
    }
  }
}

pub type AchievementFlags = BTreeSet<Achievement>;

/// Achievements earned by a finished session.
///
/// `local_hour` is the wall-clock hour (0-23) at which the session ended.
pub fn observe(summary: &Summary, local_hour: u32) -> Vec<Achievement> {
  let mut earned = Vec::new();

  match local_hour {
    0..=4 => earned.push(Achievement::NightOwl),
    5..=7 => earned.push(Achievement::EarlyBird),
    _ => {}
  }

  if summary.elapsed_secs >= config::MARATHON_SECS {
    earned.push(Achievement::Marathon);
  }

  if summary.elapsed_secs <= config::QUICK_STUDY_SECS
    && summary.studied >= config::ACHIEVEMENT_MIN_CARDS
  {
    earned.push(Achievement::QuickStudy);
  }

  if summary.score == 100 && summary.correct + summary.wrong >= config::ACHIEVEMENT_MIN_CARDS {
    earned.push(Achievement::Perfectionist);
  }

  earned
}
