//! Study session orchestration: loading cards, driving the countdown,
//! recording finished sessions and learner flag toggles.
//!
//! Everything here runs under the session registry lock. The store is only
//! ever locked after the registry, never the other way round.

use chrono::{DateTime, Local, Timelike, Utc};
use rand::Rng;
use serde::Serialize;

use crate::achievements::{self, Achievement};
use crate::db::{CardStore, LogOnError};
use crate::domain::{CardFlagsPatch, StudyOptions, StudySource};
use crate::error::{AppError, AppResult};
use crate::session::{SessionEntry, SessionRegistry, TimerGuard};
use crate::study::{Phase, Session, Summary};

use super::optimistic::{self, MutationOutcome};

/// What was recorded when a session finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
  pub summary: Summary,
  /// Row ID of the saved statistics, None for temporary sessions or a failed write
  pub saved_session_id: Option<i64>,
  /// Achievements unlocked for the first time by this session
  pub unlocked: Vec<Achievement>,
}

/// Load the cards for `source` and start a session over them
pub fn start_session<S: CardStore, R: Rng + ?Sized>(
  store: &S,
  source: StudySource,
  options: StudyOptions,
  now: DateTime<Utc>,
  rng: &mut R,
) -> AppResult<Session> {
  let cards = store.fetch_cards(&source)?;
  tracing::debug!("Starting study session over {:?} with {} cards", source, cards.len());
  Ok(Session::start(source, cards, options, now, rng))
}

/// Record a finished session once: statistics for real decks, then
/// achievements. Failures are logged and never surface to the learner.
///
/// Returns None while the session is still running.
pub fn settle<'a, S: CardStore>(entry: &'a mut SessionEntry, store: &S, local_hour: u32) -> Option<&'a Settlement> {
  if entry.session.phase() != Phase::Finished {
    return None;
  }
  if entry.settlement.is_none() {
    // Finished sessions never need their countdown again
    entry.timer = None;

    let summary = entry.session.summary(Utc::now());
    if !entry.session.source().is_persisted() {
      tracing::debug!("Not recording statistics for {:?}", entry.session.source());
    }
    let saved_session_id = entry
      .session
      .record()
      .and_then(|record| store.add_study_session(&record).log_warn("Failed to save study session"));

    let unlocked = if summary.studied > 0 {
      achievements::observe(&summary, local_hour)
        .into_iter()
        .filter(|a| {
          store
            .unlock_achievement(*a)
            .log_warn("Failed to record achievement")
            .unwrap_or(false)
        })
        .collect()
    } else {
      Vec::new()
    };
    for a in &unlocked {
      tracing::info!("Achievement unlocked: {}", a.as_str());
    }

    entry.settlement = Some(Settlement {
      summary,
      saved_session_id,
      unlocked,
    });
  }
  entry.settlement.as_ref()
}

/// Hour of the local wall clock, for time-of-day achievements
pub fn local_hour() -> u32 {
  Local::now().hour()
}

/// Learner flags that can be toggled from inside a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFlag {
  Favorite,
  Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagToggle {
  pub card_id: i64,
  /// Flag value after the toggle (the old value if it was reverted)
  pub value: bool,
  #[serde(flatten)]
  pub outcome: MutationOutcome,
}

/// Flip a flag on a session card, then write it through to the store.
///
/// The session copy changes first. A failed write puts it back and the
/// response carries a notice instead. Ignoring a card doesn't pull it out of
/// the current pass; filters only apply on start and restart.
pub fn toggle_flag<S: CardStore>(session: &mut Session, store: &S, card_id: i64, flag: CardFlag) -> AppResult<FlagToggle> {
  if !session.source().allows_card_mutation() {
    return Err(AppError::BadRequest(
      "Cards in a community deck preview cannot be changed".to_string(),
    ));
  }
  let card = session
    .card_mut(card_id)
    .ok_or_else(|| AppError::NotFound(format!("Card {} is not in this session", card_id)))?;

  let (target, notice) = match flag {
    CardFlag::Favorite => (&mut card.favorite, "Could not update favorite"),
    CardFlag::Ignored => (&mut card.ignored, "Could not update ignored"),
  };
  let value = !*target;

  let outcome = optimistic::run(
    target,
    value,
    |v| {
      let patch = match flag {
        CardFlag::Favorite => CardFlagsPatch {
          favorite: Some(*v),
          ..Default::default()
        },
        CardFlag::Ignored => CardFlagsPatch {
          ignored: Some(*v),
          ..Default::default()
        },
      };
      match store.update_card_flags(card_id, &patch) {
        Ok(true) => Ok(()),
        Ok(false) => Err(rusqlite::Error::QueryReturnedNoRows),
        Err(e) => Err(e),
      }
    },
    notice,
  );

  Ok(FlagToggle {
    card_id,
    value: *target,
    outcome,
  })
}

enum CountdownStep {
  Running,
  Done,
  /// No client has looked at the session for the expiry window
  Abandoned,
}

/// Tick a timed session once per second until it finishes or goes away.
///
/// Ticks don't count as activity, so a session nobody is watching is dropped
/// once it has sat idle for the expiry window.
///
/// The returned guard belongs in the session's entry so the task stops when
/// the entry is dropped.
pub fn spawn_countdown<S>(registry: SessionRegistry, store: S, id: String) -> TimerGuard
where
  S: CardStore + Send + Sync + 'static,
{
  let handle = tokio::spawn(async move {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
    // The first tick completes immediately
    interval.tick().await;

    loop {
      interval.tick().await;
      let step = registry.with_entry_untouched(&id, |entry| {
        let now = Utc::now();
        if entry.is_idle(now) {
          return CountdownStep::Abandoned;
        }
        let mut rng = rand::rng();
        entry.session.tick(now, &mut rng);
        if entry.session.phase() == Phase::Active {
          CountdownStep::Running
        } else {
          settle(entry, &store, local_hour());
          CountdownStep::Done
        }
      });

      match step {
        Ok(Some(CountdownStep::Running)) => continue,
        Ok(Some(CountdownStep::Abandoned)) => {
          tracing::info!("Study session {} abandoned, dropping it", id);
          // Also drops this task's own guard
          if let Err(e) = registry.expire_idle() {
            tracing::error!("Failed to expire session {}: {}", id, e);
          }
          break;
        }
        Ok(_) => break,
        Err(e) => {
          tracing::error!("Countdown for session {} stopped: {}", id, e);
          break;
        }
      }
    }
    tracing::debug!("Countdown for session {} ended", id);
  });

  TimerGuard::new(handle.abort_handle())
}
