//! In-memory registry of running study sessions.
//!
//! Sessions are keyed by a random ID handed to the client when the session
//! starts. Entries expire after a period of inactivity. A timed session also
//! owns the task that ticks its countdown; removing the entry stops it.

use crate::config;
use crate::services::study::Settlement;
use crate::study::Session;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::AbortHandle;

/// Stops a countdown task when dropped
#[derive(Debug)]
pub struct TimerGuard(AbortHandle);

impl TimerGuard {
  pub fn new(handle: AbortHandle) -> Self {
    Self(handle)
  }
}

impl Drop for TimerGuard {
  fn drop(&mut self) {
    self.0.abort();
  }
}

/// Session entry with last access time for expiration
#[derive(Debug)]
pub struct SessionEntry {
  pub session: Session,
  /// Set once the finished session's results have been recorded
  pub settlement: Option<Settlement>,
  pub timer: Option<TimerGuard>,
  last_access: DateTime<Utc>,
}

impl SessionEntry {
  fn new(session: Session) -> Self {
    Self {
      session,
      settlement: None,
      timer: None,
      last_access: Utc::now(),
    }
  }

  #[cfg(test)]
  pub(crate) fn backdate(&mut self, by: Duration) {
    self.last_access -= by;
  }

  /// No client request has touched the session within the expiry window
  pub fn is_idle(&self, now: DateTime<Utc>) -> bool {
    self.last_access <= now - Duration::hours(config::SESSION_EXPIRY_HOURS)
  }
}

/// Error returned when the session registry lock cannot be acquired
#[derive(Debug)]
pub struct SessionLockError;

impl std::fmt::Display for SessionLockError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Session store unavailable")
  }
}

impl std::error::Error for SessionLockError {}

#[derive(Clone, Default)]
pub struct SessionRegistry {
  inner: Arc<Mutex<HashMap<String, SessionEntry>>>,
}

impl SessionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, SessionEntry>>, SessionLockError> {
    self.inner.lock().map_err(|_| {
      tracing::error!("Session store mutex poisoned");
      SessionLockError
    })
  }

  /// Store a new session and return its ID
  pub fn insert(&self, session: Session) -> Result<String, SessionLockError> {
    let mut sessions = self.lock()?;

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      cleanup_expired(&mut sessions);
    }

    let mut id = generate_session_id();
    while sessions.contains_key(&id) {
      id = generate_session_id();
    }
    sessions.insert(id.clone(), SessionEntry::new(session));
    Ok(id)
  }

  /// Run `f` against a session. `Ok(None)` if there is no such session.
  pub fn with_entry<T>(
    &self,
    id: &str,
    f: impl FnOnce(&mut SessionEntry) -> T,
  ) -> Result<Option<T>, SessionLockError> {
    let mut sessions = self.lock()?;
    Ok(sessions.get_mut(id).map(|entry| {
      entry.last_access = Utc::now();
      f(entry)
    }))
  }

  /// Like `with_entry`, but leaves the idle clock alone.
  ///
  /// Background work (the countdown) goes through here so it never keeps an
  /// abandoned session alive.
  pub fn with_entry_untouched<T>(
    &self,
    id: &str,
    f: impl FnOnce(&mut SessionEntry) -> T,
  ) -> Result<Option<T>, SessionLockError> {
    let mut sessions = self.lock()?;
    Ok(sessions.get_mut(id).map(f))
  }

  /// Drop every idle session, returning how many went
  pub fn expire_idle(&self) -> Result<usize, SessionLockError> {
    Ok(cleanup_expired(&mut *self.lock()?))
  }

  /// Drop a session, stopping its timer
  pub fn remove(&self, id: &str) -> Result<Option<SessionEntry>, SessionLockError> {
    Ok(self.lock()?.remove(id))
  }

  pub fn len(&self) -> usize {
    self.lock().map(|s| s.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Clean up expired sessions
fn cleanup_expired(sessions: &mut HashMap<String, SessionEntry>) -> usize {
  let now = Utc::now();
  let before = sessions.len();
  sessions.retain(|_, entry| !entry.is_idle(now));
  let expired = before - sessions.len();
  if expired > 0 {
    tracing::debug!("Expired {} idle study sessions", expired);
  }
  expired
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
