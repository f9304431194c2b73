//! The persistence seam used by the study flow.
//!
//! Study services talk to `CardStore` instead of a raw connection so a
//! session can be driven against an in-memory double in tests, including one
//! whose writes fail.

use rusqlite::Result;

use crate::achievements::Achievement;
use crate::domain::{Card, CardFlagsPatch, StudySession, StudySource};

use super::{try_lock, DbPool};

pub trait CardStore {
    /// Load the raw card collection for a session source
    fn fetch_cards(&self, source: &StudySource) -> Result<Vec<Card>>;

    /// Partial favorite/ignored update. Returns false if the card is gone.
    fn update_card_flags(&self, card_id: i64, patch: &CardFlagsPatch) -> Result<bool>;

    fn add_study_session(&self, session: &StudySession) -> Result<i64>;

    /// Returns true if the achievement was newly unlocked
    fn unlock_achievement(&self, achievement: Achievement) -> Result<bool>;
}

/// `CardStore` over the shared SQLite connection
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn lock_failure() -> rusqlite::Error {
    rusqlite::Error::InvalidParameterName("database lock poisoned".to_string())
}

impl CardStore for SqliteStore {
    fn fetch_cards(&self, source: &StudySource) -> Result<Vec<Card>> {
        let conn = try_lock(&self.pool).map_err(|_| lock_failure())?;
        match source {
            StudySource::Deck(id) => super::get_deck_cards(&conn, *id),
            StudySource::AllCards => super::get_all_cards(&conn),
            StudySource::Community(id) => super::get_community_cards(&conn, *id),
        }
    }

    fn update_card_flags(&self, card_id: i64, patch: &CardFlagsPatch) -> Result<bool> {
        let conn = try_lock(&self.pool).map_err(|_| lock_failure())?;
        super::update_card_flags(&conn, card_id, patch)
    }

    fn add_study_session(&self, session: &StudySession) -> Result<i64> {
        let conn = try_lock(&self.pool).map_err(|_| lock_failure())?;
        super::insert_study_session(&conn, session)
    }

    fn unlock_achievement(&self, achievement: Achievement) -> Result<bool> {
        let conn = try_lock(&self.pool).map_err(|_| lock_failure())?;
        super::unlock_achievement(&conn, achievement)
    }
}
