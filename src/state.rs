//! Application state shared by all handlers.

use std::path::PathBuf;

use crate::db::{DbPool, SqliteStore};
use crate::session::SessionRegistry;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,

    /// Study flow access to the same database
    pub store: SqliteStore,

    /// Running study sessions
    pub sessions: SessionRegistry,

    /// Where uploaded card images and audio are written
    pub media_dir: PathBuf,
}

impl AppState {
    pub fn new(db: DbPool, media_dir: PathBuf) -> Self {
        Self {
            store: SqliteStore::new(db.clone()),
            db,
            sessions: SessionRegistry::new(),
            media_dir,
        }
    }
}
