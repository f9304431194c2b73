use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS decks (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      emoji TEXT NOT NULL,
      color TEXT NOT NULL,
      category TEXT,
      subtopic TEXT,
      difficulty TEXT NOT NULL DEFAULT 'beginner',
      source_language TEXT,
      target_language TEXT,
      community_id INTEGER,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS cards (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      deck_id INTEGER NOT NULL,
      card_type TEXT NOT NULL,
      front TEXT NOT NULL,
      -- classic / type_answer
      back TEXT,
      -- JSON arrays, multiple_choice / type_answer
      options TEXT,
      correct_answers TEXT,
      accepted_answers TEXT,
      front_image TEXT,
      front_audio TEXT,
      back_image TEXT,
      back_audio TEXT,
      favorite INTEGER NOT NULL DEFAULT 0,
      ignored INTEGER NOT NULL DEFAULT 0,
      position INTEGER NOT NULL DEFAULT 0,
      created_at TEXT NOT NULL,
      FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS study_sessions (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      deck_id INTEGER NOT NULL,
      started_at TEXT NOT NULL,
      ended_at TEXT NOT NULL,
      correct INTEGER NOT NULL,
      incorrect INTEGER NOT NULL,
      skipped INTEGER NOT NULL,
      elapsed_secs INTEGER NOT NULL,
      score INTEGER NOT NULL,
      FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS community_decks (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      source_deck_id INTEGER,
      name TEXT NOT NULL,
      emoji TEXT NOT NULL,
      color TEXT NOT NULL,
      category TEXT,
      difficulty TEXT NOT NULL DEFAULT 'beginner',
      published_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS community_cards (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      community_deck_id INTEGER NOT NULL,
      card_type TEXT NOT NULL,
      front TEXT NOT NULL,
      back TEXT,
      options TEXT,
      correct_answers TEXT,
      accepted_answers TEXT,
      front_image TEXT,
      front_audio TEXT,
      back_image TEXT,
      back_audio TEXT,
      position INTEGER NOT NULL DEFAULT 0,
      created_at TEXT NOT NULL,
      FOREIGN KEY (community_deck_id) REFERENCES community_decks(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS achievements (
      key TEXT PRIMARY KEY,
      unlocked_at TEXT NOT NULL
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_cards_deck_id ON cards(deck_id);
    CREATE INDEX IF NOT EXISTS idx_cards_position ON cards(deck_id, position);
    CREATE INDEX IF NOT EXISTS idx_study_sessions_deck_id ON study_sessions(deck_id);
    CREATE INDEX IF NOT EXISTS idx_community_cards_deck_id ON community_cards(community_deck_id);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // These are no-ops for new databases (columns already exist)
  // ============================================================

  // Migration: media attachments were added after the first release
  add_column_if_missing(conn, "cards", "front_audio", "TEXT")?;
  add_column_if_missing(conn, "cards", "back_audio", "TEXT")?;

  // Migration: language pair on decks
  add_column_if_missing(conn, "decks", "source_language", "TEXT")?;
  add_column_if_missing(conn, "decks", "target_language", "TEXT")?;

  Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}
