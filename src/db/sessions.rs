//! Completed study session records and per-deck statistics

use rusqlite::{params, Connection, Result};
use serde::Serialize;

use crate::domain::StudySession;

use super::cards::parse_timestamp;

pub fn insert_study_session(conn: &Connection, session: &StudySession) -> Result<i64> {
  conn.execute(
    r#"
    INSERT INTO study_sessions (deck_id, started_at, ended_at, correct, incorrect, skipped,
                                elapsed_secs, score)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    "#,
    params![
      session.deck_id,
      session.started_at.to_rfc3339(),
      session.ended_at.to_rfc3339(),
      session.correct,
      session.incorrect,
      session.skipped,
      session.elapsed_secs,
      session.score,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

/// Most recent sessions of a deck, newest first
pub fn get_deck_sessions(conn: &Connection, deck_id: i64, limit: usize) -> Result<Vec<StudySession>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, deck_id, started_at, ended_at, correct, incorrect, skipped, elapsed_secs, score
    FROM study_sessions
    WHERE deck_id = ?1
    ORDER BY ended_at DESC, id DESC
    LIMIT ?2
    "#,
  )?;

  let sessions = stmt
    .query_map(params![deck_id, limit as i64], |row| {
      let started_at: String = row.get(2)?;
      let ended_at: String = row.get(3)?;
      Ok(StudySession {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        started_at: parse_timestamp(&started_at),
        ended_at: parse_timestamp(&ended_at),
        correct: row.get(4)?,
        incorrect: row.get(5)?,
        skipped: row.get(6)?,
        elapsed_secs: row.get(7)?,
        score: row.get(8)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(sessions)
}

/// Aggregated history of a deck
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeckStats {
  pub sessions: i64,
  pub total_correct: i64,
  pub total_incorrect: i64,
  pub total_skipped: i64,
  pub total_secs: i64,
  /// Rounded mean of session scores, 0 without sessions
  pub average_score: i64,
  pub best_score: i64,
}

pub fn get_deck_stats(conn: &Connection, deck_id: i64) -> Result<DeckStats> {
  conn.query_row(
    r#"
    SELECT COUNT(*),
           COALESCE(SUM(correct), 0),
           COALESCE(SUM(incorrect), 0),
           COALESCE(SUM(skipped), 0),
           COALESCE(SUM(elapsed_secs), 0),
           COALESCE(ROUND(AVG(score)), 0),
           COALESCE(MAX(score), 0)
    FROM study_sessions
    WHERE deck_id = ?1
    "#,
    params![deck_id],
    |row| {
      let average: f64 = row.get(5)?;
      Ok(DeckStats {
        sessions: row.get(0)?,
        total_correct: row.get(1)?,
        total_incorrect: row.get(2)?,
        total_skipped: row.get(3)?,
        total_secs: row.get(4)?,
        average_score: average as i64,
        best_score: row.get(6)?,
      })
    },
  )
}
