//! Study history, per-deck statistics and achievements.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::achievements::AchievementFlags;
use crate::db::{self, DeckStats, try_lock};
use crate::domain::StudySession;
use crate::error::AppResult;
use crate::state::AppState;

use super::decks::deck_not_found;

const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
  pub limit: Option<usize>,
}

/// Most recent sessions first
pub async fn deck_sessions(
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
  Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<StudySession>>> {
  let conn = try_lock(&state.db)?;
  if db::get_deck(&conn, deck_id)?.is_none() {
    return Err(deck_not_found(deck_id));
  }
  let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
  Ok(Json(db::get_deck_sessions(&conn, deck_id, limit)?))
}

pub async fn deck_stats(State(state): State<AppState>, Path(deck_id): Path<i64>) -> AppResult<Json<DeckStats>> {
  let conn = try_lock(&state.db)?;
  if db::get_deck(&conn, deck_id)?.is_none() {
    return Err(deck_not_found(deck_id));
  }
  Ok(Json(db::get_deck_stats(&conn, deck_id)?))
}

pub async fn achievements(State(state): State<AppState>) -> AppResult<Json<AchievementFlags>> {
  let conn = try_lock(&state.db)?;
  Ok(Json(db::get_achievements(&conn)?))
}
