//! Deck CRUD and publishing.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};

use crate::db::{self, try_lock};
use crate::domain::{CommunityDeck, Deck, DeckDraft};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub(crate) fn deck_not_found(id: i64) -> AppError {
  AppError::NotFound(format!("Deck {} not found", id))
}

pub async fn list_decks(State(state): State<AppState>) -> AppResult<Json<Vec<Deck>>> {
  let conn = try_lock(&state.db)?;
  Ok(Json(db::list_decks(&conn)?))
}

pub async fn create_deck(
  State(state): State<AppState>,
  Json(draft): Json<DeckDraft>,
) -> AppResult<(StatusCode, Json<Deck>)> {
  draft.validate().map_err(AppError::BadRequest)?;

  let conn = try_lock(&state.db)?;
  let id = db::insert_deck(&conn, &draft)?;
  let deck = db::get_deck(&conn, id)?.ok_or_else(|| AppError::Internal(format!("Deck {} vanished after insert", id)))?;
  tracing::info!("Created deck {} ({})", deck.id, deck.name);
  Ok((StatusCode::CREATED, Json(deck)))
}

pub async fn get_deck(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Deck>> {
  let conn = try_lock(&state.db)?;
  db::get_deck(&conn, id)?.map(Json).ok_or_else(|| deck_not_found(id))
}

pub async fn update_deck(
  State(state): State<AppState>,
  Path(id): Path<i64>,
  Json(draft): Json<DeckDraft>,
) -> AppResult<Json<Deck>> {
  draft.validate().map_err(AppError::BadRequest)?;

  let conn = try_lock(&state.db)?;
  if !db::update_deck(&conn, id, &draft)? {
    return Err(deck_not_found(id));
  }
  db::get_deck(&conn, id)?.map(Json).ok_or_else(|| deck_not_found(id))
}

/// Deletes the deck with its cards and statistics, and withdraws it from the community
pub async fn delete_deck(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
  let conn = try_lock(&state.db)?;
  if db::delete_deck(&conn, id)? {
    tracing::info!("Deleted deck {}", id);
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(deck_not_found(id))
  }
}

/// Share a snapshot of the deck. Republishing replaces the previous snapshot.
pub async fn publish_deck(
  State(state): State<AppState>,
  Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<CommunityDeck>)> {
  let conn = try_lock(&state.db)?;
  let community_id = db::publish_deck(&conn, id)?.ok_or_else(|| deck_not_found(id))?;
  let community = db::get_community_deck(&conn, community_id)?
    .ok_or_else(|| AppError::Internal(format!("Community deck {} vanished after publish", community_id)))?;
  tracing::info!("Published deck {} as community deck {}", id, community_id);
  Ok((StatusCode::CREATED, Json(community)))
}

pub async fn unpublish_deck(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
  let conn = try_lock(&state.db)?;
  if db::unpublish_deck(&conn, id)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(AppError::NotFound(format!("Deck {} is not published", id)))
  }
}
