use axum::{
  Json,
  extract::{Path, State},
};
use serde::Serialize;

use crate::db::{self, try_lock};
use crate::domain::{Card, CommunityDeck};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CommunityDeckView {
  #[serde(flatten)]
  pub deck: CommunityDeck,
  pub cards: Vec<Card>,
}

/// A published deck with its snapshot cards
pub async fn get_community_deck(
  State(state): State<AppState>,
  Path(id): Path<i64>,
) -> AppResult<Json<CommunityDeckView>> {
  let conn = try_lock(&state.db)?;
  let deck = db::get_community_deck(&conn, id)?
    .ok_or_else(|| AppError::NotFound(format!("Community deck {} not found", id)))?;
  let cards = db::get_community_cards(&conn, id)?;
  Ok(Json(CommunityDeckView { deck, cards }))
}
