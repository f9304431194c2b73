//! Card CRUD, flag updates and batch import.

use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::StatusCode,
};
use serde::Serialize;

use crate::db::{self, try_lock};
use crate::domain::{Card, CardDraft, CardFlagsPatch};
use crate::error::{AppError, AppResult};
use crate::services::batch::{self, BatchReport, MediaUpload, SavedMedia};
use crate::state::AppState;

use super::decks::deck_not_found;

fn card_not_found(id: i64) -> AppError {
  AppError::NotFound(format!("Card {} not found", id))
}

pub async fn list_cards(State(state): State<AppState>, Path(deck_id): Path<i64>) -> AppResult<Json<Vec<Card>>> {
  let conn = try_lock(&state.db)?;
  if db::get_deck(&conn, deck_id)?.is_none() {
    return Err(deck_not_found(deck_id));
  }
  Ok(Json(db::get_deck_cards(&conn, deck_id)?))
}

/// Append a card to the end of a deck
pub async fn create_card(
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
  Json(draft): Json<CardDraft>,
) -> AppResult<(StatusCode, Json<Card>)> {
  draft.validate().map_err(AppError::BadRequest)?;

  let conn = try_lock(&state.db)?;
  if db::get_deck(&conn, deck_id)?.is_none() {
    return Err(deck_not_found(deck_id));
  }
  let position = db::next_position(&conn, deck_id)?;
  let mut card = draft.into_card(deck_id, position);
  card.id = db::insert_card(&conn, &card)?;
  Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get_card(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Card>> {
  let conn = try_lock(&state.db)?;
  db::get_card_by_id(&conn, id)?.map(Json).ok_or_else(|| card_not_found(id))
}

pub async fn update_card(
  State(state): State<AppState>,
  Path(id): Path<i64>,
  Json(draft): Json<CardDraft>,
) -> AppResult<Json<Card>> {
  draft.validate().map_err(AppError::BadRequest)?;

  let conn = try_lock(&state.db)?;
  if !db::update_card(&conn, id, &draft)? {
    return Err(card_not_found(id));
  }
  db::get_card_by_id(&conn, id)?.map(Json).ok_or_else(|| card_not_found(id))
}

pub async fn delete_card(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
  let conn = try_lock(&state.db)?;
  if db::delete_card(&conn, id)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(card_not_found(id))
  }
}

/// Partial favorite/ignored update outside of a study session
pub async fn update_flags(
  State(state): State<AppState>,
  Path(id): Path<i64>,
  Json(patch): Json<CardFlagsPatch>,
) -> AppResult<Json<Card>> {
  let conn = try_lock(&state.db)?;
  if !db::update_card_flags(&conn, id, &patch)? {
    return Err(card_not_found(id));
  }
  db::get_card_by_id(&conn, id)?.map(Json).ok_or_else(|| card_not_found(id))
}

#[derive(Debug, Serialize)]
pub struct BatchImportResponse {
  pub media: BatchReport<SavedMedia>,
  pub cards: BatchReport<Card>,
}

/// Read the multipart body: `image-N`/`audio-N` file parts and one `cards` JSON part
async fn read_batch_parts(multipart: &mut Multipart) -> AppResult<(Vec<MediaUpload>, Vec<CardDraft>)> {
  let mut uploads = Vec::new();
  let mut drafts = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e)))?
  {
    let name = field.name().unwrap_or_default().to_string();
    if name == "cards" {
      let text = field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read cards: {}", e)))?;
      drafts = Some(serde_json::from_str::<Vec<CardDraft>>(&text)?);
    } else if name.starts_with("image-") || name.starts_with("audio-") {
      let file_name = field.file_name().map(String::from);
      let bytes = field
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| AppError::BadRequest(format!("Failed to read {}: {}", name, e)))?;
      uploads.push(MediaUpload { name, file_name, bytes });
    } else {
      tracing::debug!("Ignoring unexpected upload part {}", name);
    }
  }

  let drafts = drafts.ok_or_else(|| AppError::BadRequest("No cards part in upload".to_string()))?;
  Ok((uploads, drafts))
}

/// Bulk import. Media is saved first, then each card is created on its own;
/// the response lists successes and failures of both steps.
pub async fn batch_create_cards(
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
  mut multipart: Multipart,
) -> AppResult<Json<BatchImportResponse>> {
  {
    let conn = try_lock(&state.db)?;
    if db::get_deck(&conn, deck_id)?.is_none() {
      return Err(deck_not_found(deck_id));
    }
  }

  let (uploads, drafts) = read_batch_parts(&mut multipart).await?;
  let uploaded: Vec<String> = uploads.iter().map(|u| u.name.clone()).collect();

  let media = batch::save_media_batch(&state.media_dir, uploads).await;

  let conn = try_lock(&state.db)?;
  let cards = batch::create_cards(&conn, deck_id, drafts, &media.succeeded, &uploaded);
  Ok(Json(BatchImportResponse { media, cards }))
}
