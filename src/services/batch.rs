//! Bulk card import with media uploads.
//!
//! Every item succeeds or fails on its own. A batch never aborts because one
//! item failed; the report lists what went through and why the rest didn't.

use rusqlite::Connection;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

use crate::config;
use crate::db;
use crate::domain::{Card, CardDraft, Media};

/// Extensions accepted for uploaded media
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "mp3", "ogg", "wav", "m4a"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
  pub index: usize,
  pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport<T> {
  pub succeeded: Vec<T>,
  pub failed: Vec<BatchFailure>,
}

impl<T> Default for BatchReport<T> {
  fn default() -> Self {
    Self {
      succeeded: Vec::new(),
      failed: Vec::new(),
    }
  }
}

impl<T> BatchReport<T> {
  fn fail(&mut self, index: usize, reason: impl Into<String>) {
    self.failed.push(BatchFailure {
      index,
      reason: reason.into(),
    });
  }
}

/// One uploaded file, keyed by the multipart part name it arrived under
#[derive(Debug, Clone)]
pub struct MediaUpload {
  pub name: String,
  pub file_name: Option<String>,
  pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedMedia {
  pub index: usize,
  pub name: String,
  /// Path under `/media` the file is served from
  pub url: String,
}

fn extension_of(upload: &MediaUpload) -> Result<String, String> {
  let ext = upload
    .file_name
    .as_deref()
    .and_then(|f| Path::new(f).extension())
    .and_then(|e| e.to_str())
    .map(|e| e.to_lowercase())
    .ok_or_else(|| format!("{}: file has no extension", upload.name))?;

  if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
    Ok(ext)
  } else {
    Err(format!("{}: unsupported file type .{}", upload.name, ext))
  }
}

fn check_upload(upload: &MediaUpload) -> Result<String, String> {
  if upload.bytes.is_empty() {
    return Err(format!("{}: file is empty", upload.name));
  }
  if upload.bytes.len() > config::MAX_MEDIA_BYTES {
    return Err(format!(
      "{}: file exceeds {} MB",
      upload.name,
      config::MAX_MEDIA_BYTES / (1024 * 1024)
    ));
  }
  extension_of(upload)
}

/// Random stored file name, so uploads never collide or escape the media dir
fn stored_name(ext: &str) -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  let stem: String = (0..24)
    .map(|_| {
      let idx = rng.random_range(0..36u8);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect();
  format!("{}.{}", stem, ext)
}

/// Write all uploads into `dir` concurrently.
pub async fn save_media_batch(dir: &Path, uploads: Vec<MediaUpload>) -> BatchReport<SavedMedia> {
  let mut report = BatchReport::default();
  let mut pending = BTreeSet::new();
  let mut tasks = JoinSet::new();

  for (index, upload) in uploads.into_iter().enumerate() {
    let ext = match check_upload(&upload) {
      Ok(ext) => ext,
      Err(reason) => {
        report.fail(index, reason);
        continue;
      }
    };

    let file_name = stored_name(&ext);
    let path: PathBuf = dir.join(&file_name);
    pending.insert(index);
    tasks.spawn(async move {
      let result = tokio::fs::write(&path, &upload.bytes)
        .await
        .map(|_| SavedMedia {
          index,
          name: upload.name.clone(),
          url: format!("/media/{}", file_name),
        })
        .map_err(|e| format!("{}: {}", upload.name, e));
      (index, result)
    });
  }

  while let Some(joined) = tasks.join_next().await {
    match joined {
      Ok((index, Ok(saved))) => {
        pending.remove(&index);
        report.succeeded.push(saved);
      }
      Ok((index, Err(reason))) => {
        pending.remove(&index);
        tracing::warn!("Media upload failed: {}", reason);
        report.fail(index, reason);
      }
      Err(e) => tracing::error!("Media upload task failed: {}", e),
    }
  }

  // Tasks that panicked never reported back
  for index in pending {
    report.fail(index, "upload did not complete");
  }

  report.succeeded.sort_by_key(|s| s.index);
  report.failed.sort_by_key(|f| f.index);
  report
}

/// Swap a part-name reference (e.g. "image-0") for the saved file's URL.
///
/// Values that aren't part references (plain URLs) are left alone.
fn resolve_ref(value: &mut Option<String>, saved: &HashMap<&str, &str>, uploaded: &[String]) -> Result<(), String> {
  let Some(reference) = value.as_deref() else {
    return Ok(());
  };
  if let Some(url) = saved.get(reference) {
    *value = Some(url.to_string());
    return Ok(());
  }
  if uploaded.iter().any(|n| n == reference) {
    return Err(format!("media {} failed to upload", reference));
  }
  if reference.starts_with("image-") || reference.starts_with("audio-") {
    return Err(format!("media {} was not uploaded", reference));
  }
  Ok(())
}

fn resolve_media(media: &mut Media, saved: &HashMap<&str, &str>, uploaded: &[String]) -> Result<(), String> {
  resolve_ref(&mut media.image, saved, uploaded)?;
  resolve_ref(&mut media.audio, saved, uploaded)
}

/// Insert `drafts` into a deck, one at a time.
///
/// `uploaded` lists every media part name the request carried, so a card
/// pointing at an upload that failed is reported rather than created without
/// its media.
pub fn create_cards(
  conn: &Connection,
  deck_id: i64,
  drafts: Vec<CardDraft>,
  media: &[SavedMedia],
  uploaded: &[String],
) -> BatchReport<Card> {
  let saved: HashMap<&str, &str> = media.iter().map(|m| (m.name.as_str(), m.url.as_str())).collect();
  let mut report = BatchReport::default();

  for (index, mut draft) in drafts.into_iter().enumerate() {
    let prepared = draft
      .validate()
      .and_then(|_| resolve_media(&mut draft.front_media, &saved, uploaded))
      .and_then(|_| resolve_media(&mut draft.back_media, &saved, uploaded));
    if let Err(reason) = prepared {
      report.fail(index, reason);
      continue;
    }

    let inserted = db::next_position(conn, deck_id).and_then(|position| {
      let mut card = draft.into_card(deck_id, position);
      card.id = db::insert_card(conn, &card)?;
      Ok(card)
    });
    match inserted {
      Ok(card) => report.succeeded.push(card),
      Err(e) => {
        tracing::warn!("Batch card {} for deck {} failed: {}", index, deck_id, e);
        report.fail(index, "could not save card");
      }
    }
  }

  tracing::info!(
    "Batch import into deck {}: {} created, {} failed",
    deck_id,
    report.succeeded.len(),
    report.failed.len()
  );
  report
}
