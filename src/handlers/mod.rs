//! JSON API handlers, one module per resource.

pub mod cards;
pub mod community;
pub mod decks;
pub mod stats;
pub mod study;

use axum::Json;
use serde_json::{Value, json};

/// Liveness probe
pub async fn health() -> Json<Value> {
  Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
