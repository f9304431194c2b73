use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, patch, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config;
use crate::handlers::{self, cards, community, decks, stats, study};
use crate::state::AppState;

/// Room for a batch of maximum-size media files plus the card definitions
const BATCH_BODY_LIMIT: usize = 16 * config::MAX_MEDIA_BYTES;

/// Assembles the application router.
///
/// Everything lives under `/api` except uploaded media, which is served
/// from the media directory at `/media`.
pub fn app(state: AppState) -> Router {
  let deck_routes = Router::new()
    .route("/", get(decks::list_decks).post(decks::create_deck))
    .route(
      "/{id}",
      get(decks::get_deck).put(decks::update_deck).delete(decks::delete_deck),
    )
    .route("/{id}/publish", post(decks::publish_deck).delete(decks::unpublish_deck))
    .route("/{id}/cards", get(cards::list_cards).post(cards::create_card))
    .route(
      "/{id}/cards/batch",
      post(cards::batch_create_cards).layer(DefaultBodyLimit::max(BATCH_BODY_LIMIT)),
    )
    .route("/{id}/sessions", get(stats::deck_sessions))
    .route("/{id}/stats", get(stats::deck_stats));

  let card_routes = Router::new()
    .route(
      "/{id}",
      get(cards::get_card).put(cards::update_card).delete(cards::delete_card),
    )
    .route("/{id}/flags", patch(cards::update_flags));

  let study_routes = Router::new()
    .route("/", post(study::start_study))
    .route("/{sid}", get(study::get_study).delete(study::exit))
    .route("/{sid}/answer", post(study::answer))
    .route("/{sid}/favorite", post(study::toggle_favorite))
    .route("/{sid}/ignore", post(study::toggle_ignore))
    .route("/{sid}/finish", post(study::finish))
    .route("/{sid}/restart", post(study::restart));

  let api = Router::new()
    .route("/health", get(handlers::health))
    .nest("/decks", deck_routes)
    .nest("/cards", card_routes)
    .route("/community/{id}", get(community::get_community_deck))
    .nest("/study", study_routes)
    .route("/achievements", get(stats::achievements));

  let media = ServeDir::new(&state.media_dir);

  Router::new()
    .nest("/api", api)
    .nest_service("/media", media)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
