//! Study session endpoints.
//!
//! A session lives in the registry between requests. Every handler runs its
//! session work inside one registry callback so the session is never seen
//! half-updated.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{StudyOptions, StudySource};
use crate::error::{AppError, AppResult};
use crate::navigation::View;
use crate::services::study::{self as study_service, CardFlag, FlagToggle, Settlement};
use crate::session::SessionEntry;
use crate::state::AppState;
use crate::study::{Answer, Feedback, Phase, Quiz, SubmitError, Tally};

#[derive(Debug, Deserialize)]
pub struct StartRequest {
  pub source: StudySource,
  #[serde(default)]
  pub options: StudyOptions,
}

/// Learner flags of the card on screen
#[derive(Debug, Serialize)]
pub struct CurrentCard {
  pub id: i64,
  pub favorite: bool,
  pub ignored: bool,
}

#[derive(Debug, Serialize)]
pub struct SummaryView {
  #[serde(flatten)]
  pub settlement: Settlement,
  pub score_label: String,
  pub elapsed_label: String,
  /// Where "leave" goes; "restart" is always offered too
  pub exit: View,
}

/// Everything the client needs to draw the session
#[derive(Debug, Serialize)]
pub struct StudyState {
  pub session_id: String,
  pub source: StudySource,
  pub options: StudyOptions,
  pub phase: Phase,
  pub view: View,
  pub position: usize,
  pub total: usize,
  pub round: u32,
  pub tally: Tally,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub remaining_secs: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub current: Option<CurrentCard>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub quiz: Option<Quiz>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub summary: Option<SummaryView>,
}

fn study_state(session_id: &str, entry: &SessionEntry) -> StudyState {
  let session = &entry.session;
  let view = match session.phase() {
    Phase::Finished => View::Summary {
      session_id: session_id.to_string(),
    },
    Phase::Empty | Phase::Active => View::Study {
      session_id: session_id.to_string(),
    },
  };
  let summary = entry.settlement.as_ref().map(|settlement| SummaryView {
    score_label: settlement.summary.score_label(),
    elapsed_label: settlement.summary.elapsed_label(),
    settlement: settlement.clone(),
    exit: session.exit_view(),
  });

  StudyState {
    session_id: session_id.to_string(),
    source: session.source(),
    options: *session.options(),
    phase: session.phase(),
    view,
    position: session.position(),
    total: session.len(),
    round: session.rounds() + 1,
    tally: session.tally(),
    remaining_secs: session.remaining_secs(),
    current: session.current().map(|c| CurrentCard {
      id: c.id,
      favorite: c.favorite,
      ignored: c.ignored,
    }),
    quiz: session.quiz().cloned(),
    summary,
  }
}

/// Run `f` on a registered session, mapping a missing ID to 404
fn with_session<T>(
  state: &AppState,
  session_id: &str,
  f: impl FnOnce(&mut SessionEntry) -> AppResult<T>,
) -> AppResult<T> {
  state
    .sessions
    .with_entry(session_id, f)?
    .unwrap_or_else(|| Err(AppError::NotFound(format!("Study session {} not found", session_id))))
}

/// Start the countdown task for a timed session that doesn't have one running
fn ensure_countdown(state: &AppState, session_id: &str, entry: &mut SessionEntry) {
  if entry.session.options().timed && entry.session.phase() == Phase::Active && entry.timer.is_none() {
    entry.timer = Some(study_service::spawn_countdown(
      state.sessions.clone(),
      state.store.clone(),
      session_id.to_string(),
    ));
  }
}

pub async fn start_study(
  State(state): State<AppState>,
  Json(request): Json<StartRequest>,
) -> AppResult<(StatusCode, Json<StudyState>)> {
  let session = {
    let mut rng = rand::rng();
    study_service::start_session(&state.store, request.source, request.options, Utc::now(), &mut rng)?
  };
  let session_id = state.sessions.insert(session)?;
  tracing::info!("Study session {} started over {:?}", session_id, request.source);

  let body = with_session(&state, &session_id, |entry| {
    ensure_countdown(&state, &session_id, entry);
    Ok(study_state(&session_id, entry))
  })?;
  Ok((StatusCode::CREATED, Json(body)))
}

pub async fn get_study(State(state): State<AppState>, Path(session_id): Path<String>) -> AppResult<Json<StudyState>> {
  with_session(&state, &session_id, |entry| Ok(study_state(&session_id, entry))).map(Json)
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
  pub feedback: Feedback,
  pub state: StudyState,
}

pub async fn answer(
  State(state): State<AppState>,
  Path(session_id): Path<String>,
  Json(answer): Json<Answer>,
) -> AppResult<Json<AnswerResponse>> {
  with_session(&state, &session_id, |entry| {
    let mut rng = rand::rng();
    let feedback = entry
      .session
      .submit(&answer, Utc::now(), &mut rng)
      .map_err(|e: SubmitError| AppError::BadRequest(e.to_string()))?;
    study_service::settle(entry, &state.store, study_service::local_hour());
    Ok(AnswerResponse {
      feedback,
      state: study_state(&session_id, entry),
    })
  })
  .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct FlagRequest {
  pub card_id: i64,
}

async fn toggle(state: AppState, session_id: String, card_id: i64, flag: CardFlag) -> AppResult<Json<FlagToggle>> {
  with_session(&state, &session_id, |entry| {
    study_service::toggle_flag(&mut entry.session, &state.store, card_id, flag)
  })
  .map(Json)
}

pub async fn toggle_favorite(
  State(state): State<AppState>,
  Path(session_id): Path<String>,
  Json(request): Json<FlagRequest>,
) -> AppResult<Json<FlagToggle>> {
  toggle(state, session_id, request.card_id, CardFlag::Favorite).await
}

pub async fn toggle_ignore(
  State(state): State<AppState>,
  Path(session_id): Path<String>,
  Json(request): Json<FlagRequest>,
) -> AppResult<Json<FlagToggle>> {
  toggle(state, session_id, request.card_id, CardFlag::Ignored).await
}

/// Stop early and show the summary
pub async fn finish(State(state): State<AppState>, Path(session_id): Path<String>) -> AppResult<Json<StudyState>> {
  with_session(&state, &session_id, |entry| {
    entry.session.finish(Utc::now());
    study_service::settle(entry, &state.store, study_service::local_hour());
    Ok(study_state(&session_id, entry))
  })
  .map(Json)
}

/// Same source and options, fresh counters
pub async fn restart(State(state): State<AppState>, Path(session_id): Path<String>) -> AppResult<Json<StudyState>> {
  with_session(&state, &session_id, |entry| {
    let mut rng = rand::rng();
    entry.session.restart(Utc::now(), &mut rng);
    entry.settlement = None;
    ensure_countdown(&state, &session_id, entry);
    Ok(study_state(&session_id, entry))
  })
  .map(Json)
}

/// Leave the session. An unfinished session is discarded without being recorded.
pub async fn exit(State(state): State<AppState>, Path(session_id): Path<String>) -> AppResult<Json<View>> {
  let entry = state
    .sessions
    .remove(&session_id)?
    .ok_or_else(|| AppError::NotFound(format!("Study session {} not found", session_id)))?;
  tracing::debug!("Study session {} closed in phase {:?}", session_id, entry.session.phase());
  Ok(Json(entry.session.exit_view()))
}
