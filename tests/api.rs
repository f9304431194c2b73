// tests/api.rs

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{Value, json};
use tempfile::TempDir;

use flashy::{db, routes, state::AppState};

/// Server over a fresh database and media directory.
/// The TempDir must outlive the server.
fn spawn_app() -> (TestServer, TempDir) {
  let temp = TempDir::new().unwrap();
  let pool = db::init_db(&temp.path().join("flashy.db")).unwrap();
  let media_dir = temp.path().join("media");
  std::fs::create_dir_all(&media_dir).unwrap();

  let app = routes::app(AppState::new(pool, media_dir));
  (TestServer::new(app).unwrap(), temp)
}

async fn create_deck(server: &TestServer, name: &str) -> i64 {
  let response = server.post("/api/decks").json(&json!({ "name": name })).await;
  response.assert_status(StatusCode::CREATED);
  response.json::<Value>()["id"].as_i64().unwrap()
}

async fn create_classic(server: &TestServer, deck_id: i64, front: &str, back: &str) -> i64 {
  let response = server
    .post(&format!("/api/decks/{}/cards", deck_id))
    .json(&json!({ "front": front, "kind": { "type": "classic", "back": back } }))
    .await;
  response.assert_status(StatusCode::CREATED);
  response.json::<Value>()["id"].as_i64().unwrap()
}

async fn start(server: &TestServer, body: Value) -> Value {
  let response = server.post("/api/study").json(&body).await;
  response.assert_status(StatusCode::CREATED);
  response.json::<Value>()
}

#[tokio::test]
async fn health_check() {
  let (server, _temp) = spawn_app();
  let body = server.get("/api/health").await.json::<Value>();
  assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn deck_crud_roundtrip() {
  let (server, _temp) = spawn_app();
  let id = create_deck(&server, "Spanish").await;

  let deck = server.get(&format!("/api/decks/{}", id)).await.json::<Value>();
  assert_eq!(deck["name"], "Spanish");
  assert_eq!(deck["emoji"], "📚");

  let updated = server
    .put(&format!("/api/decks/{}", id))
    .json(&json!({ "name": "Spanish verbs", "difficulty": "advanced" }))
    .await
    .json::<Value>();
  assert_eq!(updated["name"], "Spanish verbs");
  assert_eq!(updated["difficulty"], "advanced");

  let list = server.get("/api/decks").await.json::<Vec<Value>>();
  assert_eq!(list.len(), 1);

  server
    .delete(&format!("/api/decks/{}", id))
    .await
    .assert_status(StatusCode::NO_CONTENT);
  server
    .get(&format!("/api/decks/{}", id))
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_deck_rejects_blank_name() {
  let (server, _temp) = spawn_app();
  let response = server.post("/api/decks").json(&json!({ "name": "   " })).await;
  response.assert_status(StatusCode::BAD_REQUEST);
  assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn card_crud_and_flags() {
  let (server, _temp) = spawn_app();
  let deck_id = create_deck(&server, "Geo").await;
  let card_id = create_classic(&server, deck_id, "Capital of Italy?", "Rome").await;

  let card = server
    .patch(&format!("/api/cards/{}/flags", card_id))
    .json(&json!({ "favorite": true }))
    .await
    .json::<Value>();
  assert_eq!(card["favorite"], true);
  assert_eq!(card["ignored"], false);

  let card = server
    .put(&format!("/api/cards/{}", card_id))
    .json(&json!({
      "front": "Capital of France?",
      "kind": { "type": "type_answer", "back": "Paris", "accepted_answers": ["paris"] }
    }))
    .await
    .json::<Value>();
  assert_eq!(card["kind"]["type"], "type_answer");

  let cards = server
    .get(&format!("/api/decks/{}/cards", deck_id))
    .await
    .json::<Vec<Value>>();
  assert_eq!(cards.len(), 1);

  server
    .delete(&format!("/api/cards/{}", card_id))
    .await
    .assert_status(StatusCode::NO_CONTENT);
  server
    .get(&format!("/api/cards/{}", card_id))
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn study_deck_to_summary_and_stats() {
  let (server, _temp) = spawn_app();
  let deck_id = create_deck(&server, "Capitals").await;
  create_classic(&server, deck_id, "Italy", "Rome").await;
  create_classic(&server, deck_id, "Spain", "Madrid").await;

  let state = start(&server, json!({ "source": { "kind": "deck", "id": deck_id } })).await;
  let sid = state["session_id"].as_str().unwrap().to_string();
  assert_eq!(state["phase"], "active");
  assert_eq!(state["total"], 2);
  assert_eq!(state["quiz"]["mode"], "flip");
  assert_eq!(state["quiz"]["front"], "Italy");

  let response = server
    .post(&format!("/api/study/{}/answer", sid))
    .json(&json!({ "kind": "self_report", "correct": true }))
    .await
    .json::<Value>();
  assert_eq!(response["feedback"]["correct"], true);
  assert_eq!(response["state"]["tally"]["correct"], 1);

  let response = server
    .post(&format!("/api/study/{}/answer", sid))
    .json(&json!({ "kind": "skip" }))
    .await
    .json::<Value>();
  let state = &response["state"];
  assert_eq!(state["phase"], "finished");
  assert_eq!(state["view"]["view"], "summary");
  assert_eq!(state["tally"]["skipped"], 1);
  assert_eq!(state["tally"]["studied"], 2);
  assert_eq!(state["summary"]["score_label"], "100%");
  assert_eq!(state["summary"]["exit"]["view"], "deck");

  let stats = server
    .get(&format!("/api/decks/{}/stats", deck_id))
    .await
    .json::<Value>();
  assert_eq!(stats["sessions"], 1);
  assert_eq!(stats["best_score"], 100);

  let history = server
    .get(&format!("/api/decks/{}/sessions", deck_id))
    .await
    .json::<Vec<Value>>();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0]["skipped"], 1);

  let view = server.delete(&format!("/api/study/{}", sid)).await.json::<Value>();
  assert_eq!(view, json!({ "view": "deck", "id": deck_id }));
  server
    .get(&format!("/api/study/{}", sid))
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ignored_cards_are_left_out() {
  let (server, _temp) = spawn_app();
  let deck_id = create_deck(&server, "Mixed").await;
  create_classic(&server, deck_id, "one", "1").await;
  let ignored = create_classic(&server, deck_id, "two", "2").await;
  create_classic(&server, deck_id, "three", "3").await;
  server
    .patch(&format!("/api/cards/{}/flags", ignored))
    .json(&json!({ "ignored": true }))
    .await
    .assert_status_ok();

  let state = start(&server, json!({ "source": { "kind": "deck", "id": deck_id } })).await;
  assert_eq!(state["total"], 2);

  let state = start(
    &server,
    json!({ "source": { "kind": "deck", "id": deck_id }, "options": { "favorites_only": true } }),
  )
  .await;
  assert_eq!(state["phase"], "empty");
  assert!(state.get("quiz").is_none());
}

#[tokio::test]
async fn typed_and_multiple_choice_grading() {
  let (server, _temp) = spawn_app();
  let deck_id = create_deck(&server, "Quiz").await;
  server
    .post(&format!("/api/decks/{}/cards", deck_id))
    .json(&json!({
      "front": "Capital of France?",
      "kind": { "type": "type_answer", "back": "Paris", "accepted_answers": ["paris", "PARIS "] }
    }))
    .await
    .assert_status(StatusCode::CREATED);
  server
    .post(&format!("/api/decks/{}/cards", deck_id))
    .json(&json!({
      "front": "Pick A and B",
      "kind": { "type": "multiple_choice", "options": ["C", "D"], "correct_answers": ["A", "B"] }
    }))
    .await
    .assert_status(StatusCode::CREATED);

  let state = start(&server, json!({ "source": { "kind": "deck", "id": deck_id } })).await;
  let sid = state["session_id"].as_str().unwrap().to_string();
  assert_eq!(state["quiz"]["mode"], "type_answer");

  // Wrong answer shape for a type-answer card
  server
    .post(&format!("/api/study/{}/answer", sid))
    .json(&json!({ "kind": "self_report", "correct": true }))
    .await
    .assert_status(StatusCode::BAD_REQUEST);

  let response = server
    .post(&format!("/api/study/{}/answer", sid))
    .json(&json!({ "kind": "typed", "text": " paris" }))
    .await
    .json::<Value>();
  assert_eq!(response["feedback"]["correct"], true);
  assert_eq!(response["state"]["quiz"]["mode"], "multiple_choice");
  assert_eq!(response["state"]["quiz"]["multi"], true);
  assert_eq!(response["state"]["quiz"]["choices"].as_array().unwrap().len(), 4);

  let response = server
    .post(&format!("/api/study/{}/answer", sid))
    .json(&json!({ "kind": "choices", "selected": ["A"] }))
    .await
    .json::<Value>();
  assert_eq!(response["feedback"]["correct"], false);
  assert_eq!(response["feedback"]["expected"], "A, B");
  assert_eq!(response["state"]["summary"]["score_label"], "50%");
}

#[tokio::test]
async fn favorite_toggle_inside_session_writes_through() {
  let (server, _temp) = spawn_app();
  let deck_id = create_deck(&server, "Flags").await;
  let card_id = create_classic(&server, deck_id, "q", "a").await;

  let state = start(&server, json!({ "source": { "kind": "deck", "id": deck_id } })).await;
  let sid = state["session_id"].as_str().unwrap().to_string();

  let toggle = server
    .post(&format!("/api/study/{}/favorite", sid))
    .json(&json!({ "card_id": card_id }))
    .await
    .json::<Value>();
  assert_eq!(toggle["status"], "applied");
  assert_eq!(toggle["value"], true);

  let state = server.get(&format!("/api/study/{}", sid)).await.json::<Value>();
  assert_eq!(state["current"]["favorite"], true);

  let card = server.get(&format!("/api/cards/{}", card_id)).await.json::<Value>();
  assert_eq!(card["favorite"], true);
}

#[tokio::test]
async fn finish_early_then_restart() {
  let (server, _temp) = spawn_app();
  let deck_id = create_deck(&server, "Restart").await;
  create_classic(&server, deck_id, "q1", "a1").await;
  create_classic(&server, deck_id, "q2", "a2").await;

  let state = start(&server, json!({ "source": { "kind": "deck", "id": deck_id } })).await;
  let sid = state["session_id"].as_str().unwrap().to_string();

  server
    .post(&format!("/api/study/{}/answer", sid))
    .json(&json!({ "kind": "self_report", "correct": false }))
    .await
    .assert_status_ok();

  let state = server.post(&format!("/api/study/{}/finish", sid)).await.json::<Value>();
  assert_eq!(state["phase"], "finished");
  assert_eq!(state["summary"]["summary"]["score"], 0);

  // Answers after finishing are rejected
  server
    .post(&format!("/api/study/{}/answer", sid))
    .json(&json!({ "kind": "skip" }))
    .await
    .assert_status(StatusCode::BAD_REQUEST);

  let state = server.post(&format!("/api/study/{}/restart", sid)).await.json::<Value>();
  assert_eq!(state["phase"], "active");
  assert_eq!(state["position"], 0);
  assert_eq!(state["tally"]["studied"], 0);
  assert!(state.get("summary").is_none());
}

#[tokio::test]
async fn continuous_shuffle_keeps_going() {
  let (server, _temp) = spawn_app();
  let deck_id = create_deck(&server, "Loop").await;
  create_classic(&server, deck_id, "q1", "a1").await;
  create_classic(&server, deck_id, "q2", "a2").await;

  let state = start(
    &server,
    json!({
      "source": { "kind": "deck", "id": deck_id },
      "options": { "order": "random", "continuous_shuffle": true }
    }),
  )
  .await;
  let sid = state["session_id"].as_str().unwrap().to_string();

  let mut last = Value::Null;
  for _ in 0..5 {
    last = server
      .post(&format!("/api/study/{}/answer", sid))
      .json(&json!({ "kind": "self_report", "correct": true }))
      .await
      .json::<Value>();
  }
  let state = &last["state"];
  assert_eq!(state["phase"], "active");
  assert_eq!(state["round"], 3);
  assert_eq!(state["position"], 1);
  assert_eq!(state["tally"]["correct"], 5);
}

#[tokio::test]
async fn timed_session_reports_countdown() {
  let (server, _temp) = spawn_app();
  let deck_id = create_deck(&server, "Timed").await;
  create_classic(&server, deck_id, "q1", "a1").await;

  let state = start(
    &server,
    json!({ "source": { "kind": "deck", "id": deck_id }, "options": { "timed": true } }),
  )
  .await;
  assert_eq!(state["remaining_secs"], 30);
}

#[tokio::test]
async fn publish_and_study_community_deck() {
  let (server, _temp) = spawn_app();
  let deck_id = create_deck(&server, "Shared").await;
  let card_id = create_classic(&server, deck_id, "q1", "a1").await;
  create_classic(&server, deck_id, "q2", "a2").await;

  let community = server.post(&format!("/api/decks/{}/publish", deck_id)).await;
  community.assert_status(StatusCode::CREATED);
  let community_id = community.json::<Value>()["id"].as_i64().unwrap();

  let preview = server
    .get(&format!("/api/community/{}", community_id))
    .await
    .json::<Value>();
  assert_eq!(preview["name"], "Shared");
  assert_eq!(preview["cards"].as_array().unwrap().len(), 2);

  let state = start(&server, json!({ "source": { "kind": "community", "id": community_id } })).await;
  let sid = state["session_id"].as_str().unwrap().to_string();
  let current = state["current"]["id"].as_i64().unwrap();

  // Temporary decks can't change cards
  server
    .post(&format!("/api/study/{}/favorite", sid))
    .json(&json!({ "card_id": current }))
    .await
    .assert_status(StatusCode::BAD_REQUEST);

  let state = server.post(&format!("/api/study/{}/finish", sid)).await.json::<Value>();
  assert!(state["summary"]["saved_session_id"].is_null());
  assert_eq!(state["summary"]["exit"]["view"], "community");

  let stats = server
    .get(&format!("/api/decks/{}/stats", deck_id))
    .await
    .json::<Value>();
  assert_eq!(stats["sessions"], 0);

  // The source card is untouched
  let card = server.get(&format!("/api/cards/{}", card_id)).await.json::<Value>();
  assert_eq!(card["favorite"], false);

  server
    .delete(&format!("/api/decks/{}/publish", deck_id))
    .await
    .assert_status(StatusCode::NO_CONTENT);
  server
    .get(&format!("/api/community/{}", community_id))
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn all_cards_session_exits_home() {
  let (server, _temp) = spawn_app();
  let a = create_deck(&server, "A").await;
  let b = create_deck(&server, "B").await;
  create_classic(&server, a, "qa", "aa").await;
  create_classic(&server, b, "qb", "ab").await;

  let state = start(&server, json!({ "source": { "kind": "all_cards" } })).await;
  assert_eq!(state["total"], 2);
  let sid = state["session_id"].as_str().unwrap().to_string();

  let view = server.delete(&format!("/api/study/{}", sid)).await.json::<Value>();
  assert_eq!(view, json!({ "view": "home" }));
}

#[tokio::test]
async fn batch_import_reports_partial_failure() {
  let (server, temp) = spawn_app();
  let deck_id = create_deck(&server, "Batch").await;

  let cards = json!([
    { "front": "cat", "kind": { "type": "classic", "back": "gato" }, "front_media": { "image": "image-0" } },
    { "front": "", "kind": { "type": "classic", "back": "x" } },
    { "front": "bad image", "kind": { "type": "classic", "back": "y" }, "front_media": { "image": "image-1" } },
    { "front": "dog", "kind": { "type": "classic", "back": "perro" } }
  ]);
  let form = MultipartForm::new()
    .add_part("image-0", Part::bytes(b"fake-png".to_vec()).file_name("cat.png").mime_type("image/png"))
    .add_part("image-1", Part::bytes(b"MZ".to_vec()).file_name("virus.exe"))
    .add_text("cards", cards.to_string());

  let report = server
    .post(&format!("/api/decks/{}/cards/batch", deck_id))
    .multipart(form)
    .await
    .json::<Value>();

  assert_eq!(report["media"]["succeeded"].as_array().unwrap().len(), 1);
  assert_eq!(report["media"]["failed"][0]["index"], 1);
  assert_eq!(report["cards"]["succeeded"].as_array().unwrap().len(), 2);
  let failed: Vec<i64> = report["cards"]["failed"]
    .as_array()
    .unwrap()
    .iter()
    .map(|f| f["index"].as_i64().unwrap())
    .collect();
  assert_eq!(failed, vec![1, 2]);

  let url = report["cards"]["succeeded"][0]["front_media"]["image"].as_str().unwrap();
  assert!(url.starts_with("/media/"));
  let file = url.trim_start_matches("/media/");
  assert!(temp.path().join("media").join(file).exists());

  let served = server.get(url).await;
  served.assert_status_ok();
  assert_eq!(served.as_bytes().as_ref(), b"fake-png");
}

#[tokio::test]
async fn unknown_resources_are_404() {
  let (server, _temp) = spawn_app();
  server.get("/api/decks/999").await.assert_status(StatusCode::NOT_FOUND);
  server.get("/api/decks/999/cards").await.assert_status(StatusCode::NOT_FOUND);
  server.get("/api/study/nope").await.assert_status(StatusCode::NOT_FOUND);
  server
    .post("/api/decks/999/publish")
    .await
    .assert_status(StatusCode::NOT_FOUND);
}
