//! Router tests over an in-memory store and the keyword classifier.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use rapport_core::keywords::KeywordClassifier;
use rapport_engine::{Engine, EngineConfig};
use rapport_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let engine = Engine::new(store, KeywordClassifier, EngineConfig::default());
  api_router(Arc::new(engine))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

async fn interact(app: &Router, user_id: &str, message: &str) -> (StatusCode, Value) {
  send(app, "POST", "/interactions", Some(json!({ "user_id": user_id, "message": message })))
    .await
}

// ─── Interactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn interaction_returns_the_new_state() {
  let app = app().await;
  let (status, state) = interact(&app, "alice", "I love talking to you, thank you!").await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(state["user_id"], "alice");
  assert_eq!(state["relationship_tier"], "acquaintance");
  assert_eq!(state["familiarity_stage"], "early");
  assert_eq!(state["total_interactions"], 1);
  assert_eq!(state["version"], 1);
  assert!(state["relationship_score"].as_f64().unwrap() > 0.0);
  assert!(state["dimensions"]["warmth"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn interaction_accepts_context() {
  let app = app().await;
  let body = json!({
    "user_id": "bob",
    "message": "haha you're the best",
    "context": [
      { "speaker": "character", "text": "Want to hear a joke?" },
      { "speaker": "user", "text": "sure" },
    ],
  });
  let (status, state) = send(&app, "POST", "/interactions", Some(body)).await;
  assert_eq!(status, StatusCode::OK);
  assert!(state["dimensions"]["playfulness"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn blank_user_id_is_rejected() {
  let app = app().await;
  let (status, body) = interact(&app, "   ", "hello").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("user_id"));
}

// ─── Relationships ───────────────────────────────────────────────────────────

#[tokio::test]
async fn get_unknown_user_is_404() {
  let app = app().await;
  for uri in [
    "/relationships/ghost",
    "/relationships/ghost/events",
    "/relationships/ghost/audit",
  ] {
    let (status, body) = send(&app, "GET", uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    assert!(body["error"].is_string());
  }
}

#[tokio::test]
async fn list_get_events_and_audit() {
  let app = app().await;
  interact(&app, "carol", "this is great").await;
  interact(&app, "carol", "you are useless and I hate this").await;
  interact(&app, "dave", "hello there").await;

  let (status, all) = send(&app, "GET", "/relationships", None).await;
  assert_eq!(status, StatusCode::OK);
  let users: Vec<_> = all.as_array().unwrap().iter().map(|s| s["user_id"].clone()).collect();
  assert_eq!(users, [json!("carol"), json!("dave")]);

  let (status, carol) = send(&app, "GET", "/relationships/carol", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(carol["total_interactions"], 2);
  assert_eq!(carol["negative_interactions"], 1);

  let (status, events) = send(&app, "GET", "/relationships/carol/events", None).await;
  assert_eq!(status, StatusCode::OK);
  let events = events.as_array().unwrap();
  assert_eq!(events.len(), 2);
  assert_eq!(events[0]["event_type"], "positive");
  assert_eq!(events[0]["source"], "chat");
  assert_eq!(events[1]["sentiment"], "negative");
  assert!(events[0]["sequence"].as_i64() < events[1]["sequence"].as_i64());

  let (status, report) = send(&app, "GET", "/relationships/carol/audit", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["consistent"], true);
  assert_eq!(report["event_count"], 2);
  assert_eq!(report["stored_score"], report["replayed_score"]);
}

// ─── Decay ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn decay_run_reports_updated_rows() {
  let app = app().await;
  interact(&app, "erin", "thank you, this is wonderful!").await;

  let (status, body) = send(&app, "POST", "/decay/run", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["updated"], 0);

  let later = (chrono::Utc::now() + chrono::Duration::days(10))
    .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
  let uri = format!("/decay/run?now={later}");
  let (status, body) = send(&app, "POST", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["updated"], 1);

  let (_, body) = send(&app, "POST", &uri, None).await;
  assert_eq!(body["updated"], 0);

  let (_, events) = send(&app, "GET", "/relationships/erin/events", None).await;
  let last = events.as_array().unwrap().last().unwrap().clone();
  assert_eq!(last["source"], "decay");
  assert_eq!(last["sentiment"], Value::Null);
}
