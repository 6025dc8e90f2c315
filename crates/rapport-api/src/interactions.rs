//! Handler for `POST /interactions`.
//!
//! Body: `{"user_id": "...", "message": "...", "context": [{"speaker": "user", "text": "..."}]}`.
//! `context` is optional, oldest line first. Returns the committed
//! relationship state.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Utc;
use rapport_core::{
  classifier::SentimentClassifier,
  sentiment::ContextMessage,
  state::RelationshipState,
  store::RelationshipStore,
};
use rapport_engine::Engine;
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct InteractionBody {
  pub user_id: String,
  pub message: String,
  #[serde(default)]
  pub context: Vec<ContextMessage>,
}

/// `POST /interactions`
pub async fn create<S, C>(
  State(engine): State<Arc<Engine<S, C>>>,
  Json(body): Json<InteractionBody>,
) -> Result<Json<RelationshipState>, ApiError>
where
  S: RelationshipStore,
  C: SentimentClassifier,
{
  let user_id = body.user_id.trim();
  if user_id.is_empty() {
    return Err(ApiError::BadRequest("user_id must not be empty".into()));
  }

  let state = engine
    .process_interaction(user_id, &body.message, &body.context, Utc::now())
    .await?;
  Ok(Json(state))
}
