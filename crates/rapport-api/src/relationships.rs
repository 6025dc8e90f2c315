//! Handlers for `/relationships` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/relationships` | All states, ordered by user id |
//! | `GET`  | `/relationships/{user_id}` | 404 if the user never interacted |
//! | `GET`  | `/relationships/{user_id}/events` | Event log in creation order |
//! | `GET`  | `/relationships/{user_id}/audit` | Replay of the log against the state |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use rapport_core::{
  classifier::SentimentClassifier,
  event::RelationshipEvent,
  replay::AuditReport,
  state::RelationshipState,
  store::RelationshipStore,
};
use rapport_engine::Engine;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /relationships`
pub async fn list<S, C>(
  State(engine): State<Arc<Engine<S, C>>>,
) -> Result<Json<Vec<RelationshipState>>, ApiError>
where
  S: RelationshipStore,
  C: SentimentClassifier,
{
  Ok(Json(engine.list().await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /relationships/{user_id}`
pub async fn get_one<S, C>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(user_id): Path<String>,
) -> Result<Json<RelationshipState>, ApiError>
where
  S: RelationshipStore,
  C: SentimentClassifier,
{
  Ok(Json(engine.get(&user_id).await?))
}

// ─── Events ───────────────────────────────────────────────────────────────────

/// `GET /relationships/{user_id}/events`
pub async fn events<S, C>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(user_id): Path<String>,
) -> Result<Json<Vec<RelationshipEvent>>, ApiError>
where
  S: RelationshipStore,
  C: SentimentClassifier,
{
  Ok(Json(engine.events(&user_id).await?))
}

// ─── Audit ────────────────────────────────────────────────────────────────────

/// `GET /relationships/{user_id}/audit`
pub async fn audit<S, C>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(user_id): Path<String>,
) -> Result<Json<AuditReport>, ApiError>
where
  S: RelationshipStore,
  C: SentimentClassifier,
{
  Ok(Json(engine.audit(&user_id).await?))
}
