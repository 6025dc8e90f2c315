//! Handler for `POST /decay/run`.
//!
//! Runs one decay tick immediately. An optional `?now=<RFC 3339>` query
//! parameter evaluates the tick at a different instant, which is handy for
//! backfills and for exercising decay without waiting a week.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{DateTime, Utc};
use rapport_core::{classifier::SentimentClassifier, store::RelationshipStore};
use rapport_engine::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RunParams {
  pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunResponse {
  /// Relationships whose score changed during this tick.
  pub updated: usize,
}

/// `POST /decay/run[?now=<timestamp>]`
pub async fn run<S, C>(
  State(engine): State<Arc<Engine<S, C>>>,
  Query(params): Query<RunParams>,
) -> Result<Json<RunResponse>, ApiError>
where
  S: RelationshipStore,
  C: SentimentClassifier,
{
  let now = params.now.unwrap_or_else(Utc::now);
  let updated = engine.run_decay_tick(now).await?;
  Ok(Json(RunResponse { updated }))
}
