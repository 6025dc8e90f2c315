//! JSON REST API for Rapport.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any
//! [`RelationshipStore`] and [`SentimentClassifier`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rapport_api::api_router(engine.clone()))
//! ```

pub mod decay;
pub mod error;
pub mod interactions;
pub mod relationships;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use rapport_core::{classifier::SentimentClassifier, store::RelationshipStore};
use rapport_engine::Engine;

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(engine: Arc<Engine<S, C>>) -> Router<()>
where
  S: RelationshipStore + 'static,
  C: SentimentClassifier + 'static,
{
  Router::new()
    // Chat turns
    .route("/interactions", post(interactions::create::<S, C>))
    // Relationships
    .route("/relationships", get(relationships::list::<S, C>))
    .route("/relationships/{user_id}", get(relationships::get_one::<S, C>))
    .route("/relationships/{user_id}/events", get(relationships::events::<S, C>))
    .route("/relationships/{user_id}/audit", get(relationships::audit::<S, C>))
    // Decay
    .route("/decay/run", post(decay::run::<S, C>))
    .with_state(engine)
}

#[cfg(test)]
mod tests;
