//! The Rapport service layer.
//!
//! [`Engine`] ties a [`RelationshipStore`](rapport_core::store::RelationshipStore)
//! and a [`SentimentClassifier`](rapport_core::classifier::SentimentClassifier)
//! together: it classifies each chat turn under a deadline, serialises writes
//! per user, and commits every transition through the store's optimistic
//! version check. [`spawn_decay_scheduler`] runs idle-decay in the background.

mod config;
mod engine;
mod locks;
mod scheduler;

pub mod error;

pub use config::{EngineConfig, FallbackPolicy};
pub use engine::Engine;
pub use error::{Error, Result};
pub use scheduler::spawn_decay_scheduler;
