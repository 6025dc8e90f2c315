//! Core types and pure functions for the Rapport relationship engine.
//!
//! This crate is free of HTTP and database dependencies. It turns
//! sentiment classifications into relationship-state transitions, and defines
//! the two collaborator traits ([`store::RelationshipStore`] and
//! [`classifier::SentimentClassifier`]) that the service layer is generic over.
//!
//! Every function that depends on time takes `now` as an argument; nothing in
//! this crate reads a clock.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod classifier;
pub mod decay;
pub mod error;
pub mod event;
pub mod familiarity;
pub mod keywords;
pub mod replay;
pub mod rupture;
pub mod scoring;
pub mod sentiment;
pub mod state;
pub mod store;
pub mod tier;

pub use error::{Error, Result};
