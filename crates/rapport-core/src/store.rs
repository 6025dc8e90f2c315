//! The `RelationshipStore` trait: the engine's single persistence boundary.
//!
//! The trait is implemented by storage backends (e.g. `rapport-store-sqlite`).
//! Every engine operation is one read plus one [`RelationshipStore::commit`].

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  event::RelationshipEvent,
  state::{RelationshipState, Transition},
};

/// The result of a transactional write.
#[derive(Debug, Clone)]
pub enum CommitOutcome {
  /// The new state and all its events were written atomically.
  Committed(RelationshipState),
  /// The row moved on since the transition's base was read (or, for a first
  /// write, another writer created the row). Nothing was written.
  Conflict,
}

/// Abstraction over a relationship store backend.
///
/// States are written only through [`commit`](Self::commit); events are
/// append-only and are never updated or deleted.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RelationshipStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve the state for `user_id`. Returns `None` if the user has never
  /// interacted.
  fn get_relationship<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<RelationshipState>, Self::Error>> + Send + 'a;

  /// List every stored state.
  fn list_relationships(
    &self,
  ) -> impl Future<Output = Result<Vec<RelationshipState>, Self::Error>> + Send + '_;

  /// States whose last interaction is strictly before `cutoff` and whose score
  /// is above the decay floor.
  fn list_idle(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<RelationshipState>, Self::Error>> + Send + '_;

  /// The full event log for a relationship in creation order.
  fn list_events(
    &self,
    relationship_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RelationshipEvent>, Self::Error>> + Send + '_;

  /// Write the transition's state and append its events in one transaction,
  /// guarded by `transition.base_version`.
  ///
  /// A version mismatch is reported as [`CommitOutcome::Conflict`], not as an
  /// error. Either everything is written or nothing is.
  fn commit(
    &self,
    transition: Transition,
  ) -> impl Future<Output = Result<CommitOutcome, Self::Error>> + Send + '_;
}
