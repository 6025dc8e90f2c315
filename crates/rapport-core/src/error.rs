//! Error types for `rapport-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A computed value left its documented domain. The clamp logic makes this
  /// unreachable; observing it means the engine is defective.
  #[error("invariant violated for user {user_id}: {detail}")]
  InvariantViolation { user_id: String, detail: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
