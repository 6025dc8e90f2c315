//! Error type for `rapport-engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The classifier failed or missed its deadline. Never fatal for a chat
  /// turn: the engine logs it and applies the fallback policy.
  #[error("sentiment classification unavailable: {0}")]
  ClassificationUnavailable(String),

  /// Every commit attempt lost the version race. Transient; the caller may
  /// retry the whole interaction.
  #[error("concurrent update conflict for user {user_id} after {attempts} attempts")]
  ConcurrentUpdateConflict { user_id: String, attempts: u32 },

  /// A computed state left its documented domain. Always a defect.
  #[error(transparent)]
  InvariantViolation(#[from] rapport_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("no relationship for user {0}")]
  NotFound(String),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
