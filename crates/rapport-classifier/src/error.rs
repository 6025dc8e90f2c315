//! Error type for `rapport-classifier`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("classifier request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("classifier returned HTTP {status}: {body}")]
  Status { status: u16, body: String },

  #[error("invalid classifier JSON: {0}")]
  Json(#[from] serde_json::Error),

  /// The response was well-formed JSON but not a usable verdict.
  #[error("unusable classifier response: {0}")]
  Parse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
