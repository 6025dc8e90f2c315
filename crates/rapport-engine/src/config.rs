use serde::{Deserialize, Serialize};

/// What to do with a message the hosted classifier could not judge in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
  /// Classify locally with the keyword heuristics.
  #[default]
  Keyword,
  /// Record the interaction with zero deltas as a `system` event.
  Neutral,
}

/// Tunables for [`Engine`](crate::Engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Deadline for one classifier call.
  pub classifier_timeout_ms: u64,
  /// Read-compute-commit attempts before giving up on a version conflict.
  pub max_commit_attempts:   u32,
  pub fallback:              FallbackPolicy,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      classifier_timeout_ms: 2_000,
      max_commit_attempts:   3,
      fallback:              FallbackPolicy::Keyword,
    }
  }
}
