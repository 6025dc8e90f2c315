//! The `SentimentClassifier` trait: the narrow seam to the external
//! classifier collaborator.
//!
//! Implemented by `rapport-classifier` (a hosted LLM) and by
//! [`crate::keywords::KeywordClassifier`] (the offline fallback). The engine
//! wraps every call in a timeout; implementations need not enforce one.

use std::future::Future;

use crate::sentiment::{Classification, ContextMessage};

pub trait SentimentClassifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Classify `message` given a short window of `recent` conversation,
  /// oldest first.
  fn classify<'a>(
    &'a self,
    message: &'a str,
    recent: &'a [ContextMessage],
  ) -> impl Future<Output = Result<Classification, Self::Error>> + Send + 'a;
}
