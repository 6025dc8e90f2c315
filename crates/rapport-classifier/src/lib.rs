//! Hosted sentiment classification for Rapport.
//!
//! [`HttpClassifier`] implements [`rapport_core::classifier::SentimentClassifier`]
//! against any OpenAI-compatible `/chat/completions` endpoint. The model is
//! asked for a single JSON object which is parsed into a
//! [`Classification`](rapport_core::sentiment::Classification).
//!
//! Timeouts are not enforced here; the engine wraps every call in its own
//! deadline and falls back when this classifier is slow or failing.

pub mod error;
mod http;

pub use error::{Error, Result};
pub use http::{parse_completion, parse_verdict, HttpClassifier, HttpClassifierConfig};
