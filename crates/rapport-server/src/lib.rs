//! HTTP server wiring for Rapport.
//!
//! Loads [`ServerConfig`], picks a classifier, and mounts the
//! [`rapport_api`] router with request tracing. The binary in `main.rs` is a
//! thin shell around these pieces.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, routing::get};
use config::{ConfigError, Environment, File, FileFormat};
use rapport_classifier::{HttpClassifier, HttpClassifierConfig};
use rapport_core::{
  classifier::SentimentClassifier,
  keywords::KeywordClassifier,
  sentiment::{Classification, ContextMessage},
};
use rapport_engine::{Engine, EngineConfig};
use rapport_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered under
/// `RAPPORT_*` environment variables (`__` separates nested keys, e.g.
/// `RAPPORT_ENGINE__CLASSIFIER_TIMEOUT_MS`).
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  /// Hosted classifier; keyword heuristics are used when absent.
  #[serde(default)]
  pub classifier:          Option<HttpClassifierConfig>,
  #[serde(default)]
  pub engine:              EngineConfig,
  #[serde(default = "default_decay_interval_secs")]
  pub decay_interval_secs: u64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/rapport/rapport.db") }

fn default_decay_interval_secs() -> u64 { 3600 }

/// Read `path` (if it exists) and the process environment.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
  build_config(
    File::from(path).required(false),
    Environment::with_prefix("RAPPORT")
      .prefix_separator("_")
      .separator("__")
      .try_parsing(true),
  )
}

fn build_config<F>(file: F, env: Environment) -> Result<ServerConfig, ConfigError>
where
  F: config::Source + Send + Sync + 'static,
{
  config::Config::builder()
    .add_source(file)
    .add_source(env)
    .build()?
    .try_deserialize()
}

/// Parse a TOML document on its own, without the environment layer.
pub fn parse_config(toml: &str) -> Result<ServerConfig, ConfigError> {
  config::Config::builder()
    .add_source(File::from_str(toml, FileFormat::Toml))
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Classifier selection ─────────────────────────────────────────────────────

/// The classifier chosen at startup.
#[derive(Debug, Clone)]
pub enum Classifier {
  Hosted(HttpClassifier),
  Keywords(KeywordClassifier),
}

impl Classifier {
  pub fn from_config(config: Option<HttpClassifierConfig>) -> Self {
    match config {
      Some(c) => Self::Hosted(HttpClassifier::new(c)),
      None => Self::Keywords(KeywordClassifier),
    }
  }
}

impl SentimentClassifier for Classifier {
  type Error = rapport_classifier::Error;

  async fn classify<'a>(
    &'a self,
    message: &'a str,
    recent: &'a [ContextMessage],
  ) -> Result<Classification, Self::Error> {
    match self {
      Classifier::Hosted(http) => http.classify(message, recent).await,
      Classifier::Keywords(keywords) => Ok(keywords.classify_text(message)),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub type AppEngine = Engine<SqliteStore, Classifier>;

/// The full application: the REST API at the root, a liveness probe, and
/// per-request tracing.
pub fn app(engine: Arc<AppEngine>) -> Router {
  rapport_api::api_router(engine)
    .route("/healthz", get(|| async { "ok" }))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use config::Map;
  use rapport_engine::FallbackPolicy;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = parse_config("").unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.decay_interval_secs, 3600);
    assert!(cfg.classifier.is_none());
    assert_eq!(cfg.engine.max_commit_attempts, 3);
    assert_eq!(cfg.engine.fallback, FallbackPolicy::Keyword);
  }

  #[test]
  fn full_config_parses() {
    let cfg = parse_config(
      r#"
        host = "0.0.0.0"
        port = 9000
        store_path = "/var/lib/rapport/rapport.db"
        decay_interval_secs = 600

        [classifier]
        endpoint = "https://api.openai.com/v1"
        api_key = "sk-test"

        [engine]
        classifier_timeout_ms = 800
        fallback = "neutral"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/rapport/rapport.db"));
    let classifier = cfg.classifier.unwrap();
    assert_eq!(classifier.api_key.as_deref(), Some("sk-test"));
    assert_eq!(classifier.model, "gpt-4o-mini");
    assert_eq!(cfg.engine.classifier_timeout_ms, 800);
    assert_eq!(cfg.engine.max_commit_attempts, 3);
    assert_eq!(cfg.engine.fallback, FallbackPolicy::Neutral);
  }

  #[test]
  fn environment_overrides_file() {
    let env: Map<String, String> = [
      ("RAPPORT_PORT", "7000"),
      ("RAPPORT_ENGINE__MAX_COMMIT_ATTEMPTS", "5"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();

    let cfg = build_config(
      File::from_str("port = 9000\n[engine]\nmax_commit_attempts = 2", FileFormat::Toml),
      Environment::with_prefix("RAPPORT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(Some(env)),
    )
    .unwrap();
    assert_eq!(cfg.port, 7000);
    assert_eq!(cfg.engine.max_commit_attempts, 5);
  }

  #[test]
  fn tilde_expands_to_home() {
    let expanded = expand_tilde(Path::new("~/rapport.db"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expanded, PathBuf::from(home).join("rapport.db"));
    }
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }

  #[tokio::test]
  async fn keyword_classifier_is_the_default() {
    let classifier = Classifier::from_config(None);
    assert!(matches!(classifier, Classifier::Keywords(_)));
    let c = classifier.classify("thank you so much!", &[]).await.unwrap();
    assert!(c.cues.kind);
  }

  #[tokio::test]
  async fn healthz_responds() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let engine = Engine::new(store, Classifier::from_config(None), EngineConfig::default());
    let resp = app(Arc::new(engine))
      .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
