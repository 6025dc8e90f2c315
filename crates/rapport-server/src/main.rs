//! rapport-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `RAPPORT_*` environment variables, opens the SQLite store, starts the
//! idle-decay scheduler, and serves the JSON API over HTTP.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use rapport_engine::{Engine, spawn_decay_scheduler};
use rapport_server::{Classifier, expand_tilde, load_config};
use rapport_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Rapport relationship engine server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let server_cfg = load_config(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  // Expand `~` in store path and make sure its directory exists.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match &server_cfg.classifier {
    Some(c) => tracing::info!(endpoint = %c.endpoint, model = %c.model, "using hosted classifier"),
    None => tracing::info!("no classifier configured, using keyword heuristics"),
  }
  let classifier = Classifier::from_config(server_cfg.classifier.clone());

  let engine = Arc::new(Engine::new(store, classifier, server_cfg.engine.clone()));

  let interval = Duration::from_secs(server_cfg.decay_interval_secs.max(1));
  let _decay = spawn_decay_scheduler(Arc::clone(&engine), interval);

  let app = rapport_server::app(engine);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
