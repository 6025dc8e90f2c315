//! Background idle-decay.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use rapport_core::{classifier::SentimentClassifier, store::RelationshipStore};
use tokio::{task::JoinHandle, time};
use tracing::{error, info};

use crate::Engine;

/// Run [`Engine::run_decay_tick`] every `every`, starting immediately.
///
/// Ticks missed while a run is still in progress are skipped, not queued.
/// Abort the returned handle to stop the scheduler.
pub fn spawn_decay_scheduler<S, C>(engine: Arc<Engine<S, C>>, every: Duration) -> JoinHandle<()>
where
  S: RelationshipStore + 'static,
  C: SentimentClassifier + 'static,
{
  info!(interval_secs = every.as_secs(), "decay scheduler started");

  tokio::spawn(async move {
    let mut interval_timer = time::interval(every);
    interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    loop {
      interval_timer.tick().await;
      if let Err(e) = engine.run_decay_tick(Utc::now()).await {
        error!(error = %e, "decay tick failed");
      }
    }
  })
}
