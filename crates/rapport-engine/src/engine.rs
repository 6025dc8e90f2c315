//! [`Engine`]: the orchestration around the pure core.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rapport_core::{
  classifier::SentimentClassifier,
  decay,
  event::RelationshipEvent,
  keywords::KeywordClassifier,
  replay::{self, AuditReport},
  scoring,
  sentiment::{Classification, ContextMessage},
  state::RelationshipState,
  store::{CommitOutcome, RelationshipStore},
};
use tracing::{debug, info, warn};

use crate::{
  config::{EngineConfig, FallbackPolicy},
  locks::KeyedLocks,
  Error, Result,
};

/// Processes chat turns and decay ticks against one store.
///
/// Holds no relationship state of its own: every operation reads the row,
/// computes a transition with the pure core, and commits it.
pub struct Engine<S, C> {
  store:      S,
  classifier: C,
  keywords:   KeywordClassifier,
  config:     EngineConfig,
  locks:      KeyedLocks,
}

impl<S, C> Engine<S, C>
where
  S: RelationshipStore,
  C: SentimentClassifier,
{
  pub fn new(store: S, classifier: C, config: EngineConfig) -> Self {
    Self {
      store,
      classifier,
      keywords: KeywordClassifier,
      config,
      locks: KeyedLocks::default(),
    }
  }

  // ─── Chat turns ────────────────────────────────────────────────────────────

  /// Apply one user message and return the committed state.
  ///
  /// A slow or failing classifier never fails the call; only store errors,
  /// exhausted conflict retries and invariant violations do.
  pub async fn process_interaction(
    &self,
    user_id: &str,
    message: &str,
    context: &[ContextMessage],
    now: DateTime<Utc>,
  ) -> Result<RelationshipState> {
    let classification = match self.classify(message, context).await {
      Ok(c) => Some(c),
      Err(e) => {
        warn!(user_id, error = %e, policy = ?self.config.fallback, "falling back");
        match self.config.fallback {
          FallbackPolicy::Keyword => Some(self.keywords.classify_text(message)),
          FallbackPolicy::Neutral => None,
        }
      }
    };

    let _guard = self.locks.acquire(user_id).await;

    let attempts = self.config.max_commit_attempts.max(1);
    for attempt in 1..=attempts {
      let current = self.load_or_new(user_id, now).await?;
      let transition = scoring::update(&current, classification.as_ref(), now)?;
      let before = current.relationship_tier;

      match self.store.commit(transition).await.map_err(Error::store)? {
        CommitOutcome::Committed(state) => {
          if state.relationship_tier != before {
            info!(
              user_id,
              from = %before,
              to = %state.relationship_tier,
              score = state.relationship_score,
              "relationship tier changed"
            );
          }
          debug!(
            user_id,
            version = state.version,
            score = state.relationship_score,
            ruptured = state.is_ruptured,
            "interaction committed"
          );
          return Ok(state);
        }
        CommitOutcome::Conflict => {
          debug!(user_id, attempt, "version conflict, retrying");
        }
      }
    }

    Err(Error::ConcurrentUpdateConflict { user_id: user_id.to_owned(), attempts })
  }

  /// Call the hosted classifier under the configured deadline.
  async fn classify(
    &self,
    message: &str,
    context: &[ContextMessage],
  ) -> Result<Classification> {
    let timeout_ms = self.config.classifier_timeout_ms;
    let deadline = Duration::from_millis(timeout_ms);
    match tokio::time::timeout(deadline, self.classifier.classify(message, context)).await {
      Ok(Ok(c)) => Ok(c),
      Ok(Err(e)) => Err(Error::ClassificationUnavailable(e.to_string())),
      Err(_) => Err(Error::ClassificationUnavailable(format!(
        "timed out after {timeout_ms}ms"
      ))),
    }
  }

  async fn load_or_new(&self, user_id: &str, now: DateTime<Utc>) -> Result<RelationshipState> {
    Ok(
      self
        .store
        .get_relationship(user_id)
        .await
        .map_err(Error::store)?
        .unwrap_or_else(|| RelationshipState::new(user_id, now)),
    )
  }

  // ─── Decay ─────────────────────────────────────────────────────────────────

  /// Apply owed decay to every idle relationship, one commit per row.
  ///
  /// Row failures are logged and skipped. Returns the number of rows that
  /// were actually changed; running again with the same `now` returns 0.
  pub async fn run_decay_tick(&self, now: DateTime<Utc>) -> Result<usize> {
    let cutoff = now - chrono::Duration::days(decay::GRACE_DAYS);
    let candidates = self.store.list_idle(cutoff).await.map_err(Error::store)?;
    let total = candidates.len();

    let mut updated = 0;
    for state in candidates {
      let user_id = state.user_id.clone();
      match self.decay_one(state, now).await {
        Ok(true) => updated += 1,
        Ok(false) => {}
        Err(e) => warn!(user_id = %user_id, error = %e, "decay failed, skipping row"),
      }
    }

    info!(candidates = total, updated, "decay tick finished");
    Ok(updated)
  }

  async fn decay_one(&self, state: RelationshipState, now: DateTime<Utc>) -> Result<bool> {
    let _guard = self.locks.acquire(&state.user_id).await;

    let Some(transition) = decay::decay(&state, now)? else {
      return Ok(false);
    };

    match self.store.commit(transition).await.map_err(Error::store)? {
      CommitOutcome::Committed(next) => {
        debug!(
          user_id = %next.user_id,
          score = next.relationship_score,
          decay_applied = next.decay_applied,
          "decay committed"
        );
        Ok(true)
      }
      // A chat turn got there first; the next tick re-reads the row.
      CommitOutcome::Conflict => {
        debug!(user_id = %state.user_id, "decay lost version race");
        Ok(false)
      }
    }
  }

  // ─── Reads ─────────────────────────────────────────────────────────────────

  pub async fn get(&self, user_id: &str) -> Result<RelationshipState> {
    self
      .store
      .get_relationship(user_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(user_id.to_owned()))
  }

  pub async fn list(&self) -> Result<Vec<RelationshipState>> {
    self.store.list_relationships().await.map_err(Error::store)
  }

  /// The user's event log in creation order.
  pub async fn events(&self, user_id: &str) -> Result<Vec<RelationshipEvent>> {
    let state = self.get(user_id).await?;
    self
      .store
      .list_events(state.relationship_id)
      .await
      .map_err(Error::store)
  }

  /// Replay the user's log and compare it against the stored state.
  pub async fn audit(&self, user_id: &str) -> Result<AuditReport> {
    let state = self.get(user_id).await?;
    let events = self
      .store
      .list_events(state.relationship_id)
      .await
      .map_err(Error::store)?;
    let report = replay::audit(&state, &events);
    if !report.consistent {
      warn!(
        user_id,
        stored = report.stored_score,
        replayed = report.replayed_score,
        "audit found an inconsistent relationship"
      );
    }
    Ok(report)
  }
}
