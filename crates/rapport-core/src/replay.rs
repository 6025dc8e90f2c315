//! Audit replay over a relationship's event log.

use serde::{Deserialize, Serialize};

use crate::{
  event::{EventType, RelationshipEvent},
  state::{RelationshipState, apply_score_change},
};

/// Fold the events' raw score changes, in the order given, through the same
/// clamp the engine uses. Callers pass events sorted by `sequence`.
pub fn replay_score<'a>(events: impl IntoIterator<Item = &'a RelationshipEvent>) -> f64 {
  events
    .into_iter()
    .fold(0.0, |score, ev| apply_score_change(score, ev.event.score_change))
}

/// The result of checking a stored state against its own event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
  pub user_id:         String,
  pub stored_score:    f64,
  pub replayed_score:  f64,
  pub event_count:     usize,
  /// Every event's `score_before` matched the running replay.
  pub chain_intact:    bool,
  /// Every rupture event is followed, before the next rupture, by at most one
  /// repair, and the stored flag agrees with the last one.
  pub ruptures_paired: bool,
  pub consistent:      bool,
}

/// Audit `state` against its complete, `sequence`-ordered event log.
pub fn audit(state: &RelationshipState, events: &[RelationshipEvent]) -> AuditReport {
  let mut score = 0.0;
  let mut chain_intact = true;
  for ev in events {
    if ev.event.score_before != score {
      chain_intact = false;
    }
    score = apply_score_change(score, ev.event.score_change);
    if ev.event.score_after != score {
      chain_intact = false;
    }
  }

  let mut open = false;
  let mut ruptures_paired = true;
  for ev in events {
    match ev.event.event_type {
      EventType::Rupture if open => ruptures_paired = false,
      EventType::Rupture => open = true,
      EventType::Repair if !open => ruptures_paired = false,
      EventType::Repair => open = false,
      _ => {}
    }
  }
  if open != state.is_ruptured {
    ruptures_paired = false;
  }

  AuditReport {
    user_id: state.user_id.clone(),
    stored_score: state.relationship_score,
    replayed_score: score,
    event_count: events.len(),
    chain_intact,
    ruptures_paired,
    consistent: chain_intact && ruptures_paired && score == state.relationship_score,
  }
}
