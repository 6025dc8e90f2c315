//! Time-based score decay for idle relationships.
//!
//! The amount owed is derived from `last_interaction_at` alone, and the amount
//! already taken is kept in `decay_applied`. A decay step only ever applies
//! the difference, so running it twice for the same `now` is a no-op.

use chrono::{DateTime, Utc};

use crate::{
  Result,
  event::{EventSource, EventType, NewEvent},
  scoring::{derive_categories, seal},
  state::{Dimensions, RelationshipState, Transition, apply_score_change},
};

/// Idle days before decay starts.
pub const GRACE_DAYS: i64 = 7;
/// Decay per whole idle day beyond the grace period, in tenths of a point.
const TENTHS_PER_DAY: i64 = 1;
/// Cap on the decay taken since the last interaction, in tenths of a point.
const MAX_TENTHS: i64 = 100;
/// Decay never takes a score below this, and only scores above it decay.
pub const DECAY_FLOOR: f64 = -10.0;

/// Whole days since the last interaction, if there was one.
pub fn idle_days(state: &RelationshipState, now: DateTime<Utc>) -> Option<i64> {
  state.last_interaction_at.map(|last| (now - last).num_days())
}

/// Whether `state` is a decay candidate at `now`.
pub fn is_eligible(state: &RelationshipState, now: DateTime<Utc>) -> bool {
  state.relationship_score > DECAY_FLOOR
    && idle_days(state, now).is_some_and(|days| days > GRACE_DAYS)
}

/// Total decay owed since the last interaction. Counted in integer tenths so
/// the per-day steps stay exact.
pub fn decay_owed(state: &RelationshipState, now: DateTime<Utc>) -> f64 {
  let Some(days) = idle_days(state, now) else {
    return 0.0;
  };
  let tenths = ((days - GRACE_DAYS).max(0) * TENTHS_PER_DAY).min(MAX_TENTHS);
  tenths as f64 / 10.0
}

/// Compute the decay step for `state` at `now`, or `None` when nothing is
/// owed (not eligible, or already consumed).
///
/// Decay touches only the overall score. Interaction counters, timestamps and
/// the four dimensions are left alone.
pub fn decay(state: &RelationshipState, now: DateTime<Utc>) -> Result<Option<Transition>> {
  if !is_eligible(state, now) {
    return Ok(None);
  }

  let owed = decay_owed(state, now);
  let increment = owed - state.decay_applied;
  if increment <= 0.0 {
    return Ok(None);
  }

  let headroom = state.relationship_score - DECAY_FLOOR;
  let score_change = -increment.min(headroom);

  let mut next = state.clone();
  next.relationship_score = apply_score_change(state.relationship_score, score_change);
  next.decay_applied = owed;
  derive_categories(&mut next, now);

  let event = NewEvent {
    relationship_id: state.relationship_id,
    event_type: EventType::Neutral,
    source: EventSource::Decay,
    sentiment: None,
    sentiment_intensity: None,
    user_mood: None,
    score_change,
    dimension_changes: Dimensions::default(),
    score_before: state.relationship_score,
    score_after: next.relationship_score,
    tier_before: state.relationship_tier,
    tier_after: next.relationship_tier,
    created_at: now,
  };

  seal(state, next, event, now).map(Some)
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::tier::RelationshipTier;

  fn last() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap() }

  fn idle_at(score: f64) -> RelationshipState {
    let mut s = RelationshipState::new("u", last());
    s.relationship_score = score;
    s.relationship_tier = RelationshipTier::from_score(score);
    s.total_interactions = 10;
    s.first_interaction_at = Some(last() - Duration::days(30));
    s.last_interaction_at = Some(last());
    s.version = 10;
    s
  }

  #[test]
  fn ten_idle_days_cost_three_tenths() {
    let state = idle_at(30.0);
    let now = last() + Duration::days(10);
    let tr = decay(&state, now).unwrap().unwrap();

    assert!((tr.state.relationship_score - 29.7).abs() < 1e-9);
    assert!((tr.state.decay_applied - 0.3).abs() < 1e-9);
    let ev = tr.primary_event().unwrap();
    assert_eq!(ev.source, EventSource::Decay);
    assert_eq!(ev.sentiment, None);
    assert_eq!(ev.dimension_changes, Dimensions::default());

    // A second run at the same instant owes nothing.
    assert!(decay(&tr.state, now).unwrap().is_none());
  }

  #[test]
  fn only_the_difference_is_applied_on_later_ticks() {
    let state = idle_at(30.0);
    let first = decay(&state, last() + Duration::days(10)).unwrap().unwrap();
    let second = decay(&first.state, last() + Duration::days(12)).unwrap().unwrap();
    assert!((second.primary_event().unwrap().score_change + 0.2).abs() < 1e-9);
    assert!((second.state.relationship_score - 29.5).abs() < 1e-9);
  }

  #[test]
  fn grace_period_is_respected() {
    let state = idle_at(30.0);
    assert!(decay(&state, last() + Duration::days(7)).unwrap().is_none());
    assert!(decay(&state, last() + Duration::hours(8 * 24 - 1)).unwrap().is_none());
    assert!(decay(&state, last() + Duration::days(8)).unwrap().is_some());
  }

  #[test]
  fn cumulative_decay_is_capped() {
    let state = idle_at(50.0);
    let tr = decay(&state, last() + Duration::days(1000)).unwrap().unwrap();
    assert!((tr.state.relationship_score - 40.0).abs() < 1e-9);
  }

  #[test]
  fn decay_never_crosses_the_floor() {
    let state = idle_at(-9.5);
    let tr = decay(&state, last() + Duration::days(100)).unwrap().unwrap();
    assert_eq!(tr.state.relationship_score, DECAY_FLOOR);
    assert_eq!(tr.state.relationship_tier, RelationshipTier::NeutralNegative);

    assert!(decay(&idle_at(-10.0), last() + Duration::days(100)).unwrap().is_none());
  }

  #[test]
  fn never_interacted_does_not_decay() {
    let state = RelationshipState::new("u", last());
    assert!(decay(&state, last() + Duration::days(100)).unwrap().is_none());
  }

  #[test]
  fn decay_leaves_interaction_bookkeeping_alone() {
    let state = idle_at(30.0);
    let tr = decay(&state, last() + Duration::days(9)).unwrap().unwrap();
    assert_eq!(tr.state.total_interactions, state.total_interactions);
    assert_eq!(tr.state.last_interaction_at, state.last_interaction_at);
    assert_eq!(tr.state.dimensions, state.dimensions);
    assert_eq!(tr.state.version, 11);
    assert_eq!(tr.base_version, 10);
  }
}
