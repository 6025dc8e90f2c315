//! [`RelationshipState`]: the per-user aggregate owned by the engine.
//!
//! A state is only ever replaced wholesale by a [`Transition`]; no caller
//! mutates one in place and writes it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  event::NewEvent,
  familiarity::FamiliarityStage,
  tier::{RelationshipTier, SCORE_MAX, SCORE_MIN},
};

/// Lower bound of every dimension score.
pub const DIMENSION_MIN: f64 = -50.0;
/// Upper bound of every dimension score.
pub const DIMENSION_MAX: f64 = 50.0;

/// Apply a raw score change and clamp into the score domain.
///
/// This is the only way a relationship score is ever advanced; replay uses
/// the same function, which is what keeps the event log reproducible.
pub fn apply_score_change(before: f64, change: f64) -> f64 {
  (before + change).clamp(SCORE_MIN, SCORE_MAX)
}

/// Apply a raw dimension change and clamp into the dimension domain.
pub fn apply_dimension_change(before: f64, change: f64) -> f64 {
  (before + change).clamp(DIMENSION_MIN, DIMENSION_MAX)
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// The four fine-grained emotional axes, or a set of deltas against them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
  pub warmth:      f64,
  pub trust:       f64,
  pub playfulness: f64,
  pub stability:   f64,
}

impl Dimensions {
  /// Add `delta` to every axis and clamp each into its domain.
  pub fn apply(self, delta: Dimensions) -> Self {
    Self {
      warmth:      apply_dimension_change(self.warmth, delta.warmth),
      trust:       apply_dimension_change(self.trust, delta.trust),
      playfulness: apply_dimension_change(self.playfulness, delta.playfulness),
      stability:   apply_dimension_change(self.stability, delta.stability),
    }
  }

  fn iter(&self) -> [(&'static str, f64); 4] {
    [
      ("warmth_score", self.warmth),
      ("trust_score", self.trust),
      ("playfulness_score", self.playfulness),
      ("stability_score", self.stability),
    ]
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

/// One row per user: the persistent emotional state of the relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipState {
  pub relationship_id:       Uuid,
  pub user_id:               String,
  pub relationship_score:    f64,
  /// Always `RelationshipTier::from_score(relationship_score)`.
  pub relationship_tier:     RelationshipTier,
  pub dimensions:            Dimensions,
  pub familiarity_stage:     FamiliarityStage,
  pub total_interactions:    u64,
  pub positive_interactions: u64,
  pub negative_interactions: u64,
  pub first_interaction_at:  Option<DateTime<Utc>>,
  pub last_interaction_at:   Option<DateTime<Utc>>,
  pub is_ruptured:           bool,
  pub last_rupture_at:       Option<DateTime<Utc>>,
  pub rupture_count:         u64,
  /// Decay already consumed since `last_interaction_at`.
  pub decay_applied:         f64,
  pub created_at:            DateTime<Utc>,
  pub updated_at:            DateTime<Utc>,
  /// Optimistic-concurrency counter; `0` means the row has never been written.
  pub version:               u64,
}

impl RelationshipState {
  /// The neutral starting point for a user the engine has never seen.
  pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
    Self {
      relationship_id:       Uuid::new_v4(),
      user_id:               user_id.into(),
      relationship_score:    0.0,
      relationship_tier:     RelationshipTier::Acquaintance,
      dimensions:            Dimensions::default(),
      familiarity_stage:     FamiliarityStage::Early,
      total_interactions:    0,
      positive_interactions: 0,
      negative_interactions: 0,
      first_interaction_at:  None,
      last_interaction_at:   None,
      is_ruptured:           false,
      last_rupture_at:       None,
      rupture_count:         0,
      decay_applied:         0.0,
      created_at:            now,
      updated_at:            now,
      version:               0,
    }
  }

  /// Whether this state has been persisted at least once.
  pub fn is_persisted(&self) -> bool { self.version > 0 }

  /// Verify every documented domain. A failure here is a defect in the
  /// engine, never a normal runtime condition.
  pub fn check_invariants(&self) -> Result<()> {
    let violation = |detail: String| {
      Err(Error::InvariantViolation { user_id: self.user_id.clone(), detail })
    };

    let score = self.relationship_score;
    if !score.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&score) {
      return violation(format!("relationship_score {score} outside [-100, 100]"));
    }
    for (name, value) in self.dimensions.iter() {
      if !value.is_finite() || !(DIMENSION_MIN..=DIMENSION_MAX).contains(&value) {
        return violation(format!("{name} {value} outside [-50, 50]"));
      }
    }

    let expected_tier = RelationshipTier::from_score(score);
    if self.relationship_tier != expected_tier {
      return violation(format!(
        "tier {} is stale for score {score} (expected {expected_tier})",
        self.relationship_tier
      ));
    }

    let polar = self.positive_interactions + self.negative_interactions;
    if polar > self.total_interactions {
      return violation(format!(
        "positive + negative interactions ({polar}) exceed total ({})",
        self.total_interactions
      ));
    }

    if self.total_interactions > 0
      && (self.first_interaction_at.is_none() || self.last_interaction_at.is_none())
    {
      return violation("interaction timestamps missing after first event".into());
    }

    if self.is_ruptured && self.last_rupture_at.is_none() {
      return violation("ruptured without a rupture timestamp".into());
    }

    if !self.decay_applied.is_finite() || self.decay_applied < 0.0 {
      return violation(format!("decay_applied {} is negative", self.decay_applied));
    }

    Ok(())
  }
}

// ─── Transition ──────────────────────────────────────────────────────────────

/// The output of a pure engine step and the single input of the store's
/// transactional write.
#[derive(Debug, Clone)]
pub struct Transition {
  /// The version the new state was computed from. The store refuses the write
  /// if the persisted row has moved on.
  pub base_version: u64,
  pub state:        RelationshipState,
  /// Events to append in order; the primary event is always first.
  pub events:       Vec<NewEvent>,
}

impl Transition {
  /// The event describing the step itself (as opposed to milestones).
  pub fn primary_event(&self) -> Option<&NewEvent> { self.events.first() }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() }

  #[test]
  fn new_state_is_neutral_and_valid() {
    let s = RelationshipState::new("user-1", now());
    assert_eq!(s.relationship_score, 0.0);
    assert_eq!(s.relationship_tier, RelationshipTier::Acquaintance);
    assert_eq!(s.familiarity_stage, FamiliarityStage::Early);
    assert!(!s.is_persisted());
    s.check_invariants().unwrap();
  }

  #[test]
  fn clamp_absorbs_pressure_at_the_bound() {
    assert_eq!(apply_score_change(99.0, 5.0), 100.0);
    assert_eq!(apply_score_change(100.0, 5.0), 100.0);
    assert_eq!(apply_score_change(100.0, -5.0), 95.0);
    assert_eq!(apply_dimension_change(-49.0, -3.0), -50.0);
  }

  #[test]
  fn stale_tier_is_a_violation() {
    let mut s = RelationshipState::new("user-1", now());
    s.relationship_score = 20.0;
    let err = s.check_invariants().unwrap_err();
    assert!(matches!(err, Error::InvariantViolation { .. }));
  }

  #[test]
  fn out_of_range_dimension_is_a_violation() {
    let mut s = RelationshipState::new("user-1", now());
    s.dimensions.trust = 50.5;
    assert!(s.check_invariants().is_err());
    s.dimensions.trust = f64::NAN;
    assert!(s.check_invariants().is_err());
  }

  #[test]
  fn counter_invariant_is_checked() {
    let mut s = RelationshipState::new("user-1", now());
    s.first_interaction_at = Some(now());
    s.last_interaction_at = Some(now());
    s.total_interactions = 1;
    s.positive_interactions = 1;
    s.negative_interactions = 1;
    assert!(s.check_invariants().is_err());
  }
}
