//! The score update engine: one chat message in, one [`Transition`] out.
//!
//! Pure given its inputs. Timestamps are passed in; nothing here reads a
//! clock, touches storage, or generates ids other than for fresh events.

use chrono::{DateTime, Utc};

use crate::{
  Result,
  event::{EventSource, EventType, NewEvent},
  familiarity::{FamiliarityStage, days_since},
  rupture::{self, RuptureOutcome},
  sentiment::{Classification, Sentiment},
  state::{Dimensions, RelationshipState, Transition, apply_score_change},
  tier::RelationshipTier,
};

// ─── Delta table ─────────────────────────────────────────────────────────────

/// Playfulness nudge for banter.
pub const PLAYFUL_BONUS: f64 = 1.5;
/// Playfulness nudge for banter inside a negative message.
pub const PLAYFUL_BONUS_NEGATIVE: f64 = 0.5;
pub const VULNERABLE_TRUST: f64 = 1.0;
pub const VULNERABLE_STABILITY: f64 = 0.5;
pub const APOLOGY_TRUST: f64 = 1.5;
pub const APOLOGY_STABILITY: f64 = 1.0;

/// The polarity-driven part of an update, before cue rules and rupture
/// adjustments. Negative rows are steeper than positive ones: trust erodes
/// faster than it is built.
pub fn base_deltas(classification: &Classification) -> (f64, Dimensions) {
  let f = classification.intensity.fraction();
  match classification.sentiment {
    Sentiment::Positive => (2.0 + 3.0 * f, Dimensions {
      warmth:      1.0 + 1.5 * f,
      trust:       0.5 + f,
      playfulness: 0.0,
      stability:   0.5,
    }),
    Sentiment::Negative => (-(3.0 + 10.0 * f), Dimensions {
      warmth:      -(1.5 + 2.5 * f),
      trust:       -(1.0 + 3.0 * f),
      playfulness: 0.0,
      stability:   -(1.0 + 2.0 * f),
    }),
    Sentiment::Neutral => (0.0, Dimensions::default()),
  }
}

/// Cue-driven dimension nudges, independent of polarity. Returns the deltas
/// without the apology trust bonus, and that bonus separately so a repair can
/// override it.
fn cue_deltas(classification: &Classification) -> (Dimensions, f64) {
  let cues = classification.cues;
  let mut delta = Dimensions::default();

  if cues.playful {
    delta.playfulness += match classification.sentiment {
      Sentiment::Negative => PLAYFUL_BONUS_NEGATIVE,
      Sentiment::Positive | Sentiment::Neutral => PLAYFUL_BONUS,
    };
  }
  if cues.vulnerable {
    delta.trust += VULNERABLE_TRUST;
    delta.stability += VULNERABLE_STABILITY;
  }

  let apology_trust = if cues.apologetic {
    delta.stability += APOLOGY_STABILITY;
    APOLOGY_TRUST
  } else {
    0.0
  };

  (delta, apology_trust)
}

fn sum(a: Dimensions, b: Dimensions) -> Dimensions {
  Dimensions {
    warmth:      a.warmth + b.warmth,
    trust:       a.trust + b.trust,
    playfulness: a.playfulness + b.playfulness,
    stability:   a.stability + b.stability,
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Apply one chat message to `state`.
///
/// `classification` is `None` when the classifier failed upstream: the
/// update then records the interaction with zero deltas and a `system`
/// event rather than guessing at a sentiment.
pub fn update(
  state: &RelationshipState,
  classification: Option<&Classification>,
  now: DateTime<Utc>,
) -> Result<Transition> {
  let Some(classification) = classification else {
    return unclassified_update(state, now);
  };

  let (score_change, mut base) = base_deltas(classification);
  // An apology never costs trust, whatever polarity it was read with.
  if classification.cues.apologetic {
    base.trust = base.trust.max(0.0);
  }
  let (cues, apology_trust) = cue_deltas(classification);
  let mut dimension_changes = sum(base, cues);

  // The guard runs on the pre-clamp change, before anything is finalised.
  let outcome = rupture::detect(state.is_ruptured, classification, score_change);
  match outcome {
    RuptureOutcome::Unchanged => {
      dimension_changes.trust += apology_trust;
    }
    RuptureOutcome::Entered { stability_penalty } => {
      dimension_changes.trust += apology_trust;
      dimension_changes.stability += stability_penalty;
    }
    RuptureOutcome::Repaired { trust_bonus, stability_bonus } => {
      dimension_changes.trust += apology_trust.max(trust_bonus);
      dimension_changes.stability += stability_bonus;
    }
  }

  let mut next = interacted(state, now);
  next.relationship_score = apply_score_change(state.relationship_score, score_change);
  next.dimensions = state.dimensions.apply(dimension_changes);
  match classification.sentiment {
    Sentiment::Positive => next.positive_interactions += 1,
    Sentiment::Negative => next.negative_interactions += 1,
    Sentiment::Neutral => {}
  }
  match outcome {
    RuptureOutcome::Unchanged => {}
    RuptureOutcome::Entered { .. } => {
      next.is_ruptured = true;
      next.last_rupture_at = Some(now);
      next.rupture_count += 1;
    }
    RuptureOutcome::Repaired { .. } => next.is_ruptured = false,
  }
  derive_categories(&mut next, now);

  let event = NewEvent {
    relationship_id: state.relationship_id,
    event_type: outcome.event_type(EventType::from(classification.sentiment)),
    source: EventSource::Chat,
    sentiment: Some(classification.sentiment),
    sentiment_intensity: Some(classification.intensity),
    user_mood: classification.mood.clone(),
    score_change,
    dimension_changes,
    score_before: state.relationship_score,
    score_after: next.relationship_score,
    tier_before: state.relationship_tier,
    tier_after: next.relationship_tier,
    created_at: now,
  };

  seal(state, next, event, now)
}

/// The zero-delta path for a message the classifier could not judge.
fn unclassified_update(
  state: &RelationshipState,
  now: DateTime<Utc>,
) -> Result<Transition> {
  let mut next = interacted(state, now);
  derive_categories(&mut next, now);

  let event = NewEvent {
    relationship_id: state.relationship_id,
    event_type: EventType::Neutral,
    source: EventSource::System,
    sentiment: None,
    sentiment_intensity: None,
    user_mood: None,
    score_change: 0.0,
    dimension_changes: Dimensions::default(),
    score_before: state.relationship_score,
    score_after: next.relationship_score,
    tier_before: state.relationship_tier,
    tier_after: next.relationship_tier,
    created_at: now,
  };

  seal(state, next, event, now)
}

/// Copy `state` with the bookkeeping every processed message performs.
fn interacted(state: &RelationshipState, now: DateTime<Utc>) -> RelationshipState {
  let mut next = state.clone();
  next.total_interactions += 1;
  next.first_interaction_at.get_or_insert(now);
  next.last_interaction_at = Some(now);
  // Decay is measured from the last interaction, so its ledger restarts.
  next.decay_applied = 0.0;
  next
}

// ─── Shared finalisation ─────────────────────────────────────────────────────

/// Recompute the derived categorical fields from the new numeric state.
pub(crate) fn derive_categories(next: &mut RelationshipState, now: DateTime<Utc>) {
  next.relationship_tier = RelationshipTier::from_score(next.relationship_score);
  next.familiarity_stage = FamiliarityStage::resolve(
    next.total_interactions,
    days_since(next.first_interaction_at, now),
  );
}

/// Milestone markers for thresholds crossed between `before` and `after`:
/// a strictly closer tier, or an advanced familiarity stage.
pub(crate) fn milestones(
  before: &RelationshipState,
  after: &RelationshipState,
  now: DateTime<Utc>,
) -> Vec<NewEvent> {
  let mut out = Vec::new();
  let crossed_tier = after.relationship_tier > before.relationship_tier;
  let advanced_stage = after.familiarity_stage > before.familiarity_stage;
  if crossed_tier || advanced_stage {
    out.push(NewEvent::milestone(
      after.relationship_id,
      after.relationship_score,
      after.relationship_tier,
      now,
    ));
  }
  out
}

/// Stamp, validate and package a new state with its events.
pub(crate) fn seal(
  before: &RelationshipState,
  mut next: RelationshipState,
  primary: NewEvent,
  now: DateTime<Utc>,
) -> Result<Transition> {
  next.updated_at = now;
  next.version = before.version + 1;
  next.check_invariants()?;

  let mut events = vec![primary];
  events.extend(milestones(before, &next, now));

  Ok(Transition { base_version: before.version, state: next, events })
}
