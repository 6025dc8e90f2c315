//! Relationship events: the append-only audit trail.
//!
//! Events are never updated or deleted. Replaying a relationship's events in
//! `sequence` order reproduces its current score (see [`crate::replay`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  sentiment::{Intensity, Sentiment},
  state::Dimensions,
  tier::RelationshipTier,
};

// ─── Discriminants ───────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
  Positive,
  Negative,
  Neutral,
  Milestone,
  Rupture,
  Repair,
}

impl From<Sentiment> for EventType {
  fn from(sentiment: Sentiment) -> Self {
    match sentiment {
      Sentiment::Positive => Self::Positive,
      Sentiment::Neutral => Self::Neutral,
      Sentiment::Negative => Self::Negative,
    }
  }
}

/// What caused the event.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventSource {
  /// A classified chat message.
  Chat,
  /// A chat message whose classification was unavailable.
  System,
  /// The decay scheduler.
  Decay,
  /// A threshold crossed by a preceding event in the same transition.
  Milestone,
}

// ─── NewEvent ────────────────────────────────────────────────────────────────

/// An event as produced by the pure engine. The store assigns `event_id` and
/// `sequence` when it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
  pub relationship_id:     Uuid,
  pub event_type:          EventType,
  pub source:              EventSource,
  /// `None` for system and decay events.
  pub sentiment:           Option<Sentiment>,
  pub sentiment_intensity: Option<Intensity>,
  pub user_mood:           Option<String>,
  /// The raw, pre-clamp change to `relationship_score`.
  pub score_change:        f64,
  /// The raw, pre-clamp change to each dimension.
  pub dimension_changes:   Dimensions,
  pub score_before:        f64,
  pub score_after:         f64,
  pub tier_before:         RelationshipTier,
  pub tier_after:          RelationshipTier,
  pub created_at:          DateTime<Utc>,
}

impl NewEvent {
  /// A zero-delta marker for a threshold crossed at `score`.
  pub fn milestone(
    relationship_id: Uuid,
    score: f64,
    tier: RelationshipTier,
    at: DateTime<Utc>,
  ) -> Self {
    Self {
      relationship_id,
      event_type: EventType::Milestone,
      source: EventSource::Milestone,
      sentiment: None,
      sentiment_intensity: None,
      user_mood: None,
      score_change: 0.0,
      dimension_changes: Dimensions::default(),
      score_before: score,
      score_after: score,
      tier_before: tier,
      tier_after: tier,
      created_at: at,
    }
  }
}

// ─── RelationshipEvent ───────────────────────────────────────────────────────

/// A persisted event. Once written, no field is ever updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEvent {
  pub event_id: Uuid,
  /// Store-assigned, strictly increasing in creation order.
  pub sequence: i64,
  #[serde(flatten)]
  pub event:    NewEvent,
}
