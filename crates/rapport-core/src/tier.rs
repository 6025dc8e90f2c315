//! Relationship tiers: the coarse, six-valued reading of the overall score.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Lower bound of the overall relationship score.
pub const SCORE_MIN: f64 = -100.0;
/// Upper bound of the overall relationship score.
pub const SCORE_MAX: f64 = 100.0;

/// How close the character currently is to the user. Variants are declared in
/// ascending order so `Ord` compares closeness.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RelationshipTier {
  Adversarial,
  NeutralNegative,
  Acquaintance,
  Friend,
  CloseFriend,
  DeeplyLoving,
}

impl RelationshipTier {
  /// Resolve the tier for `score`. Total over the score domain, with no
  /// hysteresis: the result depends on nothing but the score.
  ///
  /// `DeeplyLoving` sits at the domain maximum, so it is only reachable by
  /// sustained accumulation.
  pub fn from_score(score: f64) -> Self {
    if score <= -50.0 {
      Self::Adversarial
    } else if score <= -10.0 {
      Self::NeutralNegative
    } else if score < 10.0 {
      Self::Acquaintance
    } else if score < 50.0 {
      Self::Friend
    } else if score < SCORE_MAX {
      Self::CloseFriend
    } else {
      Self::DeeplyLoving
    }
  }
}
