//! Familiarity stages: how much shared history a response may lean on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Fewer interactions than this keeps a relationship `Early`.
pub const DEVELOPING_MIN_INTERACTIONS: u64 = 5;
/// Fewer whole days than this keeps a relationship `Early`.
pub const DEVELOPING_MIN_DAYS: i64 = 2;
/// Fewer interactions than this keeps a relationship at most `Developing`.
pub const ESTABLISHED_MIN_INTERACTIONS: u64 = 25;
/// Fewer whole days than this keeps a relationship at most `Developing`.
pub const ESTABLISHED_MIN_DAYS: i64 = 14;

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
pub enum FamiliarityStage {
  Early,
  Developing,
  Established,
}

impl FamiliarityStage {
  /// Either signal alone holds a relationship back: familiarity has to be
  /// earned in both volume and elapsed time.
  pub fn resolve(total_interactions: u64, days_since_first: i64) -> Self {
    if total_interactions < DEVELOPING_MIN_INTERACTIONS
      || days_since_first < DEVELOPING_MIN_DAYS
    {
      Self::Early
    } else if total_interactions < ESTABLISHED_MIN_INTERACTIONS
      || days_since_first < ESTABLISHED_MIN_DAYS
    {
      Self::Developing
    } else {
      Self::Established
    }
  }
}

/// Whole days elapsed since `first`, or `0` before the first interaction.
/// Clock skew never yields a negative count.
pub fn days_since(first: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
  first.map_or(0, |first| (now - first).num_days().max(0))
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  #[test]
  fn volume_alone_is_not_enough() {
    assert_eq!(FamiliarityStage::resolve(500, 0), FamiliarityStage::Early);
    assert_eq!(FamiliarityStage::resolve(500, 1), FamiliarityStage::Early);
    assert_eq!(FamiliarityStage::resolve(500, 13), FamiliarityStage::Developing);
  }

  #[test]
  fn time_alone_is_not_enough() {
    assert_eq!(FamiliarityStage::resolve(4, 365), FamiliarityStage::Early);
    assert_eq!(FamiliarityStage::resolve(24, 365), FamiliarityStage::Developing);
  }

  #[test]
  fn thresholds_are_inclusive_on_the_upper_stage() {
    assert_eq!(FamiliarityStage::resolve(5, 2), FamiliarityStage::Developing);
    assert_eq!(FamiliarityStage::resolve(25, 14), FamiliarityStage::Established);
  }

  #[test]
  fn days_since_counts_whole_days() {
    let first = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    assert_eq!(days_since(None, first), 0);
    assert_eq!(days_since(Some(first), first + Duration::hours(47)), 1);
    assert_eq!(days_since(Some(first), first + Duration::hours(48)), 2);
    assert_eq!(days_since(Some(first), first - Duration::hours(5)), 0);
  }
}
