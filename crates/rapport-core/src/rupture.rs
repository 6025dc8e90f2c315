//! Rupture/repair detection.
//!
//! `is_ruptured` is the one piece of state that cannot be recovered from the
//! score: a relationship that just recovered and one that never ruptured can
//! sit at the same score. The detector is therefore an explicit guard over the
//! persisted flag, evaluated before a transition is finalised.

use crate::{
  event::EventType,
  sentiment::{Classification, Intensity, Sentiment},
};

/// A raw score change at or below this can open a rupture.
pub const RUPTURE_SCORE_CHANGE: f64 = -10.0;
/// Minimum intensity for a rupture.
pub const RUPTURE_MIN_INTENSITY: Intensity = Intensity::new(7);

/// What the detector decided for one chat update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuptureOutcome {
  /// Flag untouched, no extra deltas.
  Unchanged,
  /// Enter rupture and apply an extra (negative) stability change.
  Entered { stability_penalty: f64 },
  /// Clear the rupture and apply bonuses beyond the base delta.
  Repaired { trust_bonus: f64, stability_bonus: f64 },
}

impl RuptureOutcome {
  /// The event type for the step, overriding the polarity-derived default on
  /// entry and exit ticks only.
  pub fn event_type(&self, default: EventType) -> EventType {
    match self {
      Self::Unchanged => default,
      Self::Entered { .. } => EventType::Rupture,
      Self::Repaired { .. } => EventType::Repair,
    }
  }
}

/// Decide whether this update opens or closes a rupture.
///
/// `raw_score_change` is the pre-clamp change just computed for the overall
/// score. While ruptured, a further severe message does not re-enter.
pub fn detect(
  is_ruptured: bool,
  classification: &Classification,
  raw_score_change: f64,
) -> RuptureOutcome {
  let intensity = classification.intensity;

  if !is_ruptured {
    let severe = classification.sentiment == Sentiment::Negative
      && intensity >= RUPTURE_MIN_INTENSITY
      && raw_score_change <= RUPTURE_SCORE_CHANGE;
    return if severe {
      RuptureOutcome::Entered { stability_penalty: stability_penalty(intensity) }
    } else {
      RuptureOutcome::Unchanged
    };
  }

  if classification.sentiment == Sentiment::Positive
    && classification.cues.acknowledges()
  {
    let (trust_bonus, stability_bonus) = repair_bonuses(intensity);
    RuptureOutcome::Repaired { trust_bonus, stability_bonus }
  } else {
    RuptureOutcome::Unchanged
  }
}

/// `-5` at the minimum rupture intensity, scaling linearly to `-10` at 10.
fn stability_penalty(intensity: Intensity) -> f64 {
  let above = f64::from(intensity.get().saturating_sub(RUPTURE_MIN_INTENSITY.get()));
  -(5.0 + 5.0 * above / 3.0)
}

/// Trust `+2..=+5` and stability `+2..=+4`, scaled by intensity.
fn repair_bonuses(intensity: Intensity) -> (f64, f64) {
  let t = f64::from(intensity.get() - 1) / 9.0;
  (2.0 + 3.0 * t, 2.0 + 2.0 * t)
}
