//! Sentiment classifications, the engine's only view of a chat message.
//!
//! The classifier collaborator is a black box. Whatever it returns is narrowed
//! into the closed types below before any scoring happens, so the delta table
//! can be matched exhaustively.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ─── Polarity ────────────────────────────────────────────────────────────────

/// The polarity of a classified message.
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
pub enum Sentiment {
  Positive,
  Neutral,
  Negative,
}

// ─── Intensity ───────────────────────────────────────────────────────────────

/// How strongly the sentiment is expressed, always within `1..=10`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "u8", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
  pub const MIN: Intensity = Intensity(1);
  pub const MAX: Intensity = Intensity(10);

  /// Build an intensity, clamping out-of-range input into `1..=10`.
  pub const fn new(value: u8) -> Self {
    if value < 1 {
      Self(1)
    } else if value > 10 {
      Self(10)
    } else {
      Self(value)
    }
  }

  pub const fn get(self) -> u8 { self.0 }

  /// The intensity as a fraction of the maximum, in `0.1..=1.0`.
  pub fn fraction(self) -> f64 { f64::from(self.0) / 10.0 }
}

impl From<u8> for Intensity {
  fn from(value: u8) -> Self { Self::new(value) }
}

impl From<Intensity> for u8 {
  fn from(value: Intensity) -> Self { value.0 }
}

// ─── Cues ────────────────────────────────────────────────────────────────────

/// Content signals that drive dimension-specific rules independently of the
/// overall polarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCues {
  /// Banter, teasing, jokes.
  #[serde(default)]
  pub playful:    bool,
  /// The user is sharing something personal or fragile.
  #[serde(default)]
  pub vulnerable: bool,
  /// The user is apologising.
  #[serde(default)]
  pub apologetic: bool,
  /// Gratitude, reassurance, affection.
  #[serde(default)]
  pub kind:       bool,
}

impl MessageCues {
  /// Whether the message acknowledges a previous hurt; the content half of
  /// the repair condition.
  pub fn acknowledges(&self) -> bool { self.apologetic || self.kind }

  /// Combine two cue sets, keeping every signal either one detected.
  pub fn union(self, other: Self) -> Self {
    Self {
      playful:    self.playful || other.playful,
      vulnerable: self.vulnerable || other.vulnerable,
      apologetic: self.apologetic || other.apologetic,
      kind:       self.kind || other.kind,
    }
  }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// The result of classifying one user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
  pub sentiment: Sentiment,
  pub intensity: Intensity,
  /// Free-text mood tag, e.g. "tired" or "excited".
  pub mood:      Option<String>,
  #[serde(default)]
  pub cues:      MessageCues,
}

impl Classification {
  pub fn new(sentiment: Sentiment, intensity: u8) -> Self {
    Self {
      sentiment,
      intensity: Intensity::new(intensity),
      mood: None,
      cues: MessageCues::default(),
    }
  }

  pub fn with_cues(mut self, cues: MessageCues) -> Self {
    self.cues = cues;
    self
  }

  pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
    self.mood = Some(mood.into());
    self
  }
}

// ─── Recent context ──────────────────────────────────────────────────────────

/// Who said a line of recent conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
  User,
  Character,
}

/// One line of recent conversation handed to the classifier for context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextMessage {
  pub speaker: Speaker,
  pub text:    String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn intensity_is_clamped_into_range() {
    assert_eq!(Intensity::new(0).get(), 1);
    assert_eq!(Intensity::new(7).get(), 7);
    assert_eq!(Intensity::new(200).get(), 10);
  }

  #[test]
  fn intensity_deserialises_through_clamp() {
    let c: Classification =
      serde_json::from_str(r#"{"sentiment":"negative","intensity":42,"mood":null}"#)
        .unwrap();
    assert_eq!(c.sentiment, Sentiment::Negative);
    assert_eq!(c.intensity, Intensity::MAX);
    assert_eq!(c.cues, MessageCues::default());
  }

  #[test]
  fn sentiment_string_forms() {
    assert_eq!(Sentiment::Positive.as_ref(), "positive");
    assert_eq!("negative".parse::<Sentiment>().unwrap(), Sentiment::Negative);
    assert!("meh".parse::<Sentiment>().is_err());
  }

  #[test]
  fn acknowledgment_needs_apology_or_kindness() {
    let mut cues = MessageCues { playful: true, ..Default::default() };
    assert!(!cues.acknowledges());
    cues.kind = true;
    assert!(cues.acknowledges());
  }
}
