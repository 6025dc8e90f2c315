//! Keyword-based sentiment classification, the offline fallback used when
//! the hosted classifier is unavailable.
//!
//! Pure lexicon heuristics with no model and no I/O. Anything it cannot read
//! confidently comes out `Neutral` with low intensity.

use std::convert::Infallible;

use crate::{
  classifier::SentimentClassifier,
  sentiment::{Classification, ContextMessage, Intensity, MessageCues, Sentiment},
};

// ─── Lexicons ────────────────────────────────────────────────────────────────

/// Stems that push towards positive. Matched as token prefixes, so only
/// stems with no common unrelated continuation belong here.
const POSITIVE_STEMS: &[&str] = &[
  "love", "great", "awesome", "amazing", "wonderful", "thank", "appreciat",
  "beautiful", "fantastic", "perfect", "enjoy", "excit", "adore", "brilliant",
];

/// Whole words that push towards positive.
const POSITIVE_WORDS: &[&str] = &[
  "like", "likes", "liked", "nice", "sweet", "cute", "glad", "fun", "funny",
  "best", "good", "yay", "miss", "missed", "happy", "happier", "happiest",
];

/// Stems that push towards negative. Matched as token prefixes.
const NEGATIVE_STEMS: &[&str] = &[
  "hate", "stupid", "annoy", "furious", "terribl", "awful", "horribl",
  "useless", "pathetic", "disgust", "idiot", "disappoint",
];

/// Whole words that push towards negative.
const NEGATIVE_WORDS: &[&str] = &[
  "angry", "anger", "worst", "shut", "boring", "bored", "dumb", "tired", "sad",
  "upset", "leave", "ugh", "bad", "wrong",
];

/// Tokens that flip the polarity of the next sentiment-bearing token.
const NEGATORS: &[&str] = &["not", "never", "no", "dont", "don't", "isnt", "isn't", "wasnt", "wasn't"];

/// Tokens that raise intensity.
const INTENSIFIERS: &[&str] = &["so", "really", "very", "extremely", "totally", "absolutely", "super"];

/// Positive hits credited for each apology phrase. An apology outweighs a
/// single negative word in the same message.
const APOLOGY_WEIGHT: u32 = 2;

const PLAYFUL_MARKERS: &[&str] = &[
  "haha", "hehe", "lol", "lmao", "rofl", "jk", "just kidding", "teasing", ":p",
  ";)", "😜", "😂", "😏",
];

const VULNERABLE_MARKERS: &[&str] = &[
  "i feel", "i'm scared", "im scared", "afraid", "lonely", "alone", "anxious",
  "insecure", "struggling", "depressed", "never told", "honestly", "hurts",
  "i'm hurt", "vulnerable",
];

const APOLOGY_MARKERS: &[&str] = &[
  "sorry", "apologize", "apologise", "my bad", "forgive me", "i was wrong",
  "didn't mean", "didnt mean", "my fault",
];

const KIND_MARKERS: &[&str] = &[
  "thank", "appreciate", "you're sweet", "youre sweet", "mean a lot",
  "care about you", "love you", "proud of you", "glad you", "you're the best",
  "you matter",
];

// ─── Classifier ──────────────────────────────────────────────────────────────

/// A [`SentimentClassifier`] over the lexicons above. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
  /// Classify synchronously. Recent context is ignored: the heuristics only
  /// read the message itself.
  pub fn classify_text(&self, message: &str) -> Classification {
    let lowered = message.to_lowercase();
    let cues = detect_cues(&lowered);

    // Phrases are credited whole and cut out, so "my bad" or "I was wrong"
    // never count against the message a second time as single words.
    let mut positive = 0u32;
    let mut scrubbed = lowered.clone();
    for (markers, weight) in [(APOLOGY_MARKERS, APOLOGY_WEIGHT), (KIND_MARKERS, 1)] {
      for &marker in markers {
        let hits = u32::try_from(scrubbed.matches(marker).count()).unwrap_or(u32::MAX);
        if hits > 0 {
          positive = positive.saturating_add(hits.saturating_mul(weight));
          scrubbed = scrubbed.replace(marker, " ");
        }
      }
    }
    let tokens = tokenize(&scrubbed);

    let mut negative = 0u32;
    let mut negate = false;
    for token in &tokens {
      let token = token.as_str();
      if NEGATORS.contains(&token) {
        negate = true;
        continue;
      }
      let is_pos = matches_lexicon(token, POSITIVE_WORDS, POSITIVE_STEMS);
      let is_neg = matches_lexicon(token, NEGATIVE_WORDS, NEGATIVE_STEMS);
      match (is_pos, is_neg, negate) {
        (true, false, false) | (false, true, true) => positive += 1,
        (false, true, false) | (true, false, true) => negative += 1,
        _ => {}
      }
      if is_pos || is_neg {
        negate = false;
      }
    }

    let sentiment = match positive.cmp(&negative) {
      std::cmp::Ordering::Greater => Sentiment::Positive,
      std::cmp::Ordering::Less => Sentiment::Negative,
      std::cmp::Ordering::Equal => Sentiment::Neutral,
    };

    let intensity = match sentiment {
      Sentiment::Neutral => Intensity::MIN,
      Sentiment::Positive | Sentiment::Negative => {
        let margin = positive.abs_diff(negative).min(3) * 2;
        let exclaims = (message.matches('!').count() as u32).min(2);
        let shouting = message
          .split_whitespace()
          .filter(|word| is_shouted(word))
          .count()
          .min(2) as u32;
        let boosted = tokens
          .iter()
          .filter(|t| INTENSIFIERS.contains(&t.as_str()))
          .count()
          .min(2) as u32;
        let raw = 2 + margin + exclaims + shouting + boosted;
        Intensity::new(u8::try_from(raw).unwrap_or(u8::MAX))
      }
    };

    Classification { sentiment, intensity, mood: coarse_mood(sentiment, cues), cues }
  }
}

impl SentimentClassifier for KeywordClassifier {
  type Error = Infallible;

  async fn classify<'a>(
    &'a self,
    message: &'a str,
    _recent: &'a [ContextMessage],
  ) -> Result<Classification, Infallible> {
    Ok(self.classify_text(message))
  }
}

/// Detect content cues in already-lowercased text.
pub fn detect_cues(lowered: &str) -> MessageCues {
  let any = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));
  MessageCues {
    playful:    any(PLAYFUL_MARKERS),
    vulnerable: any(VULNERABLE_MARKERS),
    apologetic: any(APOLOGY_MARKERS),
    kind:       any(KIND_MARKERS),
  }
}

fn matches_lexicon(token: &str, words: &[&str], stems: &[&str]) -> bool {
  words.contains(&token) || stems.iter().any(|s| token.starts_with(s))
}

/// A one-word mood label from the verdict and its cues.
fn coarse_mood(sentiment: Sentiment, cues: MessageCues) -> Option<String> {
  let mood = match sentiment {
    _ if cues.apologetic => "remorseful",
    _ if cues.vulnerable => "anxious",
    Sentiment::Positive if cues.playful => "playful",
    Sentiment::Positive => "happy",
    Sentiment::Negative => "upset",
    Sentiment::Neutral if cues.playful => "playful",
    Sentiment::Neutral => return None,
  };
  Some(mood.to_owned())
}

/// An all-caps word of at least three characters.
fn is_shouted(word: &str) -> bool {
  word.len() > 2
    && word.chars().any(char::is_alphabetic)
    && !word.chars().any(char::is_lowercase)
}

/// Split on anything that is neither alphanumeric nor an apostrophe.
fn tokenize(lowered: &str) -> Vec<String> {
  lowered
    .split(|c: char| !(c.is_alphanumeric() || c == '\''))
    .filter(|t| !t.is_empty())
    .map(str::to_owned)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn classify(text: &str) -> Classification { KeywordClassifier.classify_text(text) }

  #[test]
  fn clear_positive() {
    let c = classify("I love talking to you, this is awesome");
    assert_eq!(c.sentiment, Sentiment::Positive);
    assert!(c.intensity.get() >= 4);
  }

  #[test]
  fn clear_negative() {
    let c = classify("you are useless and I hate this");
    assert_eq!(c.sentiment, Sentiment::Negative);
  }

  #[test]
  fn negation_flips_polarity() {
    assert_eq!(classify("this is not good").sentiment, Sentiment::Negative);
    assert_eq!(classify("I don't hate it").sentiment, Sentiment::Positive);
  }

  #[test]
  fn plain_text_is_neutral_and_weak() {
    let c = classify("what time is it over there");
    assert_eq!(c.sentiment, Sentiment::Neutral);
    assert_eq!(c.intensity, Intensity::MIN);
  }

  #[test]
  fn shouting_is_more_intense() {
    let calm = classify("I hate this");
    let loud = classify("I HATE THIS!!");
    assert!(loud.intensity > calm.intensity);
  }

  #[test]
  fn cues_are_detected() {
    let c = classify("I'm so sorry, I didn't mean it. Thank you for being patient haha");
    assert!(c.cues.apologetic);
    assert!(c.cues.kind);
    assert!(c.cues.playful);
    assert!(!c.cues.vulnerable);
  }

  #[test]
  fn apologies_read_as_positive() {
    for text in [
      "I'm sorry",
      "I'm sorry, I was wrong",
      "sorry, I didn't mean that",
      "I apologize, that was a bad thing to say",
      "my bad, forgive me",
    ] {
      let c = classify(text);
      assert_eq!(c.sentiment, Sentiment::Positive, "{text}");
      assert!(c.cues.apologetic, "{text}");
      assert!(c.cues.acknowledges(), "{text}");
    }
  }

  #[test]
  fn short_stems_only_match_whole_words() {
    for text in [
      "the funeral is likely on friday",
      "goodbye for now",
      "I got a new badge at work",
      "that trick was sick",
      "the mission starts at noon",
    ] {
      assert_eq!(classify(text).sentiment, Sentiment::Neutral, "{text}");
    }
    assert_eq!(classify("that was fun").sentiment, Sentiment::Positive);
    assert_eq!(classify("that was bad").sentiment, Sentiment::Negative);
  }

  #[test]
  fn mood_follows_the_verdict() {
    assert_eq!(classify("this is wonderful").mood.as_deref(), Some("happy"));
    assert_eq!(classify("you are useless").mood.as_deref(), Some("upset"));
    assert_eq!(classify("I'm sorry").mood.as_deref(), Some("remorseful"));
    assert_eq!(classify("haha great one").mood.as_deref(), Some("playful"));
    assert_eq!(classify("what time is it").mood, None);
  }

  #[test]
  fn insult_then_apology_ruptures_and_repairs() {
    use chrono::{Duration, TimeZone, Utc};

    use crate::{event::EventType, scoring::update, state::RelationshipState};

    let t0 = Utc.with_ymd_and_hms(2026, 5, 4, 18, 0, 0).unwrap();
    let start = RelationshipState::new("u", t0);

    let insult = classify("I HATE YOU, you are USELESS and STUPID!!");
    let hurt = update(&start, Some(&insult), t0).unwrap();
    assert!(hurt.state.is_ruptured);

    let apology = classify("I'm so sorry, I was wrong");
    let mended = update(&hurt.state, Some(&apology), t0 + Duration::minutes(1)).unwrap();
    assert!(!mended.state.is_ruptured);
    assert!(mended.state.dimensions.trust > hurt.state.dimensions.trust);
    assert_eq!(mended.primary_event().unwrap().event_type, EventType::Repair);
    assert_eq!(mended.primary_event().unwrap().user_mood.as_deref(), Some("remorseful"));
  }

  #[tokio::test]
  async fn trait_impl_never_fails() {
    let c = KeywordClassifier.classify("lol you're the best", &[]).await.unwrap();
    assert_eq!(c.sentiment, Sentiment::Positive);
    assert!(c.cues.playful && c.cues.kind);
  }
}
