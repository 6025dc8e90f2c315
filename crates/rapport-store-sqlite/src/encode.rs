//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that lexical order in SQL equals chronological order. Enum
//! discriminants are stored as their snake_case names. UUIDs are stored as
//! hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rapport_core::{
  event::{NewEvent, RelationshipEvent},
  sentiment::Intensity,
  state::{Dimensions, RelationshipState},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Discriminants and counters ──────────────────────────────────────────────

/// Parse a snake_case discriminant written by `AsRef<str>`.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Corrupt { column, value: s.to_owned() })
}

/// Counters are `u64` in the domain and `INTEGER` (i64) in SQLite.
pub fn encode_count(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

pub fn decode_count(column: &'static str, n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Corrupt { column, value: n.to_string() })
}

fn decode_intensity(n: Option<i64>) -> Result<Option<Intensity>> {
  n.map(|n| {
      u8::try_from(n)
        .ok()
        .filter(|v| (1..=10).contains(v))
        .map(Intensity::new)
        .ok_or(Error::Corrupt {
          column: "sentiment_intensity",
          value:  n.to_string(),
        })
    })
    .transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawState`]'s field order.
pub const STATE_COLUMNS: &str = "
  relationship_id, user_id, relationship_score, relationship_tier,
  warmth_score, trust_score, playfulness_score, stability_score,
  familiarity_stage, total_interactions, positive_interactions,
  negative_interactions, first_interaction_at, last_interaction_at,
  is_ruptured, last_rupture_at, rupture_count, decay_applied,
  created_at, updated_at, version";

/// Raw values read directly from a `relationships` row.
pub struct RawState {
  pub relationship_id:       String,
  pub user_id:               String,
  pub relationship_score:    f64,
  pub relationship_tier:     String,
  pub warmth_score:          f64,
  pub trust_score:           f64,
  pub playfulness_score:     f64,
  pub stability_score:       f64,
  pub familiarity_stage:     String,
  pub total_interactions:    i64,
  pub positive_interactions: i64,
  pub negative_interactions: i64,
  pub first_interaction_at:  Option<String>,
  pub last_interaction_at:   Option<String>,
  pub is_ruptured:           bool,
  pub last_rupture_at:       Option<String>,
  pub rupture_count:         i64,
  pub decay_applied:         f64,
  pub created_at:            String,
  pub updated_at:            String,
  pub version:               i64,
}

impl RawState {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      relationship_id:       row.get(0)?,
      user_id:               row.get(1)?,
      relationship_score:    row.get(2)?,
      relationship_tier:     row.get(3)?,
      warmth_score:          row.get(4)?,
      trust_score:           row.get(5)?,
      playfulness_score:     row.get(6)?,
      stability_score:       row.get(7)?,
      familiarity_stage:     row.get(8)?,
      total_interactions:    row.get(9)?,
      positive_interactions: row.get(10)?,
      negative_interactions: row.get(11)?,
      first_interaction_at:  row.get(12)?,
      last_interaction_at:   row.get(13)?,
      is_ruptured:           row.get(14)?,
      last_rupture_at:       row.get(15)?,
      rupture_count:         row.get(16)?,
      decay_applied:         row.get(17)?,
      created_at:            row.get(18)?,
      updated_at:            row.get(19)?,
      version:               row.get(20)?,
    })
  }

  pub fn from_state(s: &RelationshipState) -> Self {
    Self {
      relationship_id:       encode_uuid(s.relationship_id),
      user_id:               s.user_id.clone(),
      relationship_score:    s.relationship_score,
      relationship_tier:     s.relationship_tier.as_ref().to_owned(),
      warmth_score:          s.dimensions.warmth,
      trust_score:           s.dimensions.trust,
      playfulness_score:     s.dimensions.playfulness,
      stability_score:       s.dimensions.stability,
      familiarity_stage:     s.familiarity_stage.as_ref().to_owned(),
      total_interactions:    encode_count(s.total_interactions),
      positive_interactions: encode_count(s.positive_interactions),
      negative_interactions: encode_count(s.negative_interactions),
      first_interaction_at:  s.first_interaction_at.map(encode_dt),
      last_interaction_at:   s.last_interaction_at.map(encode_dt),
      is_ruptured:           s.is_ruptured,
      last_rupture_at:       s.last_rupture_at.map(encode_dt),
      rupture_count:         encode_count(s.rupture_count),
      decay_applied:         s.decay_applied,
      created_at:            encode_dt(s.created_at),
      updated_at:            encode_dt(s.updated_at),
      version:               encode_count(s.version),
    }
  }

  pub fn into_state(self) -> Result<RelationshipState> {
    Ok(RelationshipState {
      relationship_id:       decode_uuid(&self.relationship_id)?,
      user_id:               self.user_id,
      relationship_score:    self.relationship_score,
      relationship_tier:     decode_enum("relationship_tier", &self.relationship_tier)?,
      dimensions:            Dimensions {
        warmth:      self.warmth_score,
        trust:       self.trust_score,
        playfulness: self.playfulness_score,
        stability:   self.stability_score,
      },
      familiarity_stage:     decode_enum("familiarity_stage", &self.familiarity_stage)?,
      total_interactions:    decode_count("total_interactions", self.total_interactions)?,
      positive_interactions: decode_count("positive_interactions", self.positive_interactions)?,
      negative_interactions: decode_count("negative_interactions", self.negative_interactions)?,
      first_interaction_at:  decode_opt_dt(self.first_interaction_at)?,
      last_interaction_at:   decode_opt_dt(self.last_interaction_at)?,
      is_ruptured:           self.is_ruptured,
      last_rupture_at:       decode_opt_dt(self.last_rupture_at)?,
      rupture_count:         decode_count("rupture_count", self.rupture_count)?,
      decay_applied:         self.decay_applied,
      created_at:            decode_dt(&self.created_at)?,
      updated_at:            decode_dt(&self.updated_at)?,
      version:               decode_count("version", self.version)?,
    })
  }
}

/// Raw values read directly from a `relationship_events` row.
pub struct RawEvent {
  pub sequence:            i64,
  pub event_id:            String,
  pub relationship_id:     String,
  pub event_type:          String,
  pub source:              String,
  pub sentiment:           Option<String>,
  pub sentiment_intensity: Option<i64>,
  pub user_mood:           Option<String>,
  pub score_change:        f64,
  pub warmth_change:       f64,
  pub trust_change:        f64,
  pub playfulness_change:  f64,
  pub stability_change:    f64,
  pub score_before:        f64,
  pub score_after:         f64,
  pub tier_before:         String,
  pub tier_after:          String,
  pub created_at:          String,
}

/// Column list matching [`RawEvent`]'s field order.
pub const EVENT_COLUMNS: &str = "
  sequence, event_id, relationship_id, event_type, source, sentiment,
  sentiment_intensity, user_mood, score_change, warmth_change, trust_change,
  playfulness_change, stability_change, score_before, score_after,
  tier_before, tier_after, created_at";

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      sequence:            row.get(0)?,
      event_id:            row.get(1)?,
      relationship_id:     row.get(2)?,
      event_type:          row.get(3)?,
      source:              row.get(4)?,
      sentiment:           row.get(5)?,
      sentiment_intensity: row.get(6)?,
      user_mood:           row.get(7)?,
      score_change:        row.get(8)?,
      warmth_change:       row.get(9)?,
      trust_change:        row.get(10)?,
      playfulness_change:  row.get(11)?,
      stability_change:    row.get(12)?,
      score_before:        row.get(13)?,
      score_after:         row.get(14)?,
      tier_before:         row.get(15)?,
      tier_after:          row.get(16)?,
      created_at:          row.get(17)?,
    })
  }

  /// Encode an event for insertion. `sequence` is assigned by SQLite, so the
  /// value here is ignored.
  pub fn from_new(event_id: Uuid, ev: &NewEvent) -> Self {
    Self {
      sequence:            0,
      event_id:            encode_uuid(event_id),
      relationship_id:     encode_uuid(ev.relationship_id),
      event_type:          ev.event_type.as_ref().to_owned(),
      source:              ev.source.as_ref().to_owned(),
      sentiment:           ev.sentiment.map(|s| s.as_ref().to_owned()),
      sentiment_intensity: ev.sentiment_intensity.map(|i| i64::from(i.get())),
      user_mood:           ev.user_mood.clone(),
      score_change:        ev.score_change,
      warmth_change:       ev.dimension_changes.warmth,
      trust_change:        ev.dimension_changes.trust,
      playfulness_change:  ev.dimension_changes.playfulness,
      stability_change:    ev.dimension_changes.stability,
      score_before:        ev.score_before,
      score_after:         ev.score_after,
      tier_before:         ev.tier_before.as_ref().to_owned(),
      tier_after:          ev.tier_after.as_ref().to_owned(),
      created_at:          encode_dt(ev.created_at),
    }
  }

  pub fn into_event(self) -> Result<RelationshipEvent> {
    Ok(RelationshipEvent {
      event_id: decode_uuid(&self.event_id)?,
      sequence: self.sequence,
      event:    NewEvent {
        relationship_id:     decode_uuid(&self.relationship_id)?,
        event_type:          decode_enum("event_type", &self.event_type)?,
        source:              decode_enum("source", &self.source)?,
        sentiment:           self
          .sentiment
          .as_deref()
          .map(|s| decode_enum("sentiment", s))
          .transpose()?,
        sentiment_intensity: decode_intensity(self.sentiment_intensity)?,
        user_mood:           self.user_mood,
        score_change:        self.score_change,
        dimension_changes:   Dimensions {
          warmth:      self.warmth_change,
          trust:       self.trust_change,
          playfulness: self.playfulness_change,
          stability:   self.stability_change,
        },
        score_before:        self.score_before,
        score_after:         self.score_after,
        tier_before:         decode_enum("tier_before", &self.tier_before)?,
        tier_after:          decode_enum("tier_after", &self.tier_after)?,
        created_at:          decode_dt(&self.created_at)?,
      },
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::Duration::microseconds(1500);
    let c = a + chrono::Duration::days(400);
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb && eb < ec);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn negative_counter_is_corrupt() {
    assert!(matches!(
      decode_count("total_interactions", -1),
      Err(Error::Corrupt { column: "total_interactions", .. })
    ));
  }
}
