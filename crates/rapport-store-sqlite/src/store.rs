//! [`SqliteStore`]: the SQLite implementation of [`RelationshipStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, ToSql, Transaction};
use uuid::Uuid;

use rapport_core::{
  event::RelationshipEvent,
  state::{RelationshipState, Transition},
  store::{CommitOutcome, RelationshipStore},
};

use crate::{
  encode::{
    encode_count, encode_dt, encode_uuid, RawEvent, RawState, EVENT_COLUMNS,
    STATE_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

const INSERT_STATE: &str = "
  INSERT INTO relationships (
    relationship_id, user_id, relationship_score, relationship_tier,
    warmth_score, trust_score, playfulness_score, stability_score,
    familiarity_stage, total_interactions, positive_interactions,
    negative_interactions, first_interaction_at, last_interaction_at,
    is_ruptured, last_rupture_at, rupture_count, decay_applied,
    created_at, updated_at, version
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
            ?15, ?16, ?17, ?18, ?19, ?20, ?21)";

const UPDATE_STATE: &str = "
  UPDATE relationships SET
    relationship_score    = ?3,
    relationship_tier     = ?4,
    warmth_score          = ?5,
    trust_score           = ?6,
    playfulness_score     = ?7,
    stability_score       = ?8,
    familiarity_stage     = ?9,
    total_interactions    = ?10,
    positive_interactions = ?11,
    negative_interactions = ?12,
    first_interaction_at  = ?13,
    last_interaction_at   = ?14,
    is_ruptured           = ?15,
    last_rupture_at       = ?16,
    rupture_count         = ?17,
    decay_applied         = ?18,
    created_at            = ?19,
    updated_at            = ?20,
    version               = ?21
  WHERE relationship_id = ?1 AND user_id = ?2 AND version = ?22";

const INSERT_EVENT: &str = "
  INSERT INTO relationship_events (
    event_id, relationship_id, event_type, source, sentiment,
    sentiment_intensity, user_mood, score_change, warmth_change, trust_change,
    playfulness_change, stability_change, score_before, score_after,
    tier_before, tier_after, created_at
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
            ?15, ?16, ?17)";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A relationship store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT {STATE_COLUMNS} ...` query and decode every row.
  async fn query_states(
    &self,
    sql:   String,
    param: Option<String>,
  ) -> Result<Vec<RelationshipState>> {
    let raws: Vec<RawState> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = match param {
          Some(p) => stmt.query_map(rusqlite::params![p], RawState::from_row)?,
          None => stmt.query_map([], RawState::from_row)?,
        }
        .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawState::into_state).collect()
  }

  /// Raw SQL access for tests that need to poke at the tables directly.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    Ok(self.conn.call(move |conn| Ok(conn.execute(sql, [])?)).await?)
  }
}

fn state_params(raw: &RawState) -> [&dyn ToSql; 21] {
  [
    &raw.relationship_id,
    &raw.user_id,
    &raw.relationship_score,
    &raw.relationship_tier,
    &raw.warmth_score,
    &raw.trust_score,
    &raw.playfulness_score,
    &raw.stability_score,
    &raw.familiarity_stage,
    &raw.total_interactions,
    &raw.positive_interactions,
    &raw.negative_interactions,
    &raw.first_interaction_at,
    &raw.last_interaction_at,
    &raw.is_ruptured,
    &raw.last_rupture_at,
    &raw.rupture_count,
    &raw.decay_applied,
    &raw.created_at,
    &raw.updated_at,
    &raw.version,
  ]
}

fn insert_event(tx: &Transaction<'_>, raw: &RawEvent) -> rusqlite::Result<()> {
  tx.execute(
    INSERT_EVENT,
    rusqlite::params![
      raw.event_id,
      raw.relationship_id,
      raw.event_type,
      raw.source,
      raw.sentiment,
      raw.sentiment_intensity,
      raw.user_mood,
      raw.score_change,
      raw.warmth_change,
      raw.trust_change,
      raw.playfulness_change,
      raw.stability_change,
      raw.score_before,
      raw.score_after,
      raw.tier_before,
      raw.tier_after,
      raw.created_at,
    ],
  )?;
  Ok(())
}

/// A first write lost the race: the `user_id` (or the generated primary key)
/// already exists.
fn is_duplicate_row(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.code == rusqlite::ErrorCode::ConstraintViolation
        && matches!(
          e.extended_code,
          rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
  )
}

// ─── RelationshipStore impl ──────────────────────────────────────────────────

impl RelationshipStore for SqliteStore {
  type Error = Error;

  async fn get_relationship<'a>(
    &'a self,
    user_id: &'a str,
  ) -> Result<Option<RelationshipState>> {
    let user_id = user_id.to_owned();

    let raw: Option<RawState> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {STATE_COLUMNS} FROM relationships WHERE user_id = ?1"),
            rusqlite::params![user_id],
            RawState::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawState::into_state).transpose()
  }

  async fn list_relationships(&self) -> Result<Vec<RelationshipState>> {
    self
      .query_states(
        format!("SELECT {STATE_COLUMNS} FROM relationships ORDER BY user_id"),
        None,
      )
      .await
  }

  async fn list_idle(&self, cutoff: DateTime<Utc>) -> Result<Vec<RelationshipState>> {
    self
      .query_states(
        format!(
          "SELECT {STATE_COLUMNS} FROM relationships
           WHERE last_interaction_at IS NOT NULL
             AND last_interaction_at < ?1
             AND relationship_score > -10
           ORDER BY user_id"
        ),
        Some(encode_dt(cutoff)),
      )
      .await
  }

  async fn list_events(&self, relationship_id: Uuid) -> Result<Vec<RelationshipEvent>> {
    let id_str = encode_uuid(relationship_id);

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM relationship_events
           WHERE relationship_id = ?1
           ORDER BY sequence"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn commit(&self, transition: Transition) -> Result<CommitOutcome> {
    let Transition { base_version, state, events } = transition;

    // Refuse to persist anything the pure engine should never have produced.
    state.check_invariants()?;

    let raw_state = RawState::from_state(&state);
    // Hand back what a later read will see: timestamps at stored precision.
    let persisted = RawState::from_state(&state).into_state()?;
    let raw_events: Vec<RawEvent> = events
      .iter()
      .map(|ev| RawEvent::from_new(Uuid::new_v4(), ev))
      .collect();
    let base = encode_count(base_version);

    let committed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let params = state_params(&raw_state);

        if base == 0 {
          match tx.execute(INSERT_STATE, params.as_slice()) {
            Ok(_) => {}
            Err(e) if is_duplicate_row(&e) => return Ok(false),
            Err(e) => return Err(e.into()),
          }
        } else {
          let mut guarded = params.to_vec();
          guarded.push(&base);
          if tx.execute(UPDATE_STATE, guarded.as_slice())? == 0 {
            return Ok(false);
          }
        }

        for raw in &raw_events {
          insert_event(&tx, raw)?;
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(if committed { CommitOutcome::Committed(persisted) } else { CommitOutcome::Conflict })
  }
}
