//! SQL schema for the Rapport SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS relationships (
    relationship_id       TEXT PRIMARY KEY,
    user_id               TEXT NOT NULL UNIQUE,
    relationship_score    REAL NOT NULL CHECK (relationship_score BETWEEN -100 AND 100),
    relationship_tier     TEXT NOT NULL CHECK (relationship_tier IN (
                            'adversarial', 'neutral_negative', 'acquaintance',
                            'friend', 'close_friend', 'deeply_loving')),
    warmth_score          REAL NOT NULL CHECK (warmth_score      BETWEEN -50 AND 50),
    trust_score           REAL NOT NULL CHECK (trust_score       BETWEEN -50 AND 50),
    playfulness_score     REAL NOT NULL CHECK (playfulness_score BETWEEN -50 AND 50),
    stability_score       REAL NOT NULL CHECK (stability_score   BETWEEN -50 AND 50),
    familiarity_stage     TEXT NOT NULL CHECK (familiarity_stage IN (
                            'early', 'developing', 'established')),
    total_interactions    INTEGER NOT NULL CHECK (total_interactions    >= 0),
    positive_interactions INTEGER NOT NULL CHECK (positive_interactions >= 0),
    negative_interactions INTEGER NOT NULL CHECK (negative_interactions >= 0),
    first_interaction_at  TEXT,           -- RFC 3339 UTC, fixed width
    last_interaction_at   TEXT,           -- RFC 3339 UTC, fixed width
    is_ruptured           INTEGER NOT NULL CHECK (is_ruptured IN (0, 1)),
    last_rupture_at       TEXT,
    rupture_count         INTEGER NOT NULL CHECK (rupture_count >= 0),
    decay_applied         REAL NOT NULL DEFAULT 0 CHECK (decay_applied >= 0),
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL,
    version               INTEGER NOT NULL CHECK (version >= 1),
    CHECK (positive_interactions + negative_interactions <= total_interactions)
);

-- Events are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table; the triggers below
-- refuse them outright.
CREATE TABLE IF NOT EXISTS relationship_events (
    sequence            INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id            TEXT NOT NULL UNIQUE,
    relationship_id     TEXT NOT NULL REFERENCES relationships(relationship_id),
    event_type          TEXT NOT NULL CHECK (event_type IN (
                          'positive', 'negative', 'neutral',
                          'milestone', 'rupture', 'repair')),
    source              TEXT NOT NULL CHECK (source IN (
                          'chat', 'system', 'decay', 'milestone')),
    sentiment           TEXT CHECK (sentiment IN ('positive', 'neutral', 'negative')),
    sentiment_intensity INTEGER CHECK (sentiment_intensity BETWEEN 1 AND 10),
    user_mood           TEXT,
    score_change        REAL NOT NULL,   -- raw, pre-clamp
    warmth_change       REAL NOT NULL,
    trust_change        REAL NOT NULL,
    playfulness_change  REAL NOT NULL,
    stability_change    REAL NOT NULL,
    score_before        REAL NOT NULL,
    score_after         REAL NOT NULL,
    tier_before         TEXT NOT NULL,
    tier_after          TEXT NOT NULL,
    created_at          TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS relationship_events_no_update
BEFORE UPDATE ON relationship_events
BEGIN
    SELECT RAISE(ABORT, 'relationship_events is append-only');
END;

CREATE TRIGGER IF NOT EXISTS relationship_events_no_delete
BEFORE DELETE ON relationship_events
BEGIN
    SELECT RAISE(ABORT, 'relationship_events is append-only');
END;

CREATE INDEX IF NOT EXISTS relationships_idle_idx
    ON relationships(last_interaction_at);
CREATE INDEX IF NOT EXISTS events_relationship_idx
    ON relationship_events(relationship_id, sequence);

PRAGMA user_version = 1;
";
