//! SQL schema for the Tracer SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS places (
    place_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS people (
    subject_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

-- Intervals carry snapshots of the subject and place names rather than
-- foreign keys: references may be resolved by a remote directory.
CREATE TABLE IF NOT EXISTS intervals (
    interval_id   TEXT PRIMARY KEY,
    subject_id    TEXT NOT NULL,
    subject_name  TEXT NOT NULL,
    place_id      TEXT,
    place_name    TEXT,
    scope_key     TEXT NOT NULL,   -- subject_id, or subject_id/place_id
    start_at      TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    end_at        TEXT,            -- NULL while open
    CHECK (end_at IS NULL OR end_at >= start_at)
);

-- At most one open interval per presence scope.
CREATE UNIQUE INDEX IF NOT EXISTS intervals_open_scope_idx
    ON intervals(scope_key) WHERE end_at IS NULL;

CREATE INDEX IF NOT EXISTS intervals_subject_idx ON intervals(subject_id);
CREATE INDEX IF NOT EXISTS intervals_place_idx   ON intervals(place_id);
CREATE INDEX IF NOT EXISTS intervals_start_idx   ON intervals(start_at);

PRAGMA user_version = 1;
";
