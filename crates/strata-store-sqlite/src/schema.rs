//! SQL schema for the Strata SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per historical version of a way.
-- Rows are never deleted; the only column ever updated is redaction_id.
CREATE TABLE IF NOT EXISTS ways (
    way_id       INTEGER NOT NULL,
    version      INTEGER NOT NULL,
    changeset_id INTEGER NOT NULL,
    timestamp    TEXT    NOT NULL,   -- ISO 8601 UTC
    visible      INTEGER NOT NULL,   -- 0 = deleted state, 1 = live state
    redaction_id INTEGER,            -- NULL unless redacted
    PRIMARY KEY (way_id, version)
);

CREATE TABLE IF NOT EXISTS way_tags (
    way_id  INTEGER NOT NULL,
    version INTEGER NOT NULL,
    k       TEXT    NOT NULL,
    v       TEXT    NOT NULL,
    PRIMARY KEY (way_id, version, k),
    FOREIGN KEY (way_id, version) REFERENCES ways (way_id, version)
);

CREATE TABLE IF NOT EXISTS way_nodes (
    way_id      INTEGER NOT NULL,
    version     INTEGER NOT NULL,
    sequence_id INTEGER NOT NULL,   -- 1-based, contiguous, preserves write order
    node_id     INTEGER NOT NULL,
    PRIMARY KEY (way_id, version, sequence_id),
    FOREIGN KEY (way_id, version) REFERENCES ways (way_id, version)
);

CREATE INDEX IF NOT EXISTS ways_changeset_idx ON ways (changeset_id);
CREATE INDEX IF NOT EXISTS ways_timestamp_idx ON ways (timestamp);

PRAGMA user_version = 1;
";
