//! SQL schema for the Rota SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Directory tables: owned by the surrounding application, read by the engine.
CREATE TABLE IF NOT EXISTS sectors (
    sector_id INTEGER PRIMARY KEY,
    name      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    user_id          INTEGER PRIMARY KEY,
    display_name     TEXT,
    is_duty_eligible INTEGER NOT NULL DEFAULT 0
);

-- Soft-deleted via is_active; rows are never removed.
CREATE TABLE IF NOT EXISTS pool_entries (
    user_id   INTEGER NOT NULL REFERENCES users(user_id),
    sector_id INTEGER NOT NULL REFERENCES sectors(sector_id),
    is_active INTEGER NOT NULL DEFAULT 1,
    added_at  TEXT NOT NULL,          -- RFC 3339 UTC, fixed microsecond width
    added_by  INTEGER,
    PRIMARY KEY (user_id, sector_id)
);

CREATE TABLE IF NOT EXISTS assignments (
    assignment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL REFERENCES users(user_id),
    sector_id     INTEGER NOT NULL REFERENCES sectors(sector_id),
    duty_date     TEXT NOT NULL,      -- YYYY-MM-DD
    period_start  TEXT NOT NULL,      -- YYYY-MM-DD
    created_at    TEXT NOT NULL,
    created_by    INTEGER,
    UNIQUE (sector_id, duty_date)
);

-- total_duties mirrors the assignment count for (user, sector, year).
CREATE TABLE IF NOT EXISTS statistics (
    user_id        INTEGER NOT NULL,
    sector_id      INTEGER NOT NULL,
    year           INTEGER NOT NULL,
    total_duties   INTEGER NOT NULL DEFAULT 0,
    last_duty_date TEXT,
    updated_at     TEXT NOT NULL,
    PRIMARY KEY (user_id, sector_id, year),
    CHECK (total_duties >= 0)
);

CREATE INDEX IF NOT EXISTS assignments_user_idx ON assignments(user_id, sector_id, duty_date);
CREATE INDEX IF NOT EXISTS assignments_date_idx ON assignments(duty_date);

PRAGMA user_version = 1;
";
