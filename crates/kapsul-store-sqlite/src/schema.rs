//! SQL schema for the Kapsul SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Dates are Persian YYYY/MM/DD strings, never converted.
-- status is written on every mutation but recomputed on read.
CREATE TABLE IF NOT EXISTS extinguishers (
    id                 TEXT PRIMARY KEY,
    code               TEXT NOT NULL,
    location           TEXT NOT NULL,
    type               TEXT NOT NULL DEFAULT 'powder',
    capacity           TEXT NOT NULL DEFAULT '6',
    last_recharge_date TEXT NOT NULL DEFAULT '',
    next_recharge_date TEXT NOT NULL DEFAULT '',
    status             TEXT NOT NULL DEFAULT 'active',
    notes              TEXT NOT NULL DEFAULT '',
    created_at         TEXT NOT NULL,   -- RFC 3339 UTC, fixed precision
    updated_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    full_name     TEXT NOT NULL,
    password_hash TEXT NOT NULL,       -- argon2 PHC string
    role          TEXT NOT NULL DEFAULT 'viewer',
    created_at    TEXT NOT NULL
);

-- Bearer tokens are never stored; only their SHA-256.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS extinguishers_created_idx ON extinguishers(created_at);
CREATE INDEX IF NOT EXISTS extinguishers_code_idx    ON extinguishers(code);
CREATE INDEX IF NOT EXISTS sessions_user_idx         ON sessions(user_id);

PRAGMA user_version = 1;
";
