//! SQL schema for the SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,   -- lowercased
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS debts (
    debt_id     TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    name        TEXT NOT NULL,
    amount      REAL NOT NULL,
    private     INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    description TEXT,
    category    TEXT,                     -- DebtCategory::as_str or NULL
    color       TEXT
);

-- Balance history is strictly append-only.
-- Rows disappear only when their debt is deleted.
CREATE TABLE IF NOT EXISTS debt_history (
    history_id  TEXT PRIMARY KEY,
    debt_id     TEXT NOT NULL REFERENCES debts(debt_id) ON DELETE CASCADE,
    amount      REAL NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS debt_comments (
    comment_id  TEXT PRIMARY KEY,
    debt_id     TEXT NOT NULL REFERENCES debts(debt_id) ON DELETE CASCADE,
    history_id  TEXT REFERENCES debt_history(history_id) ON DELETE CASCADE,
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    comment     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS debts_user_idx       ON debts(user_id);
CREATE INDEX IF NOT EXISTS history_debt_idx     ON debt_history(debt_id, recorded_at);
CREATE INDEX IF NOT EXISTS comments_debt_idx    ON debt_comments(debt_id, created_at);

PRAGMA user_version = 1;
";
