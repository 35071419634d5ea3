//! SQL schema for the Kontak SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS contacts (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    phone       TEXT,            -- normalised; NULL when absent
    ewallet     TEXT NOT NULL DEFAULT '[]',   -- JSON array of provider tags
    email       TEXT,
    company     TEXT,
    notes       TEXT,
    created_at  TEXT NOT NULL,   -- ISO 8601 UTC; store-assigned
    updated_at  TEXT NOT NULL
);

-- One owner per phone number.
CREATE UNIQUE INDEX IF NOT EXISTS contacts_phone_unique
    ON contacts(phone) WHERE phone IS NOT NULL;

CREATE INDEX IF NOT EXISTS contacts_name_idx ON contacts(name COLLATE NOCASE);

PRAGMA user_version = 1;
";
