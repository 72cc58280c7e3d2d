use rusqlite::Connection;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA cache_size = -32000;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS sites (
    site_id BLOB PRIMARY KEY CHECK (length(site_id) = 16),
    name TEXT NOT NULL,
    plan TEXT NOT NULL CHECK (plan IN ('basic', 'pro'))
);

CREATE TABLE IF NOT EXISTS users (
    user_id BLOB PRIMARY KEY CHECK (length(user_id) = 16),
    site_id BLOB NOT NULL REFERENCES sites (site_id),
    email TEXT NOT NULL UNIQUE,
    password_hash BLOB NOT NULL CHECK (length(password_hash) = 32),
    salt BLOB NOT NULL CHECK (length(salt) = 16),
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    site_id BLOB NOT NULL CHECK (length(site_id) = 16),
    content_type TEXT NOT NULL,
    subtype TEXT NOT NULL,
    document_id BLOB NOT NULL UNIQUE CHECK (length(document_id) = 16),
    content BLOB NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (site_id, content_type, subtype)
);

CREATE TABLE IF NOT EXISTS blobs (
    hash BLOB NOT NULL CHECK (length(hash) = 32),
    content_type TEXT NOT NULL,
    size INTEGER NOT NULL,
    data BLOB NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (hash, content_type)
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL
);
";
