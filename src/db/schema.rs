//! Database schema and types

use crate::candidate::Candidate;
use chrono::{DateTime, Utc};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS found_users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vk_id INTEGER NOT NULL UNIQUE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    city TEXT,
    gender TEXT,
    age INTEGER,
    top_photos TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS favorites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    found_user_id INTEGER NOT NULL UNIQUE,
    created_at TEXT NOT NULL,

    FOREIGN KEY (found_user_id) REFERENCES found_users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_found_users_vk_id ON found_users(vk_id);
";

/// A saved favorite joined with its catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteRecord {
    /// Catalog row id
    pub found_user_id: i64,
    pub candidate: Candidate,
    pub added_at: DateTime<Utc>,
}
