//! Database module for VKinder
//!
//! Persists the catalog of found users and the favorites list.

mod schema;

pub use schema::*;

use crate::candidate::Candidate;
use crate::criteria::Criteria;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Database lock poisoned")]
    LockPoisoned,
    #[error("Found user not found: {0}")]
    FoundUserNotFound(i64),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> DbResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    // ==================== Catalog Operations ====================

    /// Insert or refresh a found user keyed by VK id; returns the catalog id
    pub fn upsert_found_user(&self, candidate: &Candidate, criteria: &Criteria) -> DbResult<i64> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let photos = serde_json::to_string(&candidate.photos)?;

        let id = conn.query_row(
            "INSERT INTO found_users (vk_id, first_name, last_name, city, gender, age, top_photos, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             ON CONFLICT(vk_id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                top_photos = excluded.top_photos,
                updated_at = excluded.updated_at
             RETURNING id",
            params![
                candidate.vk_id,
                candidate.first_name,
                candidate.last_name,
                criteria.city.as_str(),
                criteria.gender.as_str(),
                criteria.age.years(),
                photos,
                now,
            ],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    /// Look up a catalog entry by its id
    #[allow(dead_code)] // Used in tests
    pub fn get_found_user(&self, id: i64) -> DbResult<Candidate> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT vk_id, first_name, last_name, top_photos FROM found_users WHERE id = ?1",
            params![id],
            |row| Ok(row_to_candidate(row.get(0)?, row.get(1)?, row.get(2)?, &row.get::<_, String>(3)?)),
        )
        .optional()?
        .ok_or(DbError::FoundUserNotFound(id))
    }

    /// Number of catalog entries
    #[allow(dead_code)] // Used in tests
    pub fn found_user_count(&self) -> DbResult<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM found_users", [], |row| row.get(0))?)
    }

    // ==================== Favorites Operations ====================

    /// Link a catalog entry as favorite. Returns false if it already was one.
    pub fn add_favorite(&self, found_user_id: i64) -> DbResult<bool> {
        let conn = self.conn()?;
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM found_users WHERE id = ?1",
                params![found_user_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(DbError::FoundUserNotFound(found_user_id));
        }

        let inserted = conn.execute(
            "INSERT INTO favorites (found_user_id, created_at) VALUES (?1, ?2)
             ON CONFLICT(found_user_id) DO NOTHING",
            params![found_user_id, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    /// All favorites in the order they were added
    pub fn list_favorites(&self) -> DbResult<Vec<FavoriteRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT fu.id, fu.vk_id, fu.first_name, fu.last_name, fu.top_photos, f.created_at
             FROM favorites f
             JOIN found_users fu ON f.found_user_id = fu.id
             ORDER BY f.id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(FavoriteRecord {
                found_user_id: row.get(0)?,
                candidate: row_to_candidate(
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    &row.get::<_, String>(4)?,
                ),
                added_at: parse_datetime(&row.get::<_, String>(5)?),
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Remove every favorite link; catalog entries are kept
    pub fn clear_favorites(&self) -> DbResult<usize> {
        let conn = self.conn()?;
        Ok(conn.execute("DELETE FROM favorites", [])?)
    }
}

fn row_to_candidate(vk_id: i64, first_name: String, last_name: String, photos: &str) -> Candidate {
    Candidate {
        vk_id,
        first_name,
        last_name,
        photos: serde_json::from_str(photos).unwrap_or_default(),
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
