//! SQLite-backed document store for schedule days and the user directory.
//!
//! The database lives at `~/.oncall/roster.db`. The store contract is the
//! narrow one the engine depends on: document-level get / set (idempotent
//! full replace) / delete, plus a key-range query. No multi-statement
//! transactions — the engine's delete-then-write and write-then-delete
//! sequences are separate store calls, and their non-atomicity is part of
//! the documented semantics.
//!
//! Documents are validated at this boundary: a `schedule_days.doc` blob
//! that fails to deserialize, or whose embedded key disagrees with the row
//! key, is a typed error — malformed data never propagates inward.

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::types::{parse_date_key, ScheduleDay, UserIdentity};

/// Errors specific to store operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("home directory not found")]
    HomeDirNotFound,

    #[error("failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("malformed schedule document {key}: {message}")]
    MalformedDoc { key: String, message: String },
}

/// SQLite connection wrapper for the roster store.
///
/// Intentionally not `Clone` or `Sync`; all engine operations are
/// request-scoped, single-threaded batch jobs over one connection.
pub struct RosterDb {
    conn: Connection,
}

impl RosterDb {
    /// Open (or create) the database at `~/.oncall/roster.db` and apply the schema.
    pub fn open() -> Result<Self, DbError> {
        Self::open_at(Self::db_path()?)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_conn(conn)
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::with_conn(Connection::open_in_memory()?)
    }

    fn with_conn(conn: Connection) -> Result<Self, DbError> {
        // Schema statements all use IF NOT EXISTS, so this is idempotent
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.oncall/roster.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".oncall").join("roster.db"))
    }

    // ------------------------------------------------------------------
    // Schedule days
    // ------------------------------------------------------------------

    /// Fetch one day by key. `Ok(None)` when absent.
    pub fn get_day(&self, date_key: &str) -> Result<Option<ScheduleDay>, DbError> {
        let doc: Option<String> = self
            .conn
            .query_row(
                "SELECT doc FROM schedule_days WHERE date_key = ?1",
                params![date_key],
                |row| row.get(0),
            )
            .optional()?;

        match doc {
            Some(doc) => Ok(Some(decode_day(date_key, &doc)?)),
            None => Ok(None),
        }
    }

    /// Idempotent full replace of one day document, keyed by its `date_key`.
    pub fn set_day(&self, day: &ScheduleDay) -> Result<(), DbError> {
        let doc = serde_json::to_string(day).map_err(|e| DbError::MalformedDoc {
            key: day.date_key.clone(),
            message: e.to_string(),
        })?;
        self.conn.execute(
            "INSERT INTO schedule_days (date_key, doc, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(date_key) DO UPDATE SET doc = ?2, created_at = ?3",
            params![&day.date_key, &doc, &day.created_at],
        )?;
        Ok(())
    }

    /// Delete one day. Returns whether a document existed.
    pub fn delete_day(&self, date_key: &str) -> Result<bool, DbError> {
        let n = self.conn.execute(
            "DELETE FROM schedule_days WHERE date_key = ?1",
            params![date_key],
        )?;
        Ok(n > 0)
    }

    /// Keys of all days whose key falls in `[from_key, to_key]`, ordered.
    ///
    /// Keys are zero-padded `YYYY-MM-DD` strings, so lexicographic range
    /// equals calendar range.
    pub fn day_keys_in_range(&self, from_key: &str, to_key: &str) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT date_key FROM schedule_days
             WHERE date_key >= ?1 AND date_key <= ?2
             ORDER BY date_key",
        )?;
        let keys = stmt
            .query_map(params![from_key, to_key], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    /// All days whose key falls in `[from_key, to_key]`, ordered by key.
    pub fn days_in_range(&self, from_key: &str, to_key: &str) -> Result<Vec<ScheduleDay>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT date_key, doc FROM schedule_days
             WHERE date_key >= ?1 AND date_key <= ?2
             ORDER BY date_key",
        )?;
        let rows = stmt
            .query_map(params![from_key, to_key], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|(key, doc)| decode_day(key, doc))
            .collect()
    }

    /// Every persisted day, ordered by key. Backfill input.
    pub fn all_days(&self) -> Result<Vec<ScheduleDay>, DbError> {
        self.days_in_range("0000-00-00", "9999-99-99")
    }

    // ------------------------------------------------------------------
    // User directory (read-only to the engine; upsert exists for seeding)
    // ------------------------------------------------------------------

    /// Every directory user.
    pub fn list_users(&self) -> Result<Vec<UserIdentity>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name_he, name_en, role, status FROM users ORDER BY id",
        )?;
        let users = stmt
            .query_map([], |row| {
                Ok(UserIdentity {
                    id: row.get(0)?,
                    name_he: row.get(1)?,
                    name_en: row.get(2)?,
                    role: row.get(3)?,
                    status: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Insert or update a directory user. Seeding and tests only — the
    /// engine itself never mutates the directory.
    pub fn upsert_user(&self, user: &UserIdentity) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO users (id, name_he, name_en, role, status, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
               name_he = ?2, name_en = ?3, role = ?4, status = ?5, updated_at = ?6",
            params![
                &user.id,
                &user.name_he,
                &user.name_en,
                &user.role,
                &user.status,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

/// Deserialize a stored document, failing fast on malformation or on a
/// document whose embedded key disagrees with its row key.
fn decode_day(key: &str, doc: &str) -> Result<ScheduleDay, DbError> {
    let day: ScheduleDay = serde_json::from_str(doc).map_err(|e| DbError::MalformedDoc {
        key: key.to_string(),
        message: e.to_string(),
    })?;

    if day.date_key != key {
        return Err(DbError::MalformedDoc {
            key: key.to_string(),
            message: format!("document dateKey {} disagrees with row key", day.date_key),
        });
    }
    if parse_date_key(&day.date_key) != Some(day.date) {
        return Err(DbError::MalformedDoc {
            key: key.to_string(),
            message: format!("dateKey {} not derivable from date {}", day.date_key, day.date),
        });
    }

    Ok(day)
}
