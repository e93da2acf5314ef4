//! SQLite-backed persistent store for sessions, turns, and contexts
//!
//! The rest of the crate only needs narrow create/read/append/delete-by-key
//! operations on these three entity kinds; everything here is plain SQL with
//! the relational constraints that a turn always references exactly one
//! session and a context corresponds to exactly one session. Session
//! creation is an atomic upsert-by-key so concurrent duplicate creates
//! cannot produce two session rows.

use crate::error::{Result, VialyError};
use anyhow::Context;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;

pub mod types;
pub use types::{Sender, SessionStatus, StoredSession, StoredTurn};

/// Storage backend for sessions, turns, and conversation contexts
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Create a new store in the user's data directory
    ///
    /// The path can be overridden with the `VIALY_SESSIONS_DB` environment
    /// variable, which makes it easy to point the binary at a test DB or an
    /// alternate file without changing the application data dir.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("VIALY_SESSIONS_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("co", "vialy", "vialy")
            .ok_or_else(|| VialyError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| VialyError::Storage(e.to_string()))?;

        let db_path = data_dir.join("sessions.db");
        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Create a store backed by the given database path
    ///
    /// Primarily useful for tests where the default application data
    /// directory is not desirable.
    ///
    /// # Examples
    ///
    /// ```
    /// use vialy::storage::SqliteStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteStore::new_with_path(dir.path().join("test.db")).unwrap();
    /// assert_eq!(store.active_session_count().unwrap(), 0);
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| VialyError::Storage(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| VialyError::Storage(e.to_string()).into())
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                started_at TEXT NOT NULL,
                last_activity_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS turns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL REFERENCES sessions(session_id),
                sender TEXT NOT NULL,
                text TEXT NOT NULL,
                category TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_turns_session ON turns(session_id);
            CREATE TABLE IF NOT EXISTS contexts (
                session_id TEXT PRIMARY KEY REFERENCES sessions(session_id),
                data JSON NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .context("Failed to create tables")
        .map_err(|e| VialyError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Create the session if absent, touch `last_activity_at` if present
    ///
    /// Single-statement upsert keyed by `session_id`, so a concurrent
    /// duplicate create resolves to one row.
    pub fn upsert_session(&self, session_id: &str, owner_id: &str) -> Result<()> {
        let conn = self.open()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO sessions (session_id, owner_id, status, started_at, last_activity_at)
            VALUES (?, ?, 'active', ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                last_activity_at = excluded.last_activity_at,
                status = 'active'",
            params![session_id, owner_id, now, now],
        )
        .context("Failed to upsert session")
        .map_err(|e| VialyError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Look up a session by its token
    pub fn find_session(&self, session_id: &str) -> Result<Option<StoredSession>> {
        let conn = self.open()?;

        let row = conn
            .query_row(
                "SELECT session_id, owner_id, status, started_at, last_activity_at
                FROM sessions WHERE session_id = ?",
                params![session_id],
                |row| {
                    let session_id: String = row.get(0)?;
                    let owner_id: String = row.get(1)?;
                    let status: String = row.get(2)?;
                    let started_at: String = row.get(3)?;
                    let last_activity_at: String = row.get(4)?;
                    Ok((session_id, owner_id, status, started_at, last_activity_at))
                },
            )
            .optional()
            .context("Failed to query session")
            .map_err(|e| VialyError::Storage(e.to_string()))?;

        match row {
            Some((session_id, owner_id, status, started_at, last_activity_at)) => {
                Ok(Some(StoredSession {
                    session_id,
                    owner_id,
                    status: SessionStatus::parse(&status).unwrap_or(SessionStatus::Active),
                    started_at: parse_timestamp(&started_at)?,
                    last_activity_at: parse_timestamp(&last_activity_at)?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Append a user/assistant message pair as one transaction
    ///
    /// Both rows carry the category assigned to the user utterance. Fails
    /// with `SessionNotFound` when the session does not exist; the session
    /// manager decides whether that is fatal.
    pub fn append_turn_pair(
        &self,
        session_id: &str,
        user_text: &str,
        assistant_text: &str,
        category: Option<&str>,
    ) -> Result<()> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| VialyError::Storage(e.to_string()))?;

        let exists: bool = tx
            .query_row(
                "SELECT 1 FROM sessions WHERE session_id = ?",
                params![session_id],
                |_| Ok(true),
            )
            .optional()
            .context("Failed to check session")
            .map_err(|e| VialyError::Storage(e.to_string()))?
            .unwrap_or(false);

        if !exists {
            return Err(VialyError::SessionNotFound(session_id.to_string()).into());
        }

        let now = Utc::now().to_rfc3339();

        tx.execute(
            "INSERT INTO turns (session_id, sender, text, category, created_at)
            VALUES (?, ?, ?, ?, ?)",
            params![session_id, Sender::User.as_str(), user_text, category, now],
        )
        .context("Failed to insert user turn")
        .map_err(|e| VialyError::Storage(e.to_string()))?;

        tx.execute(
            "INSERT INTO turns (session_id, sender, text, category, created_at)
            VALUES (?, ?, ?, ?, ?)",
            params![
                session_id,
                Sender::Assistant.as_str(),
                assistant_text,
                category,
                now
            ],
        )
        .context("Failed to insert assistant turn")
        .map_err(|e| VialyError::Storage(e.to_string()))?;

        tx.execute(
            "UPDATE sessions SET last_activity_at = ?, status = 'active' WHERE session_id = ?",
            params![now, session_id],
        )
        .context("Failed to touch session")
        .map_err(|e| VialyError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| VialyError::Storage(e.to_string()))?;

        Ok(())
    }

    /// List a session's message rows in chronological order
    ///
    /// With `max_pairs`, only the most recent `max_pairs * 2` rows are
    /// returned (still oldest-first).
    pub fn list_turns(&self, session_id: &str, max_pairs: Option<usize>) -> Result<Vec<StoredTurn>> {
        let conn = self.open()?;

        let sql = match max_pairs {
            Some(_) => {
                "SELECT sender, text, category, created_at FROM (
                    SELECT id, sender, text, category, created_at FROM turns
                    WHERE session_id = ? ORDER BY id DESC LIMIT ?
                ) ORDER BY id ASC"
            }
            None => {
                "SELECT sender, text, category, created_at FROM turns
                WHERE session_id = ? ORDER BY id ASC"
            }
        };

        let mut stmt = conn
            .prepare(sql)
            .context("Failed to prepare statement")
            .map_err(|e| VialyError::Storage(e.to_string()))?;

        let map_row = |row: &rusqlite::Row<'_>| {
            let sender: String = row.get(0)?;
            let text: String = row.get(1)?;
            let category: Option<String> = row.get(2)?;
            let created_at: String = row.get(3)?;
            Ok((sender, text, category, created_at))
        };

        let rows: Vec<(String, String, Option<String>, String)> = match max_pairs {
            Some(pairs) => stmt
                .query_map(params![session_id, (pairs * 2) as i64], map_row)
                .context("Failed to query turns")
                .map_err(|e| VialyError::Storage(e.to_string()))?
                .collect::<std::result::Result<_, _>>()
                .context("Failed to read turns")
                .map_err(|e| VialyError::Storage(e.to_string()))?,
            None => stmt
                .query_map(params![session_id], map_row)
                .context("Failed to query turns")
                .map_err(|e| VialyError::Storage(e.to_string()))?
                .collect::<std::result::Result<_, _>>()
                .context("Failed to read turns")
                .map_err(|e| VialyError::Storage(e.to_string()))?,
        };

        let mut turns = Vec::with_capacity(rows.len());
        for (sender, text, category, created_at) in rows {
            turns.push(StoredTurn {
                sender: Sender::parse(&sender)
                    .ok_or_else(|| VialyError::Storage(format!("unknown sender: {}", sender)))?,
                text,
                category,
                created_at: parse_timestamp(&created_at)?,
            });
        }

        Ok(turns)
    }

    /// Number of message rows stored for a session
    pub fn turn_count(&self, session_id: &str) -> Result<usize> {
        let conn = self.open()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM turns WHERE session_id = ?",
                params![session_id],
                |row| row.get(0),
            )
            .context("Failed to count turns")
            .map_err(|e| VialyError::Storage(e.to_string()))?;
        Ok(count as usize)
    }

    /// Delete a session with its turns and context
    ///
    /// Returns whether a session row existed.
    pub fn delete_session(&self, session_id: &str) -> Result<bool> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| VialyError::Storage(e.to_string()))?;

        tx.execute(
            "DELETE FROM turns WHERE session_id = ?",
            params![session_id],
        )
        .context("Failed to delete turns")
        .map_err(|e| VialyError::Storage(e.to_string()))?;

        tx.execute(
            "DELETE FROM contexts WHERE session_id = ?",
            params![session_id],
        )
        .context("Failed to delete context")
        .map_err(|e| VialyError::Storage(e.to_string()))?;

        let deleted = tx
            .execute(
                "DELETE FROM sessions WHERE session_id = ?",
                params![session_id],
            )
            .context("Failed to delete session")
            .map_err(|e| VialyError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| VialyError::Storage(e.to_string()))?;

        Ok(deleted > 0)
    }

    /// Delete every session idle since before `cutoff`, with its turns and
    /// context; returns how many sessions were removed
    ///
    /// Timestamps are stored as RFC 3339 UTC strings, which compare
    /// lexicographically in chronological order.
    pub fn delete_idle_since(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| VialyError::Storage(e.to_string()))?;

        let cutoff = cutoff.to_rfc3339();

        tx.execute(
            "DELETE FROM turns WHERE session_id IN
                (SELECT session_id FROM sessions WHERE last_activity_at < ?)",
            params![cutoff],
        )
        .context("Failed to delete expired turns")
        .map_err(|e| VialyError::Storage(e.to_string()))?;

        tx.execute(
            "DELETE FROM contexts WHERE session_id IN
                (SELECT session_id FROM sessions WHERE last_activity_at < ?)",
            params![cutoff],
        )
        .context("Failed to delete expired contexts")
        .map_err(|e| VialyError::Storage(e.to_string()))?;

        let removed = tx
            .execute(
                "DELETE FROM sessions WHERE last_activity_at < ?",
                params![cutoff],
            )
            .context("Failed to delete expired sessions")
            .map_err(|e| VialyError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| VialyError::Storage(e.to_string()))?;

        Ok(removed)
    }

    /// Number of sessions currently marked active
    pub fn active_session_count(&self) -> Result<usize> {
        let conn = self.open()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sessions WHERE status = 'active'",
                [],
                |row| row.get(0),
            )
            .context("Failed to count sessions")
            .map_err(|e| VialyError::Storage(e.to_string()))?;
        Ok(count as usize)
    }

    /// Load a session's serialized conversation context, if any
    pub fn load_context_json(&self, session_id: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT data FROM contexts WHERE session_id = ?",
            params![session_id],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to load context")
        .map_err(|e| VialyError::Storage(e.to_string()).into())
    }

    /// Save (upsert) a session's serialized conversation context
    pub fn save_context_json(&self, session_id: &str, data: &str) -> Result<()> {
        let conn = self.open()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO contexts (session_id, data, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at",
            params![session_id, data, now],
        )
        .context("Failed to save context")
        .map_err(|e| VialyError::Storage(e.to_string()))?;

        Ok(())
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .context("Failed to parse stored timestamp")
        .map_err(|e| VialyError::Storage(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    /// Helper: create a temporary store backed by a temp directory.
    ///
    /// Returns both the store and the `TempDir` so the caller keeps
    /// ownership of the directory (preventing it from being removed).
    fn create_test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let db_path = dir.path().join("sessions.db");
        let store = SqliteStore::new_with_path(db_path).expect("failed to create store");
        (store, dir)
    }

    #[test]
    fn test_upsert_creates_session() {
        let (store, _dir) = create_test_store();
        store.upsert_session("s1", "owner-1").unwrap();

        let session = store.find_session("s1").unwrap().unwrap();
        assert_eq!(session.owner_id, "owner-1");
        assert_eq!(session.status, SessionStatus::Active);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let (store, _dir) = create_test_store();
        store.upsert_session("s1", "owner-1").unwrap();
        store.upsert_session("s1", "owner-1").unwrap();
        assert_eq!(store.active_session_count().unwrap(), 1);
    }

    #[test]
    fn test_upsert_touches_last_activity() {
        let (store, _dir) = create_test_store();
        store.upsert_session("s1", "owner-1").unwrap();
        let first = store.find_session("s1").unwrap().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        store.upsert_session("s1", "owner-1").unwrap();
        let second = store.find_session("s1").unwrap().unwrap();

        assert!(second.last_activity_at > first.last_activity_at);
        assert_eq!(second.started_at, first.started_at);
    }

    #[test]
    fn test_find_session_missing() {
        let (store, _dir) = create_test_store();
        assert!(store.find_session("nope").unwrap().is_none());
    }

    #[test]
    fn test_append_turn_pair_and_list() {
        let (store, _dir) = create_test_store();
        store.upsert_session("s1", "owner-1").unwrap();
        store
            .append_turn_pair("s1", "pregunta", "respuesta", Some("MULTA"))
            .unwrap();

        let turns = store.list_turns("s1", None).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].sender, Sender::User);
        assert_eq!(turns[0].text, "pregunta");
        assert_eq!(turns[1].sender, Sender::Assistant);
        assert_eq!(turns[1].text, "respuesta");
        assert_eq!(turns[0].category.as_deref(), Some("MULTA"));
    }

    #[test]
    fn test_append_turn_pair_missing_session_errors() {
        let (store, _dir) = create_test_store();
        let err = store
            .append_turn_pair("ghost", "q", "a", None)
            .unwrap_err();
        let err = err.downcast::<VialyError>().unwrap();
        assert!(matches!(err, VialyError::SessionNotFound(_)));
    }

    #[test]
    fn test_list_turns_limit_keeps_most_recent() {
        let (store, _dir) = create_test_store();
        store.upsert_session("s1", "owner-1").unwrap();
        for i in 0..5 {
            store
                .append_turn_pair("s1", &format!("q{}", i), &format!("a{}", i), None)
                .unwrap();
        }

        let turns = store.list_turns("s1", Some(2)).unwrap();
        assert_eq!(turns.len(), 4);
        // most recent two pairs, oldest first
        assert_eq!(turns[0].text, "q3");
        assert_eq!(turns[1].text, "a3");
        assert_eq!(turns[2].text, "q4");
        assert_eq!(turns[3].text, "a4");
    }

    #[test]
    fn test_turn_count() {
        let (store, _dir) = create_test_store();
        store.upsert_session("s1", "owner-1").unwrap();
        assert_eq!(store.turn_count("s1").unwrap(), 0);
        store.append_turn_pair("s1", "q", "a", None).unwrap();
        assert_eq!(store.turn_count("s1").unwrap(), 2);
    }

    #[test]
    fn test_delete_session_removes_everything() {
        let (store, _dir) = create_test_store();
        store.upsert_session("s1", "owner-1").unwrap();
        store.append_turn_pair("s1", "q", "a", None).unwrap();
        store.save_context_json("s1", "{}").unwrap();

        assert!(store.delete_session("s1").unwrap());
        assert!(store.find_session("s1").unwrap().is_none());
        assert_eq!(store.turn_count("s1").unwrap(), 0);
        assert!(store.load_context_json("s1").unwrap().is_none());
    }

    #[test]
    fn test_delete_session_missing_returns_false() {
        let (store, _dir) = create_test_store();
        assert!(!store.delete_session("ghost").unwrap());
    }

    #[test]
    fn test_delete_idle_since_removes_only_expired() {
        let (store, _dir) = create_test_store();
        store.upsert_session("old", "owner-1").unwrap();
        store.upsert_session("fresh", "owner-1").unwrap();

        // a cutoff in the past removes nothing
        let past = Utc::now() - Duration::hours(1);
        assert_eq!(store.delete_idle_since(past).unwrap(), 0);

        // a cutoff in the future removes both
        let future = Utc::now() + Duration::hours(1);
        assert_eq!(store.delete_idle_since(future).unwrap(), 2);
        assert_eq!(store.active_session_count().unwrap(), 0);
    }

    #[test]
    fn test_context_json_roundtrip() {
        let (store, _dir) = create_test_store();
        store.upsert_session("s1", "owner-1").unwrap();

        assert!(store.load_context_json("s1").unwrap().is_none());
        store
            .save_context_json("s1", r#"{"topics":["multa"]}"#)
            .unwrap();
        assert_eq!(
            store.load_context_json("s1").unwrap().unwrap(),
            r#"{"topics":["multa"]}"#
        );

        // upsert replaces
        store.save_context_json("s1", r#"{"topics":[]}"#).unwrap();
        assert_eq!(
            store.load_context_json("s1").unwrap().unwrap(),
            r#"{"topics":[]}"#
        );
    }

    #[test]
    fn test_concurrent_upserts_create_one_session() {
        use std::sync::Arc;

        let dir = tempdir().unwrap();
        let db_path = dir.path().join("sessions.db");
        let store = Arc::new(SqliteStore::new_with_path(&db_path).unwrap());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                // SQLite may briefly lock under contention; retry like a
                // busy handler would
                for _ in 0..50 {
                    if store.upsert_session("same-id", "owner-1").is_ok() {
                        return;
                    }
                    std::thread::sleep(std::time::Duration::from_millis(5));
                }
                panic!("upsert never succeeded");
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.active_session_count().unwrap(), 1);
    }
}
