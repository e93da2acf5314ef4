//! Session identity and short-term history management
//!
//! Owns session lifecycles (creation as upsert-by-key, activity touches,
//! idle expiry) and the turn history persisted per session. Expired
//! sessions are cleaned up opportunistically before aggregate counts are
//! reported, not on a timer, so staleness can persist until the next status
//! query.

use crate::classify::Category;
use crate::error::{Result, VialyError};
use crate::storage::{SessionStatus, SqliteStore};
use crate::text::truncate_with_ellipsis;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Sentinel returned when a session has no turns or does not exist
pub const NO_HISTORY: &str = "Sin historial previo.";

/// History lines are capped at this many characters before the ellipsis
const HISTORY_LINE_MAX_CHARS: usize = 100;

/// Default number of turn pairs injected into prompts
pub const DEFAULT_MAX_HISTORY: usize = 5;

/// Default idle timeout in hours before a session expires
pub const DEFAULT_SESSION_TIMEOUT_HOURS: i64 = 24;

/// Summary of one session, as reported to callers
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub owner_id: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    /// Number of stored message rows (two per turn pair)
    pub message_count: usize,
}

/// Manager for session identity, history, and expiry
pub struct SessionManager {
    store: Arc<SqliteStore>,
    max_history: usize,
    idle_timeout: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<SqliteStore>, max_history: usize, timeout_hours: i64) -> Self {
        tracing::info!(max_history, timeout_hours, "session manager initialized");
        Self {
            store,
            max_history,
            idle_timeout: Duration::hours(timeout_hours),
        }
    }

    /// Number of turn pairs handed to the prompt composer
    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Returns an existing session's id after touching it, or creates one
    ///
    /// A missing `session_id` gets a fresh UUID. Creation is an atomic
    /// upsert on the session key, so a concurrent duplicate create for the
    /// same `(owner_id, session_id)` cannot produce two sessions.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when `owner_id` is empty; this is rejected before any
    /// side effect.
    pub fn get_or_create_session(
        &self,
        owner_id: &str,
        session_id: Option<&str>,
    ) -> Result<String> {
        if owner_id.trim().is_empty() {
            return Err(
                VialyError::InvalidInput("owner_id is required to create a session".into()).into(),
            );
        }

        let session_id = match session_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };

        self.store.upsert_session(&session_id, owner_id)?;
        tracing::debug!(%session_id, %owner_id, "session upserted");
        Ok(session_id)
    }

    /// Appends a user/assistant turn pair to a session's history
    ///
    /// Never raises: a missing session means the caller skipped creation,
    /// which is a recoverable operator error, not a client error. It is
    /// logged and absorbed.
    pub fn append_turn(
        &self,
        session_id: &str,
        user_text: &str,
        system_text: &str,
        category: Category,
    ) {
        if let Err(e) =
            self.store
                .append_turn_pair(session_id, user_text, system_text, Some(category.as_str()))
        {
            tracing::warn!(%session_id, error = %e, "failed to append turn");
        }
    }

    /// Renders a session's history for prompt injection
    ///
    /// Turns come back oldest-first, each line
    /// `"{Sender}: {text truncated to 100 chars}"`. With `max_turns`, only
    /// the most recent pairs are included. Returns [`NO_HISTORY`] when the
    /// session has no turns or does not exist.
    pub fn get_history(&self, session_id: &str, max_turns: Option<usize>) -> String {
        let turns = match self.store.list_turns(session_id, max_turns) {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(%session_id, error = %e, "failed to load history");
                return NO_HISTORY.to_string();
            }
        };

        if turns.is_empty() {
            return NO_HISTORY.to_string();
        }

        turns
            .iter()
            .map(|t| {
                format!(
                    "{}: {}",
                    t.sender.display_label(),
                    truncate_with_ellipsis(&t.text, HISTORY_LINE_MAX_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Deletes a session together with its turns and context
    ///
    /// Returns whether a session was found.
    pub fn clear_history(&self, session_id: &str) -> Result<bool> {
        let found = self.store.delete_session(session_id)?;
        if found {
            tracing::info!(%session_id, "session history cleared");
        }
        Ok(found)
    }

    /// Removes every session idle longer than the configured timeout
    pub fn cleanup_expired(&self) -> Result<usize> {
        let cutoff = Utc::now() - self.idle_timeout;
        let removed = self.store.delete_idle_since(cutoff)?;
        if removed > 0 {
            tracing::info!(removed, "expired sessions cleaned up");
        }
        Ok(removed)
    }

    /// Number of active sessions
    pub fn active_session_count(&self) -> Result<usize> {
        self.store.active_session_count()
    }

    /// Summary of one session, if it exists
    pub fn session_info(&self, session_id: &str) -> Result<Option<SessionInfo>> {
        let Some(session) = self.store.find_session(session_id)? else {
            return Ok(None);
        };
        let message_count = self.store.turn_count(session_id)?;
        Ok(Some(SessionInfo {
            session_id: session.session_id,
            owner_id: session.owner_id,
            status: session.status,
            started_at: session.started_at,
            last_activity_at: session.last_activity_at,
            message_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_manager() -> (SessionManager, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteStore::new_with_path(dir.path().join("test.db")).unwrap());
        (
            SessionManager::new(store, DEFAULT_MAX_HISTORY, DEFAULT_SESSION_TIMEOUT_HOURS),
            dir,
        )
    }

    #[test]
    fn test_get_or_create_requires_owner() {
        let (manager, _dir) = create_manager();
        let err = manager.get_or_create_session("", None).unwrap_err();
        let err = err.downcast::<VialyError>().unwrap();
        assert!(matches!(err, VialyError::InvalidInput(_)));
    }

    #[test]
    fn test_get_or_create_generates_id() {
        let (manager, _dir) = create_manager();
        let id = manager.get_or_create_session("owner-1", None).unwrap();
        assert!(!id.is_empty());
        assert!(manager.session_info(&id).unwrap().is_some());
    }

    #[test]
    fn test_get_or_create_reuses_given_id() {
        let (manager, _dir) = create_manager();
        let first = manager
            .get_or_create_session("owner-1", Some("my-session"))
            .unwrap();
        let second = manager
            .get_or_create_session("owner-1", Some("my-session"))
            .unwrap();
        assert_eq!(first, "my-session");
        assert_eq!(second, "my-session");
        assert_eq!(manager.active_session_count().unwrap(), 1);
    }

    #[test]
    fn test_append_turn_missing_session_is_absorbed() {
        let (manager, _dir) = create_manager();
        // must not panic or error
        manager.append_turn("ghost", "q", "a", Category::General);
        assert_eq!(manager.get_history("ghost", None), NO_HISTORY);
    }

    #[test]
    fn test_get_history_renders_chronological_pairs() {
        let (manager, _dir) = create_manager();
        let id = manager.get_or_create_session("owner-1", None).unwrap();
        manager.append_turn(&id, "¿Cuánto es la multa?", "Son $711,750.", Category::Multa);

        let history = manager.get_history(&id, None);
        let lines: Vec<&str> = history.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Usuario: ¿Cuánto es la multa?");
        assert_eq!(lines[1], "Asistente: Son $711,750.");
    }

    #[test]
    fn test_get_history_truncates_long_messages() {
        let (manager, _dir) = create_manager();
        let id = manager.get_or_create_session("owner-1", None).unwrap();
        let long = "x".repeat(200);
        manager.append_turn(&id, &long, "ok", Category::General);

        let history = manager.get_history(&id, None);
        let first = history.lines().next().unwrap();
        assert!(first.ends_with("..."));
        // "Usuario: " + 100 chars + "..."
        assert_eq!(first.len(), "Usuario: ".len() + 100 + 3);
    }

    #[test]
    fn test_get_history_empty_session_sentinel() {
        let (manager, _dir) = create_manager();
        let id = manager.get_or_create_session("owner-1", None).unwrap();
        assert_eq!(manager.get_history(&id, None), NO_HISTORY);
    }

    #[test]
    fn test_get_history_respects_max_turns() {
        let (manager, _dir) = create_manager();
        let id = manager.get_or_create_session("owner-1", None).unwrap();
        for i in 0..4 {
            manager.append_turn(&id, &format!("q{}", i), &format!("a{}", i), Category::General);
        }

        let history = manager.get_history(&id, Some(1));
        let lines: Vec<&str> = history.lines().collect();
        assert_eq!(lines, vec!["Usuario: q3", "Asistente: a3"]);
    }

    #[test]
    fn test_clear_history_then_sentinel() {
        let (manager, _dir) = create_manager();
        let id = manager.get_or_create_session("owner-1", None).unwrap();
        for i in 0..3 {
            manager.append_turn(&id, &format!("q{}", i), &format!("a{}", i), Category::General);
        }

        assert!(manager.clear_history(&id).unwrap());
        assert_eq!(manager.get_history(&id, None), NO_HISTORY);
        assert!(!manager.clear_history(&id).unwrap());
    }

    #[test]
    fn test_cleanup_expired_with_long_timeout_keeps_sessions() {
        let (manager, _dir) = create_manager();
        manager.get_or_create_session("owner-1", None).unwrap();
        assert_eq!(manager.cleanup_expired().unwrap(), 0);
        assert_eq!(manager.active_session_count().unwrap(), 1);
    }

    #[test]
    fn test_cleanup_expired_removes_idle_sessions() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteStore::new_with_path(dir.path().join("test.db")).unwrap());
        // zero-hour timeout: everything is instantly stale
        let manager = SessionManager::new(store, DEFAULT_MAX_HISTORY, 0);
        manager.get_or_create_session("owner-1", None).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(manager.cleanup_expired().unwrap(), 1);
        assert_eq!(manager.active_session_count().unwrap(), 0);
    }

    #[test]
    fn test_session_info_reports_counts() {
        let (manager, _dir) = create_manager();
        let id = manager.get_or_create_session("owner-7", None).unwrap();
        manager.append_turn(&id, "q", "a", Category::Multa);

        let info = manager.session_info(&id).unwrap().unwrap();
        assert_eq!(info.owner_id, "owner-7");
        assert_eq!(info.message_count, 2);
        assert_eq!(info.status, SessionStatus::Active);

        assert!(manager.session_info("ghost").unwrap().is_none());
    }

    #[test]
    fn test_concurrent_get_or_create_single_session() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteStore::new_with_path(dir.path().join("test.db")).unwrap());
        let manager = Arc::new(SessionManager::new(store, DEFAULT_MAX_HISTORY, 24));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    if manager
                        .get_or_create_session("owner-1", Some("shared"))
                        .is_ok()
                    {
                        return;
                    }
                    std::thread::sleep(std::time::Duration::from_millis(5));
                }
                panic!("get_or_create never succeeded");
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(manager.active_session_count().unwrap(), 1);
    }
}
