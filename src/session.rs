// 🔐 Session Store - Persisted authentication across restarts
// A tiny key-value table in SQLite plays the role of browser local storage:
//   token -> raw bearer token
//   user  -> JSON-encoded User

use crate::error::{ApiError, ApiResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

// ============================================================================
// SESSION MODEL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub full_name: String,
    pub email: String,
}

/// Authenticated identity held for the duration of a login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Session {
            token: token.into(),
            user,
        }
    }
}

// ============================================================================
// SESSION STORE
// ============================================================================

pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open (or create) the on-disk store
    pub fn open<P: AsRef<Path>>(path: P) -> ApiResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_connection(conn)
    }

    /// Volatile store, used by tests and one-off runs
    pub fn in_memory() -> ApiResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> ApiResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(SessionStore { conn })
    }

    pub fn get_item(&self, key: &str) -> ApiResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> ApiResult<()> {
        self.conn.execute(
            "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> ApiResult<()> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Restore the saved session, if any.
    /// Missing keys, unreadable storage and corrupt user JSON all yield None.
    pub fn load(&self) -> Option<Session> {
        let token = match self.get_item(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => return None,
            Err(e) => {
                warn!("session storage unreadable: {}", e);
                return None;
            }
        };

        let user_json = match self.get_item(USER_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                warn!("session storage unreadable: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<User>(&user_json) {
            Ok(user) => {
                info!("restored session for {}", user.username);
                Some(Session { token, user })
            }
            Err(e) => {
                warn!("discarding corrupt saved user: {}", e);
                None
            }
        }
    }

    pub fn save(&mut self, session: &Session) -> ApiResult<()> {
        let user_json = serde_json::to_string(&session.user)
            .map_err(|e| ApiError::Storage(e.to_string()))?;

        let tx = self.conn.transaction()?;
        for (key, value) in [(TOKEN_KEY, session.token.as_str()), (USER_KEY, user_json.as_str())] {
            tx.execute(
                "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit()?;

        info!("saved session for {}", session.user.username);
        Ok(())
    }

    pub fn clear(&self) -> ApiResult<()> {
        self.remove_item(TOKEN_KEY)?;
        self.remove_item(USER_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Session {
        Session::new(
            "tok-123",
            User {
                username: "alice".to_string(),
                full_name: "Alice Liddell".to_string(),
                email: "alice@example.com".to_string(),
            },
        )
    }

    #[test]
    fn test_load_empty_store() {
        let store = SessionStore::in_memory().unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = SessionStore::in_memory().unwrap();
        store.save(&alice()).unwrap();

        let restored = store.load().expect("session should be restored");
        assert_eq!(restored, alice());
        assert_eq!(store.get_item(TOKEN_KEY).unwrap().as_deref(), Some("tok-123"));
    }

    #[test]
    fn test_clear_removes_session() {
        let mut store = SessionStore::in_memory().unwrap();
        store.save(&alice()).unwrap();
        store.clear().unwrap();

        assert!(store.load().is_none());
        assert!(store.get_item(USER_KEY).unwrap().is_none());

        // Clearing twice is harmless
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_user_is_ignored() {
        let store = SessionStore::in_memory().unwrap();
        store.set_item(TOKEN_KEY, "tok-123").unwrap();
        store.set_item(USER_KEY, "{not json").unwrap();

        assert!(store.load().is_none());
    }

    #[test]
    fn test_token_without_user_is_absent() {
        let store = SessionStore::in_memory().unwrap();
        store.set_item(TOKEN_KEY, "tok-123").unwrap();

        assert!(store.load().is_none());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.db");

        {
            let mut store = SessionStore::open(&path).unwrap();
            store.save(&alice()).unwrap();
        }

        let store = SessionStore::open(&path).unwrap();
        assert_eq!(store.load().map(|s| s.user.username), Some("alice".to_string()));
    }
}
