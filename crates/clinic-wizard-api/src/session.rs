//! Signed-in session storage.
//!
//! The REST clients read the bearer token through [`SessionStore`], so the
//! storage medium is up to the embedding app: in memory for tests and
//! short-lived tools, SQLite for a desktop client that survives restarts.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session storage errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt session record: {0}")]
    Corrupt(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// The signed-in professional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Bearer token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
    pub stored_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: SessionUser) -> Self {
        Self {
            token: token.into(),
            user,
            stored_at: Utc::now(),
        }
    }
}

/// Where the current session lives.
pub trait SessionStore {
    fn get(&self) -> SessionResult<Option<Session>>;

    fn set(&mut self, session: &Session) -> SessionResult<()>;

    fn clear(&mut self) -> SessionResult<()>;

    /// Bearer token of the current session, if signed in.
    fn token(&self) -> SessionResult<Option<String>> {
        Ok(self.get()?.map(|s| s.token))
    }

    fn is_authenticated(&self) -> SessionResult<bool> {
        Ok(self.token()?.is_some_and(|t| !t.is_empty()))
    }
}

/// Process-local session.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    session: Option<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> SessionResult<Option<Session>> {
        Ok(self.session.clone())
    }

    fn set(&mut self, session: &Session) -> SessionResult<()> {
        self.session = Some(session.clone());
        Ok(())
    }

    fn clear(&mut self) -> SessionResult<()> {
        self.session = None;
        Ok(())
    }
}

const SESSION_SCHEMA: &str = r#"
-- At most one signed-in session per database
CREATE TABLE IF NOT EXISTS session (
    slot INTEGER PRIMARY KEY CHECK (slot = 1),
    token TEXT NOT NULL,
    user_json TEXT NOT NULL,                      -- SessionUser as JSON
    stored_at TEXT NOT NULL                       -- RFC 3339
);
"#;

/// Session persisted in a single-row SQLite table.
pub struct SqliteSessionStore {
    conn: Connection,
}

impl SqliteSessionStore {
    /// Open the store at path, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> SessionResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SESSION_SCHEMA)?;
        Ok(Self { conn })
    }

    /// In-memory store (for testing).
    pub fn open_in_memory() -> SessionResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SESSION_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self) -> SessionResult<Option<Session>> {
        let row = self
            .conn
            .query_row(
                "SELECT token, user_json, stored_at FROM session WHERE slot = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((token, user_json, stored_at)) = row else {
            return Ok(None);
        };
        let stored_at = DateTime::parse_from_rfc3339(&stored_at)
            .map_err(|e| SessionError::Corrupt(format!("stored_at {:?}: {}", stored_at, e)))?
            .with_timezone(&Utc);

        Ok(Some(Session {
            token,
            user: serde_json::from_str(&user_json)?,
            stored_at,
        }))
    }

    fn set(&mut self, session: &Session) -> SessionResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO session (slot, token, user_json, stored_at)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(slot) DO UPDATE SET
                token = excluded.token,
                user_json = excluded.user_json,
                stored_at = excluded.stored_at
            "#,
            params![
                session.token,
                serde_json::to_string(&session.user)?,
                session.stored_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn clear(&mut self) -> SessionResult<()> {
        self.conn.execute("DELETE FROM session", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> SessionUser {
        SessionUser {
            id: "u-1".into(),
            email: "ana@clinic.example".into(),
            first_name: "Ana".into(),
            last_name: "López".into(),
            organization_name: Some("Centro Crecer".into()),
            roles: vec!["PROFESSIONAL".into()],
        }
    }

    fn exercise(store: &mut dyn SessionStore) {
        assert_eq!(store.get().unwrap(), None);
        assert!(!store.is_authenticated().unwrap());

        let session = Session::new("tok-1", user());
        store.set(&session).unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("tok-1"));
        assert_eq!(store.get().unwrap().map(|s| s.user), Some(user()));

        store.set(&Session::new("tok-2", user())).unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("tok-2"));

        store.clear().unwrap();
        assert!(!store.is_authenticated().unwrap());
    }

    #[test]
    fn test_memory_store() {
        exercise(&mut MemorySessionStore::new());
    }

    #[test]
    fn test_sqlite_store() {
        exercise(&mut SqliteSessionStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.db");

        let session = Session::new("tok-9", user());
        {
            let mut store = SqliteSessionStore::open(&path).unwrap();
            store.set(&session).unwrap();
        }

        let store = SqliteSessionStore::open(&path).unwrap();
        let loaded = store.get().unwrap().unwrap();
        assert_eq!(loaded.token, "tok-9");
        assert_eq!(loaded.stored_at, session.stored_at);
    }

    #[test]
    fn test_user_json_is_camel_case() {
        let json = serde_json::to_value(user()).unwrap();
        assert_eq!(json["firstName"], "Ana");
        let minimal: SessionUser = serde_json::from_str(
            r#"{"id":"u-2","email":"b@c.d","firstName":"B","lastName":"C"}"#,
        )
        .unwrap();
        assert!(minimal.roles.is_empty());
    }
}
