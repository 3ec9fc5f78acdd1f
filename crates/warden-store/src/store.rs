//! SQLite implementation of the session store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, ErrorCode, OpenFlags, Row, params};
use tracing::{debug, info};

use warden_session::{Session, SessionStore, StoreError, StoreResult};

use crate::error::{DbError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Schema Version
// ─────────────────────────────────────────────────────────────────────────────

/// Current schema version for migrations.
const SCHEMA_VERSION: i32 = 1;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Store
// ─────────────────────────────────────────────────────────────────────────────

/// Session store backed by SQLite.
///
/// Uses WAL mode so validation reads are not blocked by writers in other
/// processes (e.g. the admin CLI running against a live server's database).
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create a store at the given path.
    ///
    /// Creates the database file and initializes the schema if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| DbError::CreateDir {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;

        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        store.initialize(true)?;

        info!("Session store opened at {:?}", path);
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        store.initialize(false)?;

        info!("In-memory session store created");
        Ok(store)
    }

    /// Database file path, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Apply pragmas and bring the schema up to date.
    fn initialize(&self, on_disk: bool) -> Result<()> {
        let conn = self.conn.lock();

        if on_disk {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
        }
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Self::create_schema(&conn)
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        if current_version > SCHEMA_VERSION {
            return Err(DbError::Migration(format!(
                "database schema version {} is newer than supported version {}",
                current_version, SCHEMA_VERSION
            )));
        }

        if current_version == SCHEMA_VERSION {
            debug!("Schema up to date (version {})", current_version);
            return Ok(());
        }

        info!(
            "Migrating schema from version {} to {}",
            current_version, SCHEMA_VERSION
        );

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                username TEXT PRIMARY KEY,
                token TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    fn row_to_session(row: &Row<'_>) -> rusqlite::Result<Session> {
        let username: String = row.get(0)?;
        let token: String = row.get(1)?;
        let created_at: String = row.get(2)?;

        let mut session = Session::new(username, token);
        if let Ok(ts) = DateTime::parse_from_rfc3339(&created_at) {
            session = session.with_created_at(ts.with_timezone(&Utc));
        }
        Ok(session)
    }
}

fn unavailable(e: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

impl SessionStore for SqliteStore {
    fn list_all(&self) -> StoreResult<Vec<Session>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT username, token, created_at FROM sessions ORDER BY created_at, username")
            .map_err(unavailable)?;

        let sessions = stmt
            .query_map([], Self::row_to_session)
            .map_err(unavailable)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(unavailable)?;

        Ok(sessions)
    }

    fn get(&self, username: &str) -> StoreResult<Option<Session>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT username, token, created_at FROM sessions WHERE username = ?1")
            .map_err(unavailable)?;

        let mut rows = stmt.query(params![username]).map_err(unavailable)?;

        match rows.next().map_err(unavailable)? {
            Some(row) => Ok(Some(Self::row_to_session(row).map_err(unavailable)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, username: &str, token: &str) -> StoreResult<()> {
        let conn = self.conn.lock();

        let result = conn.execute(
            "INSERT INTO sessions (username, token, created_at) VALUES (?1, ?2, ?3)",
            params![username, token, Utc::now().to_rfc3339()],
        );

        match result {
            Ok(_) => {
                debug!(username = %username, "Inserted session row");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateUser(username.to_string()))
            }
            Err(e) => Err(unavailable(e)),
        }
    }

    fn delete(&self, username: &str) -> StoreResult<bool> {
        let conn = self.conn.lock();

        let rows_affected = conn
            .execute("DELETE FROM sessions WHERE username = ?1", params![username])
            .map_err(unavailable)?;

        Ok(rows_affected > 0)
    }

    fn session_count(&self) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .map_err(unavailable)?;
        Ok(count as usize)
    }
}
