//! Durable store contract for sessions.
//!
//! The registry treats the store as the source of truth and talks to it only
//! through [`SessionStore`]. Calls are blocking and individually atomic;
//! nothing here is transactional across calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::StoreResult;

/// A `(username, token)` pair representing an authorized principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Owner of the session.
    pub username: String,

    /// Opaque session token.
    pub token: String,

    /// When the session was written to the store, if the backend records it.
    pub created_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a new session.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            created_at: None,
        }
    }

    /// Set creation timestamp.
    pub fn with_created_at(mut self, ts: DateTime<Utc>) -> Self {
        self.created_at = Some(ts);
        self
    }
}

/// Trait for durable session backends.
///
/// Implementations are not required to enforce username uniqueness; the
/// registry checks for an existing row before inserting. A backend that does
/// enforce it reports [`StoreError::DuplicateUser`](crate::StoreError) from
/// [`insert`](Self::insert).
pub trait SessionStore: Send + Sync {
    /// Every stored session.
    fn list_all(&self) -> StoreResult<Vec<Session>>;

    /// Load the session for `username`, or `None` if there is no row.
    fn get(&self, username: &str) -> StoreResult<Option<Session>>;

    /// Write a new session row.
    fn insert(&self, username: &str, token: &str) -> StoreResult<()>;

    /// Delete the row for `username`. Returns `true` iff a row was removed.
    fn delete(&self, username: &str) -> StoreResult<bool>;

    /// Number of stored sessions. Also serves as a liveness probe.
    fn session_count(&self) -> StoreResult<usize> {
        self.list_all().map(|rows| rows.len())
    }
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn list_all(&self) -> StoreResult<Vec<Session>> {
        (**self).list_all()
    }

    fn get(&self, username: &str) -> StoreResult<Option<Session>> {
        (**self).get(username)
    }

    fn insert(&self, username: &str, token: &str) -> StoreResult<()> {
        (**self).insert(username, token)
    }

    fn delete(&self, username: &str) -> StoreResult<bool> {
        (**self).delete(username)
    }

    fn session_count(&self) -> StoreResult<usize> {
        (**self).session_count()
    }
}

impl<S: SessionStore + ?Sized> SessionStore for Box<S> {
    fn list_all(&self) -> StoreResult<Vec<Session>> {
        (**self).list_all()
    }

    fn get(&self, username: &str) -> StoreResult<Option<Session>> {
        (**self).get(username)
    }

    fn insert(&self, username: &str, token: &str) -> StoreResult<()> {
        (**self).insert(username, token)
    }

    fn delete(&self, username: &str) -> StoreResult<bool> {
        (**self).delete(username)
    }

    fn session_count(&self) -> StoreResult<usize> {
        (**self).session_count()
    }
}

/// In-process store for tests and ephemeral deployments.
///
/// Sessions are lost when the process exits. Inserting an existing username
/// overwrites the row, matching the bare store contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<String, Session>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn list_all(&self) -> StoreResult<Vec<Session>> {
        Ok(self.rows.lock().values().cloned().collect())
    }

    fn get(&self, username: &str) -> StoreResult<Option<Session>> {
        Ok(self.rows.lock().get(username).cloned())
    }

    fn insert(&self, username: &str, token: &str) -> StoreResult<()> {
        let session = Session::new(username, token).with_created_at(Utc::now());
        self.rows.lock().insert(username.to_string(), session);
        Ok(())
    }

    fn delete(&self, username: &str) -> StoreResult<bool> {
        Ok(self.rows.lock().remove(username).is_some())
    }

    fn session_count(&self) -> StoreResult<usize> {
        Ok(self.rows.lock().len())
    }
}
