//! Durable session storage for Warden using SQLite.
//!
//! [`SqliteStore`] implements [`warden_session::SessionStore`]. The
//! `sessions` table keys rows by username, so a concurrent duplicate insert
//! is rejected by the database and reported as
//! [`StoreError::DuplicateUser`](warden_session::StoreError).

mod error;
mod store;

pub use error::{DbError, Result};
pub use store::SqliteStore;
