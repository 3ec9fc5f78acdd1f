//! Error types for the SQLite store.

use thiserror::Error;

/// Errors raised while opening or migrating the database.
///
/// Per-operation failures go through [`warden_session::StoreError`] instead.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection or operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The database directory could not be created.
    #[error("failed to create database directory '{path}': {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Result type alias for store setup.
pub type Result<T> = std::result::Result<T, DbError>;
