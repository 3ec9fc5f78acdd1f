//! Error types for session registry operations.

/// Error type for session registry operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Username was empty (or only whitespace).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A session already exists for this username.
    #[error("Session already exists: {0}")]
    AlreadyExists(String),

    /// No session exists for this username.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// The durable store could not be reached or rejected the operation.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Result type for session registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by a [`SessionStore`](crate::SessionStore) backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Transport, I/O or authentication failure in the backend.
    #[error("{0}")]
    Unavailable(String),

    /// The backend enforces username uniqueness and a row already exists.
    #[error("duplicate user: {0}")]
    DuplicateUser(String),
}

/// Result type for store backends.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => Error::StoreUnavailable(msg),
            StoreError::DuplicateUser(username) => Error::AlreadyExists(username),
        }
    }
}
