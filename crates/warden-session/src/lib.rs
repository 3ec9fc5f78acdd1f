//! Session registry with a recency cache in front of a durable store.
//!
//! This crate provides the session-validity core of Warden:
//! - Random opaque token issuance
//! - Cache-aside validation backed by a pluggable [`SessionStore`]
//! - Cache invalidation on write and delete
//! - Reconciliation of stored sessions against an externally supplied
//!   "currently active" set
//!
//! # Example
//!
//! ```rust
//! use warden_session::{RegistryConfig, SessionRegistry};
//!
//! let registry = SessionRegistry::in_memory(RegistryConfig::default().with_cache_size(10));
//!
//! let session = registry.create_session("alice").unwrap();
//! assert!(registry.validate("alice", &session.token));
//! assert!(registry.remove_session("alice").unwrap());
//! ```

mod cache;
mod config;
mod error;
mod persistence;
mod registry;
mod token;

pub use cache::{CacheEntry, CacheStats, RecencyCache};
pub use config::{DEFAULT_CACHE_SIZE, RegistryConfig};
pub use error::{Error, Result, StoreError, StoreResult};
pub use persistence::{MemoryStore, Session, SessionStore};
pub use registry::{ReconcileReport, RegistryStats, SessionRegistry, normalize_username};
pub use token::{RandomTokenGenerator, TOKEN_LENGTH, TokenGenerator, generate_token};
