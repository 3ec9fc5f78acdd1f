//! Application state shared across handlers.

use std::sync::Arc;

use warden_session::{SessionRegistry, SessionStore};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// Store handle the server's registry is built over.
pub type SharedStore = Arc<dyn SessionStore>;

/// Registry type served over HTTP.
pub type Registry = SessionRegistry<SharedStore>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The session registry.
    pub registry: Arc<Registry>,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(registry: Registry, config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run a registry operation on the blocking pool.
    ///
    /// Store calls block on I/O, so they stay off the async workers.
    pub async fn with_registry<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Registry) -> T + Send + 'static,
        T: Send + 'static,
    {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || f(&registry))
            .await
            .map_err(|e| ServerError::Internal(format!("registry task failed: {}", e)))
    }
}
