//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1"
//! port = 5000
//! cors_origins = ["https://chat.example.com"]
//!
//! [session]
//! cache_size = 10
//!
//! [store]
//! path = "/var/lib/warden/sessions.db"
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Built-in defaults shared by the config layer and the CLI.
pub mod defaults {
    /// Default listen port.
    pub const DEFAULT_PORT: u16 = 5000;
    /// Default bind address.
    pub const DEFAULT_BIND: &str = "127.0.0.1";
    /// Default maximum request body size (64 KiB).
    pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;
    /// Default recency cache capacity.
    pub const DEFAULT_CACHE_SIZE: usize = warden_session::DEFAULT_CACHE_SIZE;
}

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// HTTP server configuration.
    pub server: Option<ServerConfig>,

    /// Session registry configuration.
    pub session: Option<SessionConfig>,

    /// Durable store configuration.
    pub store: Option<StoreConfig>,
}

impl WardenConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Fill every missing section with its defaults.
    pub fn resolved(&self) -> Self {
        Self {
            server: Some(self.server_or_default()),
            session: Some(self.session_or_default()),
            store: Some(self.store_or_default()),
        }
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: WardenConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }

        if other.session.is_some() {
            self.session = other.session;
        }

        if other.store.is_some() {
            self.store = other.store;
        }
    }

    /// Server section, or defaults if absent.
    pub fn server_or_default(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// Session section, or defaults if absent.
    pub fn session_or_default(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }

    /// Store section, or defaults if absent.
    pub fn store_or_default(&self) -> StoreConfig {
        self.store.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
    /// Enable request logging.
    pub request_logging: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Bearer token guarding the `/sessions` admin routes. Unset leaves them open.
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: defaults::DEFAULT_PORT,
            bind: defaults::DEFAULT_BIND.to_string(),
            cors_origins: Vec::new(),
            request_logging: true,
            max_body_size: defaults::DEFAULT_MAX_BODY_SIZE,
            admin_token: None,
        }
    }
}

impl ServerConfig {
    /// Combine `bind` and `port` into a socket address.
    pub fn socket_addr(&self) -> crate::Result<SocketAddr> {
        let ip: IpAddr = self.bind.parse().map_err(|_| ConfigError::InvalidValue {
            field: "server.bind".to_string(),
            reason: format!("'{}' is not an IP address", self.bind),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of recently validated sessions kept in memory.
    pub cache_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache_size: defaults::DEFAULT_CACHE_SIZE,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Durable store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path. Defaults to the platform data directory.
    pub path: Option<PathBuf>,
    /// Keep sessions in process memory only (lost on restart).
    pub in_memory: bool,
}

impl StoreConfig {
    /// Configured database path, falling back to the platform default.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(crate::default_db_path)
    }
}
