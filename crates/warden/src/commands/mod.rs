//! CLI command handlers.

pub mod config;
pub mod sessions;
pub mod start;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::{info, warn};

use warden_config::{StoreConfig, WardenConfig};
use warden_server::SharedStore;
use warden_session::MemoryStore;
use warden_store::SqliteStore;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Config directory override.
    pub config_dir: Option<PathBuf>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Discover and merge config files, surfacing layer warnings.
    pub fn load_config(&self) -> Result<WardenConfig> {
        let loaded = warden_config::load_config_with_options(None, self.config_dir.as_deref())?;

        for warning in &loaded.warnings {
            warn!("{}", warning);
        }
        for path in loaded.loaded_from() {
            info!(path = %path.display(), "Loaded config");
        }

        Ok(loaded.config)
    }
}

/// Open the configured durable store.
pub fn open_store(store: &StoreConfig) -> Result<SharedStore> {
    if store.in_memory {
        warn!("Using in-memory session store; sessions will not survive a restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let path = store
        .resolved_path()
        .context("no database path configured and no platform data directory available")?;
    Ok(Arc::new(open_sqlite(&path)?))
}

/// Open a SQLite store, attaching the path to any error.
pub fn open_sqlite(path: &Path) -> Result<SqliteStore> {
    SqliteStore::open(path)
        .with_context(|| format!("failed to open session database at {}", path.display()))
}
