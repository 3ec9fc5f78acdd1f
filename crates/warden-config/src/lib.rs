//! Configuration system for the Warden session service.
//!
//! Provides TOML-based configuration with:
//! - `[server]`, `[session]` and `[store]` sections, all optional
//! - Config file layering (user config dir + project-local overrides)
//! - Platform default locations for the config directory and database

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, default_db_path, load_config_file, load_config_with_options,
    project_config_path, save_config, user_config_path, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
