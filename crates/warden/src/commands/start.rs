//! Start command - launches the Warden server.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;
use tracing::info;

use warden_server::{Server, ServerConfig};
use warden_session::{RegistryConfig, SessionRegistry};

use super::{Context, open_store};

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// SQLite database path (overrides config)
    #[arg(long, conflicts_with = "in_memory")]
    pub db: Option<PathBuf>,

    /// Keep sessions in memory only
    #[arg(long)]
    pub in_memory: bool,

    /// Number of sessions kept in the recency cache (overrides config)
    #[arg(long)]
    pub cache_size: Option<usize>,

    /// Allowed CORS origin (repeatable; default allows any origin)
    #[arg(long = "cors-origin")]
    pub cors_origins: Vec<String>,

    /// Bearer token for the /sessions admin routes (overrides config)
    #[arg(long, env = "WARDEN_ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;

    let mut server_cfg = config.server_or_default();
    if let Some(port) = args.port {
        server_cfg.port = port;
    }
    if let Some(bind) = args.bind {
        server_cfg.bind = bind;
    }
    if !args.cors_origins.is_empty() {
        server_cfg.cors_origins = args.cors_origins;
    }
    if args.admin_token.is_some() {
        server_cfg.admin_token = args.admin_token;
    }

    let mut session_cfg = config.session_or_default();
    if let Some(size) = args.cache_size {
        session_cfg.cache_size = size;
    }

    let mut store_cfg = config.store_or_default();
    if let Some(db) = args.db {
        store_cfg.path = Some(db);
        store_cfg.in_memory = false;
    }
    if args.in_memory {
        store_cfg.in_memory = true;
    }

    let addr = server_cfg.socket_addr()?;
    let store = open_store(&store_cfg)?;
    let registry = SessionRegistry::new(
        RegistryConfig::new().with_cache_size(session_cfg.cache_size),
        store,
    );

    let server_config = ServerConfig::new()
        .with_bind_address(addr)
        .with_admin_token(server_cfg.admin_token)
        .with_cors_origins(server_cfg.cors_origins)
        .with_request_logging(server_cfg.request_logging)
        .with_max_body_size(server_cfg.max_body_size);

    info!(
        cache_size = session_cfg.cache_size,
        in_memory = store_cfg.in_memory,
        "Session registry ready"
    );

    if !ctx.json_output {
        println!(
            "{} listening on {}",
            style("warden").bold(),
            style(format!("http://{}", addr)).cyan()
        );
    }

    Server::new(registry, server_config).run().await?;
    Ok(())
}
