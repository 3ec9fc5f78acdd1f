//! Config command - configuration management.

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use console::{Style, style};

use warden_config::{WardenConfig, project_config_path, save_config, user_config_path};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration with defaults filled in
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Write a config file populated with defaults
    Init {
        /// Create project-local config (./warden.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local, force } => cmd_init(local, force, ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let mut config = ctx.load_config()?.resolved();
    if let Some(server) = config.server.as_mut()
        && server.admin_token.is_some()
    {
        server.admin_token = Some("********".to_string());
    }

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    let loaded = warden_config::load_config_with_options(None, ctx.config_dir.as_deref())?;

    if ctx.json_output {
        let sources: Vec<_> = loaded
            .sources
            .iter()
            .map(|s| serde_json::json!({ "path": s.path, "loaded": s.loaded }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    println!("Config file search order (later overrides earlier):\n");
    for source in &loaded.sources {
        let status = if source.loaded {
            style("✓ loaded").green()
        } else {
            Style::new().dim().apply_to("· not found")
        };
        println!("  {} {}", status, source.path.display());
    }
    for warning in &loaded.warnings {
        println!("  {} {}", style("!").yellow(), warning);
    }

    println!();
    match loaded.loaded_from().len() {
        0 => println!("No config files found. Run 'warden config init' to create one."),
        n => println!("{} config file(s) loaded.", n),
    }
    Ok(())
}

fn cmd_init(local: bool, force: bool, ctx: &Context) -> Result<()> {
    let path = if local {
        project_config_path(None)
    } else {
        user_config_path(ctx.config_dir.as_deref())
            .ok_or_else(|| anyhow!("Could not determine config directory"))?
    };

    if path.exists() && !force {
        println!("Config file already exists: {}", path.display());
        println!("Use --force to overwrite it.");
        return Ok(());
    }

    save_config(&WardenConfig::new().resolved(), &path)?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "created": path }));
    } else {
        println!("{} Created config file: {}", style("✓").green(), path.display());
    }
    Ok(())
}
