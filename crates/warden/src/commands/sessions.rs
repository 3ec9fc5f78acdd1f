//! Sessions command - inspect and prune the durable session store.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::{Style, style};
use serde_json::json;

use warden_server::Registry;
use warden_session::{RegistryConfig, Session, SessionRegistry};

use super::{Context, open_store};

/// Arguments for the sessions command.
#[derive(Args, Debug)]
pub struct SessionsArgs {
    /// SQLite database path (overrides config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: SessionsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SessionsCommand {
    /// List stored sessions
    List {
        /// Print full tokens instead of a masked prefix
        #[arg(long)]
        show_tokens: bool,
    },

    /// Show the stored session for one user
    Show {
        /// Username to look up
        username: String,
    },

    /// Remove one user's session
    Remove {
        /// Username whose session should be removed
        username: String,
    },

    /// Remove every session whose user is not in the active set
    Reconcile {
        /// Username to keep (repeatable)
        #[arg(short, long = "active")]
        active: Vec<String>,

        /// Allow an empty active set, which removes every session
        #[arg(long)]
        all: bool,
    },
}

/// Run the sessions command.
pub async fn run(args: SessionsArgs, ctx: &Context) -> Result<()> {
    let registry = open_registry(args.db, ctx)?;

    match args.command {
        SessionsCommand::List { show_tokens } => cmd_list(&registry, show_tokens, ctx),
        SessionsCommand::Show { username } => cmd_show(&registry, &username, ctx),
        SessionsCommand::Remove { username } => cmd_remove(&registry, &username, ctx),
        SessionsCommand::Reconcile { active, all } => cmd_reconcile(&registry, active, all, ctx),
    }
}

fn open_registry(db: Option<PathBuf>, ctx: &Context) -> Result<Registry> {
    let config = ctx.load_config()?;
    let mut store_cfg = config.store_or_default();

    match db {
        Some(path) => {
            store_cfg.path = Some(path);
            store_cfg.in_memory = false;
        }
        None if store_cfg.in_memory => {
            bail!("the configured store is in-memory; pass --db to inspect a database file")
        }
        None => {}
    }

    if ctx.verbose && !ctx.json_output {
        let location = store_cfg
            .resolved_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(no path)".to_string());
        println!(
            "{}",
            Style::new().dim().apply_to(format!("Database: {}", location))
        );
    }

    let session_cfg = config.session_or_default();
    Ok(SessionRegistry::new(
        RegistryConfig::new().with_cache_size(session_cfg.cache_size),
        open_store(&store_cfg)?,
    ))
}

fn cmd_list(registry: &Registry, show_tokens: bool, ctx: &Context) -> Result<()> {
    let sessions = registry.list_sessions()?;
    let dim = Style::new().dim();

    if ctx.json_output {
        let items: Vec<_> = sessions
            .iter()
            .map(|s| session_json(s, show_tokens))
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("{}", dim.apply_to("No sessions stored"));
        return Ok(());
    }

    println!("{}", style("Sessions").bold());
    println!("{}", dim.apply_to("─".repeat(50)));
    println!();

    for session in &sessions {
        let token = if show_tokens {
            session.token.clone()
        } else {
            mask_token(&session.token)
        };
        let created = session
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<24} {}  {}",
            style(&session.username).cyan(),
            token,
            dim.apply_to(created)
        );
    }

    println!();
    println!("{}", dim.apply_to(format!("{} session(s)", sessions.len())));
    Ok(())
}

fn cmd_show(registry: &Registry, username: &str, ctx: &Context) -> Result<()> {
    let session = registry.get_session(username)?;

    if ctx.json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&session_json(&session, true))?
        );
        return Ok(());
    }

    println!("  User:     {}", style(&session.username).cyan());
    println!("  Token:    {}", session.token);
    if let Some(created) = session.created_at {
        println!("  Created:  {}", created.to_rfc3339());
    }
    Ok(())
}

fn cmd_remove(registry: &Registry, username: &str, ctx: &Context) -> Result<()> {
    let removed = registry.remove_session(username)?;

    if ctx.json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "username": username.trim(),
                "removed": removed,
            }))?
        );
    } else if removed {
        println!("{} Removed session for {}", style("✓").green(), username.trim());
    } else {
        println!(
            "{}",
            Style::new()
                .dim()
                .apply_to(format!("No session stored for {}", username.trim()))
        );
    }
    Ok(())
}

fn cmd_reconcile(registry: &Registry, active: Vec<String>, all: bool, ctx: &Context) -> Result<()> {
    if active.is_empty() && !all {
        bail!("no --active users given; pass --all to remove every session");
    }

    let active: HashSet<String> = active.into_iter().collect();
    let report = registry.reconcile(&active)?;

    if ctx.json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "removed": report.removed,
                "failed": report.failed,
                "error": report.first_error.as_ref().map(|e| e.to_string()),
            }))?
        );
    } else {
        println!(
            "{} Removed {} stale session(s)",
            style("✓").green(),
            report.removed
        );
        if let Some(err) = &report.first_error {
            let red = Style::new().red();
            eprintln!(
                "{} {} removal(s) failed; first error: {}",
                red.apply_to("Error:"),
                report.failed,
                err
            );
        }
    }

    if !report.is_complete() {
        bail!("reconcile incomplete: {} removal(s) failed", report.failed);
    }
    Ok(())
}

fn session_json(session: &Session, show_token: bool) -> serde_json::Value {
    let token = if show_token {
        session.token.clone()
    } else {
        mask_token(&session.token)
    };
    json!({
        "username": session.username,
        "token": token,
        "createdAt": session.created_at.map(|t| t.to_rfc3339()),
    })
}

/// Keep the first four characters of a token.
fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{}…", prefix)
}
