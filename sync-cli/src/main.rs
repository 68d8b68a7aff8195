//! # feedsync
//!
//! CLI tool for exercising a feedsync API from a terminal.
//!
//! ## Commands
//!
//! - `probe`: Run one liveness check
//! - `watch`: Poll liveness and print transitions
//! - `fetch`: Fetch one group or feed item by id or alias
//! - `list`: List all groups or feed items
//! - `feed`: Load the feed like a feed view, optionally marking it seen
//! - `pref`: Read or write a persisted preference
//!
//! ## Example
//!
//! ```bash
//! # Is the API reachable?
//! feedsync --base-url https://api.example.com probe
//!
//! # Fetch a group by its slug
//! feedsync fetch group rust
//!
//! # Show new items and acknowledge them
//! feedsync feed --mark-seen
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feedsync_client::{HttpTransport, SyncContext};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{feed, fetch, list, pref, probe, watch, Kind};
use config::CliDirs;

/// CLI tool for exercising a feedsync API.
#[derive(Parser, Debug)]
#[command(name = "feedsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL from the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one liveness check
    Probe,

    /// Poll liveness and print transitions until Ctrl-C
    Watch {
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },

    /// Fetch one entity by id or alias
    Fetch {
        /// Resource kind
        #[arg(value_enum)]
        kind: Kind,

        /// Numeric id, or a name/slug for groups
        reference: String,

        /// Bypass the cache
        #[arg(long)]
        refresh: bool,
    },

    /// List all entities of a kind
    List {
        /// Resource kind
        #[arg(value_enum)]
        kind: Kind,
    },

    /// Load the feed, marking new items below a divider
    Feed {
        /// Acknowledge everything loaded as seen
        #[arg(long)]
        mark_seen: bool,
    },

    /// Read or write a preference
    Pref {
        /// Preference key
        key: String,

        /// New value (JSON, or a plain string)
        value: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let dirs = CliDirs::platform()?;
    let mut config = config::load(cli.config.as_deref(), &dirs).await?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }

    let transport = Arc::new(HttpTransport::new(config.api.base_url.clone()));
    let ctx = SyncContext::new(config, transport).context("Failed to open preferences")?;

    match cli.command {
        Commands::Probe => {
            if !probe::run(&ctx).await? {
                std::process::exit(1);
            }
        }
        Commands::Watch { seconds } => {
            watch::run(&ctx, seconds.map(Duration::from_secs)).await?;
        }
        Commands::Fetch {
            kind,
            reference,
            refresh,
        } => {
            if fetch::run(&ctx, kind, &reference, refresh).await?.is_none() {
                std::process::exit(1);
            }
        }
        Commands::List { kind } => {
            list::run(&ctx, kind).await?;
        }
        Commands::Feed { mark_seen } => {
            feed::run(&ctx, mark_seen).await?;
        }
        Commands::Pref { key, value } => {
            pref::run(&ctx, &key, value.as_deref())?;
        }
    }

    Ok(())
}
