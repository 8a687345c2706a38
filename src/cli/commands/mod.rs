//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `lookup`: combined lookups and permalink replay
//! - `cache`: snapshot cache inspection and configuration

mod cache;
mod lookup;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::cache::DiskSnapshotStore;
use crate::config::Config;
use crate::lookup::LookupEngine;
use crate::scheduler::ReqwestTransport;

pub use cache::{cmd_cache_path, cmd_config};
pub use lookup::{LookupArgs, cmd_lookup, cmd_permalink};

/// Release Harmonizer CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Look up a release by GTIN, provider ID or provider URL
    Lookup(LookupArgs),
    /// Replay the lookup encoded in a permalink
    Permalink {
        /// Permalink URL
        url: String,
        /// Print the merged release as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show where the snapshots of a request URL are stored
    CachePath {
        /// Request URL
        url: String,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = crate::config::load();

    match &cli.command {
        Commands::Lookup(args) => {
            let rt = Runtime::new()?;
            let engine = build_engine(&config)?;
            cmd_lookup(&rt, &engine, &config, args)
        }
        Commands::Permalink { url, json } => {
            let rt = Runtime::new()?;
            let engine = build_engine(&config)?;
            cmd_permalink(&rt, &engine, &config, url, *json)
        }
        Commands::CachePath { url } => cmd_cache_path(&config, url),
        Commands::Config { save } => cmd_config(&config, *save),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Snapshot store configured by the `[cache]` section.
pub(crate) fn snapshot_store(config: &Config) -> DiskSnapshotStore {
    let options = config.cache.path_options();
    match &config.cache.directory {
        Some(directory) => DiskSnapshotStore::new(directory, options),
        None => DiskSnapshotStore::default_location(options),
    }
}

/// Engine with a live HTTP transport and the on-disk snapshot cache.
fn build_engine(config: &Config) -> anyhow::Result<LookupEngine> {
    let transport = ReqwestTransport::with_user_agent(&config.scheduler.user_agent)?;
    Ok(LookupEngine::new(
        config,
        Arc::new(transport),
        Arc::new(snapshot_store(config)),
    ))
}
