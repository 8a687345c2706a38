//! Release Harmonizer - looks up music releases across streaming providers.
//!
//! Each provider's metadata is normalized into one release model, merged
//! with the other providers' results and reconciled. Every outbound request
//! is cached as a timestamped snapshot so lookups can be replayed from a
//! permalink.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod lookup;
pub mod model;
pub mod providers;
pub mod reconcile;
pub mod scheduler;
pub mod text;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Logs go to stderr so `--json` output stays clean
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("release_harmonizer=info".parse()?))
        .init();

    cli::run_command(&args)
}
