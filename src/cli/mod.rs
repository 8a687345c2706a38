//! Command-line interface for release-harmonizer.
//!
//! Looks up releases across providers, replays permalinks and inspects the
//! snapshot cache.

mod commands;

pub use commands::{Cli, Commands, run_command};
