//! Snapshot cache and configuration commands.

use url::Url;

use crate::config::{self, Config};

use super::snapshot_store;

/// Print the snapshot directory of a request URL
pub fn cmd_cache_path(config: &Config, url: &str) -> anyhow::Result<()> {
    let url = Url::parse(url)?;
    let store = snapshot_store(config);
    println!("{}", store.snapshot_dir(&url).display());
    Ok(())
}

/// Print the effective configuration, optionally saving it
pub fn cmd_config(config: &Config, save: bool) -> anyhow::Result<()> {
    if let Some(path) = config::config_path() {
        println!("# {}", path.display());
    }
    print!("{}", toml::to_string_pretty(config)?);

    if save {
        config::save(config)?;
        eprintln!("✓ Configuration saved");
    }
    Ok(())
}
