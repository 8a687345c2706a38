//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\release-harmonizer\config.toml
//! - macOS: ~/Library/Application Support/release-harmonizer/config.toml
//! - Linux: ~/.config/release-harmonizer/config.toml
//!
//! The config file is human-readable and editable. Command line flags
//! override individual settings for a single run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::PathOptions;
use crate::scheduler::DEFAULT_MAX_CONCURRENT;
use crate::scheduler::transport::USER_AGENT;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lookup defaults
    pub lookup: LookupConfig,

    /// Snapshot cache settings
    pub cache: CacheConfig,

    /// Outbound request settings
    pub scheduler: SchedulerConfig,

    /// API credentials (keep separate for potential future encryption)
    pub credentials: Credentials,
}

/// Lookup defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Regions tried in order (ISO 3166-1 alpha-2)
    pub regions: Vec<String>,

    /// Providers queried by GTIN lookups, in preference order
    pub providers: Vec<String>,

    /// A snapshot ceiling without a matching snapshot fails instead of fetching live
    pub strict_replay: bool,

    /// Accept lookups that mix replayed and live pages under a ceiling
    pub allow_mixed_freshness: bool,

    /// Page that permalinks point to
    pub permalink_base: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            regions: ["GB", "US", "DE", "JP"].map(String::from).to_vec(),
            providers: ["itunes", "tidal"].map(String::from).to_vec(),
            strict_replay: true,
            allow_mixed_freshness: false,
            permalink_base: "http://localhost:5110/release".to_string(),
        }
    }
}

/// Snapshot cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Snapshot directory (empty = OS cache directory)
    pub directory: Option<PathBuf>,

    /// Longest path segment before it is shortened with a hash
    pub max_segment_length: usize,

    /// Keep `/a/` and `/a` apart
    pub strict_trailing_slash: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let options = PathOptions::default();
        Self {
            directory: None,
            max_segment_length: options.max_segment_length,
            strict_trailing_slash: options.strict_trailing_slash,
        }
    }
}

impl CacheConfig {
    pub fn path_options(&self) -> PathOptions {
        PathOptions {
            max_segment_length: self.max_segment_length,
            strict_trailing_slash: self.strict_trailing_slash,
        }
    }
}

/// Outbound request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Concurrent requests per provider
    pub max_concurrent_requests: usize,

    pub user_agent: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Tidal API access token
    pub tidal_access_token: Option<String>,
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("release-harmonizer"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    match config_path() {
        Some(path) => load_from(&path),
        None => {
            tracing::warn!("Could not determine config directory, using defaults");
            Config::default()
        }
    }
}

/// Load configuration from `path`, falling back to defaults.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to the default location
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)
}

/// Save configuration to `path`
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
