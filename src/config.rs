//! Configuration management
//!
//! Loaded once at startup from a JSON file and immutable thereafter. A
//! missing or malformed file is fatal before the bot starts serving.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG_FILENAME: &str = "config.json";
const DEFAULT_MONITOR_INTERVAL_SECS: i64 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("api_token is missing or empty in {path}")]
    MissingToken { path: PathBuf },
}

/// Bot configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Telegram bot API token (required)
    pub api_token: String,

    /// Whitelisted Telegram usernames
    #[serde(default)]
    pub available_ids: Vec<String>,

    /// Services the bot is permitted to control
    #[serde(default)]
    pub controllable_services: Vec<String>,

    /// Long-polling timeout in seconds; values <= 0 fall back to the default
    #[serde(default)]
    pub monitor_interval: i64,

    /// Log at debug level
    #[serde(default)]
    pub is_verbose: bool,
}

impl Config {
    /// Load and validate the config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.api_token.trim().is_empty() {
            return Err(ConfigError::MissingToken {
                path: path.to_path_buf(),
            });
        }

        Ok(config)
    }

    /// Resolve the config file path: CLI argument, then the
    /// `SERVICEBOT_CONFIG` environment variable, then `./config.json`.
    pub fn resolve_path(arg: Option<&str>) -> PathBuf {
        if let Some(arg) = arg {
            return PathBuf::from(arg);
        }
        std::env::var("SERVICEBOT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILENAME))
    }

    /// Long-polling timeout for the update listener.
    pub fn poll_timeout(&self) -> Duration {
        let secs = if self.monitor_interval > 0 {
            self.monitor_interval
        } else {
            DEFAULT_MONITOR_INTERVAL_SECS
        };
        Duration::from_secs(secs as u64)
    }
}
