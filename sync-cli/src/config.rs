//! Configuration loading for petsync.
//!
//! Configuration is loaded from a TOML file (default: `petsync.toml` in the
//! data directory). A missing default file means all defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use petsync_client::ReconcilerConfig;

/// Name of the config file looked up in the data directory.
pub const CONFIG_FILE: &str = "petsync.toml";

/// Name of the local state file in the data directory.
pub const LOCAL_FILE: &str = "local.json";

/// Root configuration for petsync.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Reconciler settings.
    #[serde(default)]
    pub sync: ReconcilerConfig,
    /// Remote store location.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Logging.
    #[serde(default)]
    pub log: LogConfig,
}

/// Remote store configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteConfig {
    /// Directory of the shared record store (default: `<data-dir>/remote`).
    pub dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset (default: `info`).
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load the explicit config file if given, else `petsync.toml` in the
    /// data directory if it exists, else defaults.
    pub fn load(data_dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let path = data_dir.join(CONFIG_FILE);
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Directory of the shared record store.
    pub fn remote_dir(&self, data_dir: &Path) -> PathBuf {
        self.remote
            .dir
            .clone()
            .unwrap_or_else(|| data_dir.join("remote"))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
