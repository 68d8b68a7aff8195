//! Configuration loading for feedsync clients.
//!
//! Configuration is loaded from a TOML file (default: `feedsync.toml`).
//! Every section and key is optional.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// Remote API configuration.
    #[serde(default)]
    pub api: ApiConfig,
    /// Liveness polling configuration.
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
    /// Seen tracking configuration.
    #[serde(default)]
    pub seen: SeenConfig,
    /// Preferences storage configuration.
    #[serde(default)]
    pub prefs: PrefsConfig,
}

/// Remote API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API (default: http://localhost:8080).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Deadline for every remote call in milliseconds (default: 7000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Liveness polling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectivityConfig {
    /// Pause between the end of one check and the start of the next (default: 1000).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Deadline for a single liveness check in milliseconds (default: 7000).
    #[serde(default = "default_request_timeout_ms")]
    pub check_timeout_ms: u64,
    /// Online flag before the first check completes (default: true).
    #[serde(default = "default_assume_online")]
    pub assume_online: bool,
}

/// Seen tracking configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SeenConfig {
    /// Debounce before a deferred visit is committed (default: 1000).
    #[serde(default = "default_commit_delay_ms")]
    pub commit_delay_ms: u64,
}

/// Preferences storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrefsConfig {
    /// JSON file mirroring the preferences. In-memory only when unset.
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    7000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_assume_online() -> bool {
    true
}

fn default_commit_delay_ms() -> u64 {
    1000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            check_timeout_ms: default_request_timeout_ms(),
            assume_online: default_assume_online(),
        }
    }
}

impl Default for SeenConfig {
    fn default() -> Self {
        Self {
            commit_delay_ms: default_commit_delay_ms(),
        }
    }
}

impl ApiConfig {
    /// Request deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl ConnectivityConfig {
    /// Pause between checks.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Liveness check deadline.
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}

impl SeenConfig {
    /// Deferred commit debounce.
    pub fn commit_delay(&self) -> Duration {
        Duration::from_millis(self.commit_delay_ms)
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
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
