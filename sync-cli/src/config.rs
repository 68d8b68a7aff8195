//! Configuration management for the feedsync CLI.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use feedsync_client::ClientConfig;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";
const PREFS_FILE: &str = "prefs.json";

/// Per-user directories for the CLI.
pub struct CliDirs {
    /// Directory holding `config.toml`.
    pub config_dir: PathBuf,
    /// Directory holding persisted preferences.
    pub data_dir: PathBuf,
}

impl CliDirs {
    /// Platform default directories.
    pub fn platform() -> Result<Self> {
        let dirs = ProjectDirs::from("io", "feedsync", "feedsync")
            .context("Could not determine home directory")?;
        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
            data_dir: dirs.data_dir().to_path_buf(),
        })
    }

    /// Both directories rooted at `root`.
    pub fn rooted(root: &Path) -> Self {
        Self {
            config_dir: root.to_path_buf(),
            data_dir: root.to_path_buf(),
        }
    }

    /// Default config file location.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}

/// Load the client configuration.
///
/// An explicit path must exist. The default path is optional; when it is
/// missing every setting takes its default. Preferences are persisted under
/// the data directory unless the file names another location.
pub async fn load(explicit: Option<&Path>, dirs: &CliDirs) -> Result<ClientConfig> {
    let mut config = match explicit {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            let path = dirs.config_path();
            if path.exists() {
                ClientConfig::from_file(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?
            } else {
                tracing::debug!("No config at {}, using defaults", path.display());
                ClientConfig::default()
            }
        }
    };

    if config.prefs.path.is_none() {
        tokio::fs::create_dir_all(&dirs.data_dir)
            .await
            .context("Failed to create data directory")?;
        config.prefs.path = Some(dirs.data_dir.join(PREFS_FILE));
    }

    Ok(config)
}
