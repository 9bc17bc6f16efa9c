//! Dashboard configuration management

use anyhow::{Context, Result};
use inspector_common::constants;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Get the configuration directory path
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("request-inspector")
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".request-inspector")
    }
}

/// Get the config file path
pub fn config_file() -> PathBuf {
    config_dir().join("config.yml")
}

/// Get the logs directory
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Log file used while the TUI owns the terminal
pub fn log_file() -> PathBuf {
    logs_dir().join("dashboard.log")
}

/// Ensure all config directories exist
pub fn ensure_dirs() -> Result<()> {
    fs::create_dir_all(config_dir()).context("Failed to create config directory")?;
    fs::create_dir_all(logs_dir()).context("Failed to create logs directory")?;
    Ok(())
}

/// Main configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Inspection backend (default: http://localhost:5000)
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Maximum requests kept in the feed; unbounded when absent
    #[serde(default)]
    pub feed_capacity: Option<usize>,

    #[serde(default = "default_snapshot_timeout_secs")]
    pub snapshot_timeout_secs: u64,

    /// Upper bound for the live stream reconnect delay
    #[serde(default = "default_reconnect_max_secs")]
    pub reconnect_max_secs: u64,
}

fn default_snapshot_timeout_secs() -> u64 {
    10
}

fn default_reconnect_max_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: None,
            feed_capacity: None,
            snapshot_timeout_secs: default_snapshot_timeout_secs(),
            reconnect_max_secs: default_reconnect_max_secs(),
        }
    }
}

impl Config {
    /// Load config from the default file
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save config to the default file
    pub fn save(&self) -> Result<()> {
        ensure_dirs()?;
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(config_file(), content).context("Failed to write config file")?;
        Ok(())
    }

    /// Apply overrides on top of the file values.
    ///
    /// `backend_url` is the CLI flag or the `BACKEND_URL` environment variable,
    /// whichever clap picked.
    pub fn resolve(
        &self,
        backend_url: Option<String>,
        feed_capacity: Option<usize>,
    ) -> Result<Settings> {
        let backend_url = backend_url
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| constants::DEFAULT_BACKEND_URL.to_string());
        let backend_url = backend_url.trim().trim_end_matches('/').to_string();

        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            anyhow::bail!(
                "Backend URL must start with http:// or https://, got {:?}",
                backend_url
            );
        }

        // The socket endpoint is built from the authority alone
        let authority = backend_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or_default();
        if authority.is_empty() || authority.contains(['/', '?', '#']) {
            anyhow::bail!(
                "Backend URL must be scheme://host[:port] without a path, got {:?}",
                backend_url
            );
        }

        Ok(Settings {
            backend_url,
            feed_capacity: feed_capacity.or(self.feed_capacity),
            snapshot_timeout: Duration::from_secs(self.snapshot_timeout_secs.max(1)),
            reconnect_max: Duration::from_secs(self.reconnect_max_secs.max(1)),
        })
    }
}

/// Effective settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub feed_capacity: Option<usize>,
    pub snapshot_timeout: Duration,
    pub reconnect_max: Duration,
}

impl Settings {
    /// Socket.IO websocket endpoint derived from the backend URL
    pub fn socket_url(&self) -> String {
        let ws_scheme = if self.backend_url.starts_with("https://") {
            "wss"
        } else {
            "ws"
        };
        let host = self
            .backend_url
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        format!(
            "{}://{}{}?EIO={}&transport=websocket",
            ws_scheme,
            host,
            constants::SOCKET_PATH,
            constants::ENGINE_IO_VERSION
        )
    }
}
