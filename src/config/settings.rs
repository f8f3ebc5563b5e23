//! Application configuration

use anyhow::{Context, Result};
use hwsens_core::constants::{DEFAULT_MUTEX_TIMEOUT, DEFAULT_POLL_INTERVAL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the config format
    pub version: u32,
    /// Polling of the shared memory segment
    #[serde(default)]
    pub poll: PollConfig,
    /// How snapshots are printed
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "hwsens", "hwsens")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.json"))
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            poll: PollConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

fn default_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_mutex_timeout_ms() -> u64 {
    DEFAULT_MUTEX_TIMEOUT.as_millis() as u64
}

fn default_user_labels() -> bool {
    true
}

/// Polling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Time between snapshots in watch mode
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Upper bound on waiting for the segment mutex
    #[serde(default = "default_mutex_timeout_ms")]
    pub mutex_timeout_ms: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        // A zero period would spin
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn mutex_timeout(&self) -> Duration {
        Duration::from_millis(self.mutex_timeout_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            mutex_timeout_ms: default_mutex_timeout_ms(),
        }
    }
}

/// Output format of the debugger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Prefer user-assigned names and labels over the original ones
    #[serde(default = "default_user_labels")]
    pub user_labels: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            user_labels: default_user_labels(),
        }
    }
}
