//! CLI configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Device settings
    #[serde(default)]
    pub device: DeviceSection,
    /// Logging settings
    #[serde(default)]
    pub log: LogSection,
}

/// Device settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeviceSection {
    /// Register tree root; the live sysfs tree is used when unset.
    pub register_root: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// Log level applied when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Load configuration from file or defaults.
///
/// # Errors
///
/// Returns an error when the config file exists but cannot be read or
/// parsed.
pub fn load_config() -> Result<Config> {
    let Some(config_path) = config_path() else {
        return Ok(Config::default());
    };

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {config_path:?}"))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {config_path:?}"))?;
        Ok(config)
    } else {
        debug!(?config_path, "Config file not found, using defaults");
        Ok(Config::default())
    }
}

/// Get the configuration file path.
fn config_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("io", "stagehand", "Stagehand")?;
    Some(dirs.config_dir().join("config.toml"))
}
