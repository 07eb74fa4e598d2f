//! Configuration management for trackbridge.
//!
//! Config lives in a TOML file under the platform config directory:
//!
//! - **macOS/Linux**: `~/.config/trackbridge/config.toml`
//! - **Windows**: `%APPDATA%\trackbridge\config.toml`
//!
//! # Example
//!
//! ```ignore
//! use trackbridge_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.set("youtrack.url", "https://youtrack.example.com")?;
//! config.set("youtrack.project", "DEMO")?;
//! config.save()?;
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "trackbridge";

/// Name of the custom field holding the issue state, unless overridden.
pub const DEFAULT_STATE_FIELD: &str = "State";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// YouTrack configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtrack: Option<YouTrackConfig>,
}

/// YouTrack connection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YouTrackConfig {
    /// Instance URL, e.g. `https://youtrack.example.com`
    pub url: String,
    /// Permanent token. The `YOUTRACK_TOKEN` environment variable wins over this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Default project (id or short name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Name of the state custom field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl YouTrackConfig {
    pub fn state_field(&self) -> &str {
        self.state_field.as_deref().unwrap_or(DEFAULT_STATE_FIELD)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// True once a YouTrack URL has been set.
    pub fn is_configured(&self) -> bool {
        self.youtrack
            .as_ref()
            .is_some_and(|yt| !yt.url.trim().is_empty())
    }

    /// Set a configuration value by key path, e.g. `youtrack.url`.
    ///
    /// The key and value are checked before anything changes, so a rejected
    /// call leaves the config as it was.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let field = youtrack_field(key)?;
        let timeout = match field {
            "url" | "token" | "project" | "state_field" => None,
            "timeout_secs" | "timeout" => Some(value.parse::<u64>().map_err(|_| {
                Error::Config(format!("Invalid timeout '{}': expected seconds", value))
            })?),
            _ => {
                return Err(Error::Config(format!(
                    "Unknown YouTrack config field: {}",
                    field
                )))
            }
        };

        let config = self.youtrack.get_or_insert_with(YouTrackConfig::default);
        match (field, timeout) {
            (_, Some(secs)) => config.timeout_secs = Some(secs),
            ("url", _) => config.url = value.to_string(),
            ("token", _) => config.token = Some(value.to_string()),
            ("project", _) => config.project = Some(value.to_string()),
            _ => config.state_field = Some(value.to_string()),
        }

        Ok(())
    }

    /// Get a configuration value by key path, e.g. `youtrack.project`.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let field = youtrack_field(key)?;
        let Some(config) = &self.youtrack else {
            return Ok(None);
        };

        match field {
            "url" => Ok(Some(config.url.clone())),
            "token" => Ok(config.token.clone()),
            "project" => Ok(config.project.clone()),
            "state_field" => Ok(Some(config.state_field().to_string())),
            "timeout_secs" | "timeout" => Ok(Some(config.timeout_secs().to_string())),
            _ => Err(Error::Config(format!(
                "Unknown YouTrack config field: {}",
                field
            ))),
        }
    }
}

/// Split `youtrack.<field>` and return the field part.
fn youtrack_field(key: &str) -> Result<&str> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: youtrack.field",
            key
        )));
    }
    match parts[0] {
        "youtrack" => Ok(parts[1]),
        other => Err(Error::Config(format!("Unknown config section: {}", other))),
    }
}

// =============================================================================
// Tests
// =============================================================================
