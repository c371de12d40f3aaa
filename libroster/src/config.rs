//! Configuration management for Roster

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,

    /// Opt-in to the destructive migration policy: on a schema version
    /// mismatch the tables are dropped and recreated, discarding all data.
    /// Off by default; a mismatch is then a hard error.
    #[serde(default)]
    pub destructive_migration: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Simulated work duration, e.g. "2s" or "500ms".
    pub duration: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            duration: "2s".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn parsed_duration(&self) -> Result<Duration> {
        humantime::parse_duration(&self.duration).map_err(|source| {
            ConfigError::InvalidDuration {
                field: "sync.duration".to_string(),
                value: self.duration.clone(),
                source,
            }
            .into()
        })
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Load the configuration if the file exists, otherwise fall back to
    /// defaults. A file that exists but fails to parse is still an error.
    pub fn load_or_default() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Ok(Self::default_config())
        }
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: "~/.local/share/roster/users.db".to_string(),
                destructive_migration: false,
            },
            remote: RemoteConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("ROSTER_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("roster").join("config.toml"))
}
