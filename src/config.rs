//! Application configuration.
//!
//! Read from an optional TOML file, then overridden by `QUESTLINE_*`
//! environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "questline.toml";

const ENV_DATA_DIR: &str = "QUESTLINE_DATA_DIR";
const ENV_DATABASE_URL: &str = "QUESTLINE_DATABASE_URL";
const ENV_HOT_RELOAD: &str = "QUESTLINE_HOT_RELOAD";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the game data; quests live in `<data_dir>/quests`
    pub data_dir: PathBuf,
    /// sqlx connection string for the save store
    pub database_url: String,
    /// Rebuild the quest catalog when quest files change
    pub hot_reload: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database_url: "sqlite:questline.db?mode=rwc".to_string(),
            hot_reload: false,
        }
    }
}

impl AppConfig {
    /// Load from `path` (or `questline.toml` if present) and apply
    /// environment overrides. An explicit path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.database_url = url;
        }
        if let Some(value) = lookup(ENV_HOT_RELOAD) {
            self.hot_reload = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        key: ENV_HOT_RELOAD,
                        value,
                    });
                }
            };
        }
        Ok(())
    }
}
