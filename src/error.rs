//! Error Types
//!
//! Errors surfaced by the progress registries, the quest catalog, the save
//! store and the session layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from quest registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestError {
    /// No quest with this id is registered or known to the catalog
    #[error("Unknown quest '{0}'")]
    UnknownQuest(String),

    /// Step index is past the end of the quest's step list
    #[error("Quest '{quest_id}' has no step {step_index} ({step_count} steps)")]
    StepOutOfRange {
        quest_id: String,
        step_index: usize,
        step_count: usize,
    },

    /// Definition cannot be registered (e.g. empty id)
    #[error("Invalid quest definition: {0}")]
    InvalidDefinition(String),
}

/// Errors from the boss progress tracker
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BossError {
    #[error("Boss id cannot be empty")]
    EmptyId,
}

/// Errors while loading quest definitions from disk
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid quest in {path:?}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("Failed to watch quest directory: {0}")]
    Watch(#[from] notify::Error),
}

/// Errors from the SQLite save store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode profile data: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid profile id '{0}'")]
    InvalidProfileId(String),
}

/// Errors from the progress session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Gameplay touched progress before a profile was applied
    #[error("No save profile has been applied yet")]
    ProfileNotReady,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors while loading the application config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },
}
