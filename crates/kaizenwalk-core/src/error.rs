//! Core error types for kaizenwalk-core.
//!
//! Resource-unavailable failures (wake lock, notification permission) are
//! deliberately absent here: they are logged at the call site and never
//! surface as errors. Only failures that change control flow get a type.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for kaizenwalk-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer engine errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Asset cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Timer engine errors.
///
/// `PlaybackStart` is the only fatal start-path failure: the engine aborts
/// the transition, returns to `Idle` and holds nothing.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The cue source refused to start; the start transition was aborted.
    #[error("Playback failed to start: {0}")]
    PlaybackStart(String),

    /// `start()` was called while a session is already running.
    #[error("Timer is already running")]
    AlreadyRunning,
}

/// Asset cache errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Network fetch failed
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Underlying cache store failed
    #[error("Cache store error: {0}")]
    Store(String),

    /// Install-phase seeding could not fetch the full app shell
    #[error("App shell seeding failed: {0}")]
    InstallFailed(String),

    /// The cache worker command channel is gone
    #[error("Cache worker is not running")]
    WorkerGone,
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Fetch {
            url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            message: err.to_string(),
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::QueryFailed(err.to_string())
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
