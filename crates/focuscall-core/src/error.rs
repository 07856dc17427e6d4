//! Core error types for focuscall-core.
//!
//! Errors only cross the library boundary from configuration, storage and
//! input validation. The orchestrator's event handlers never return one:
//! everything that goes wrong while a call is live is logged and absorbed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focuscall-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Companion stats store errors
    #[error("Stats store error: {0}")]
    Stats(#[from] StatsError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Could not resolve the data directory
    #[error("Cannot resolve data directory: {0}")]
    DataDir(String),
}

/// Errors raised by a companion stats store.
#[derive(Error, Debug)]
pub enum StatsError {
    /// Failed to open the backing database
    #[error("Failed to open stats database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Store unavailable (used by test doubles and detached stores)
    #[error("Stats store unavailable: {0}")]
    Unavailable(String),
}

/// Validation errors for session input coming from the settings form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A value that must be at least one was zero
    #[error("'{field}' must be at least 1")]
    MustBePositive { field: &'static str },

    /// Volume outside 0..=100
    #[error("Volume for '{channel}' must be within 0..=100, got {value}")]
    VolumeOutOfRange { channel: String, value: u32 },
}

impl From<rusqlite::Error> for StatsError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseBusy
                    || inner.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    StatsError::Locked
                } else {
                    StatsError::QueryFailed(err.to_string())
                }
            }
            _ => StatsError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
