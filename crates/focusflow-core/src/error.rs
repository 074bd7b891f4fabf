//! Core error types for focusflow-core.
//!
//! Each concern gets its own thiserror enum; [`CoreError`] folds them
//! together for callers that drive the whole application.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::TimerStatus;

/// Core error type for focusflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer command rejected by the state machine
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Persistent store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Rejections produced by the timer state machine.
///
/// A rejected command never changes timer state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Start attempted without a nickname
    #[error("a nickname is required before starting a session")]
    IdentityRequired,

    /// Duration outside the allowed range
    #[error("duration of {secs}s is outside the allowed range {min}s..={max}s")]
    InvalidDuration { secs: u32, min: u32, max: u32 },

    /// Command not legal in the current status
    #[error("cannot {command} while {status}")]
    NotAllowed {
        command: &'static str,
        status: TimerStatus,
    },
}

/// Persistent store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// Data directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(#[from] std::io::Error),

    /// Records could not be encoded for storage
    #[error("Failed to encode records: {0}")]
    Encode(#[from] serde_json::Error),
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
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_errors_render_readable_messages() {
        let err = TimerError::InvalidDuration {
            secs: 30,
            min: 60,
            max: 7200,
        };
        assert_eq!(
            err.to_string(),
            "duration of 30s is outside the allowed range 60s..=7200s"
        );

        let err = TimerError::NotAllowed {
            command: "reset",
            status: TimerStatus::Running,
        };
        assert_eq!(err.to_string(), "cannot reset while running");
    }

    #[test]
    fn timer_error_folds_into_core_error() {
        let err: CoreError = TimerError::IdentityRequired.into();
        assert!(matches!(err, CoreError::Timer(TimerError::IdentityRequired)));
    }
}
