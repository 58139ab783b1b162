//! Core error types for credtrack-core.
//!
//! This module defines the error hierarchy using thiserror. The split
//! mirrors how failures are handled by the refresh orchestrator:
//! store/settings faults abort a run, delivery faults are counted per item.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for credtrack-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Schedule store errors (fatal for a refresh run)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Settings persistence errors
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

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

/// Schedule-store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the store database
    #[error("Failed to open schedule store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Schedule store is locked")]
    Locked,
}

/// Settings-specific errors.
///
/// Invalid configuration is rejected at save time so malformed values
/// never reach the scheduling engine.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to load settings
    #[error("Failed to load settings from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save settings
    #[error("Failed to save settings to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid settings value
    #[error("Invalid settings value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse settings
    #[error("Failed to parse settings: {0}")]
    ParseFailed(String),
}

/// Per-item delivery-platform errors.
///
/// These are counted in the refresh summary, not propagated -- a failed
/// schedule call self-heals on the next refresh via the reconciler's diff.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The platform rejected or failed a schedule request
    #[error("Schedule call failed: {0}")]
    ScheduleFailed(String),

    /// The platform rejected or failed a cancel request
    #[error("Cancel call failed: {0}")]
    CancelFailed(String),

    /// The platform call timed out
    #[error("Delivery platform call timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
