//! Core error types for lazycat-core.
//!
//! Side-effect and persistence failures are never fatal to the timer; these
//! types exist so callers can log or surface them.

use std::path::PathBuf;
use thiserror::Error;

use crate::events::Event;

/// Core error type for lazycat-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Application configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Side-effect collaborator errors
    #[error("Side effect error: {0}")]
    Effect(#[from] EffectError),

    /// The runtime task is gone (shut down or panicked)
    #[error("State manager runtime is not running")]
    RuntimeStopped,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The change took effect in memory and produced `event`, but saving it
    /// failed
    #[error("Applied but not saved: {source}")]
    Unsaved {
        event: Box<Event>,
        #[source]
        source: StoreError,
    },
}

/// Persistence errors from a key-value backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing store
    #[error("Failed to open store at {path}: {message}")]
    Open { path: PathBuf, message: String },

    /// A read failed. Callers treat the key as absent.
    #[error("Failed to read '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// A write failed. In-memory state stays authoritative.
    #[error("Failed to write: {0}")]
    WriteFailed(String),
}

/// Application configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors for user preferences and onboarding answers.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors returned by side-effect collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    /// An audio or haptic asset is absent
    #[error("Resource missing: {0}")]
    ResourceMissing(String),

    /// The platform refused permission (e.g. notifications)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Any other collaborator failure
    #[error("{0}")]
    Failed(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::WriteFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
