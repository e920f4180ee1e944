//! Core error types for pacekeeper-core.
//!
//! This module defines the error hierarchy using thiserror. Every failure is
//! local to the operation that caused it; sample errors never end a session.

use std::path::PathBuf;
use thiserror::Error;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Target speed outside the accepted range (or not a number)
    #[error("Invalid target speed {value} km/h: must be between {min} and {max}")]
    InvalidTarget { value: f64, min: f64, max: f64 },
}

/// Errors raised by a speed sample source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Location permission was not granted; tracking does not start.
    #[error("Location permission denied")]
    PermissionDenied,

    /// The location capability is absent; tracking does not start.
    #[error("Location source unavailable: {0}")]
    SourceUnavailable(String),

    /// Transient error reported instead of a sample (timeout, signal loss).
    #[error("{0}")]
    Sample(String),
}

impl SourceError {
    /// Whether the error prevents a session from starting. Reported while
    /// tracking, it means the source has nothing more to deliver.
    pub fn is_fatal_to_start(&self) -> bool {
        matches!(
            self,
            SourceError::PermissionDenied | SourceError::SourceUnavailable(_)
        )
    }
}

/// Errors raised while delivering an alert.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Writing the alert failed
    #[error("Alert output failed: {0}")]
    Io(#[from] std::io::Error),

    /// Audio or haptic capability missing
    #[error("Alert capability unavailable: {0}")]
    Unavailable(String),
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

    /// Key does not exist in the configuration
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}
