//! Error types for the normalization pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type for normalization operations
pub type Result<T> = std::result::Result<T, NormalizeError>;

/// Errors that can occur while normalizing audio assets
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The loudness engine cannot be invoked at all
    #[error("Loudness engine unavailable: {0}")]
    EngineUnavailable(String),

    /// No explicit input paths and the default directory is missing
    #[error("No audio directory found at: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The engine ran but produced no parseable measurement
    #[error("Failed to measure {}: {reason}", path.display())]
    Measurement { path: PathBuf, reason: String },

    /// Both integrated loudness and true peak are non-finite
    #[error("Unmeasurable audio (no finite loudness or peak): {}", .0.display())]
    Unmeasurable(PathBuf),

    /// The engine's filter pass failed
    #[error("Failed to normalize {}: {reason}", path.display())]
    Apply { path: PathBuf, reason: String },

    /// Post-apply re-measurement failed
    #[error("Could not verify {}: {reason}", path.display())]
    Verify { path: PathBuf, reason: String },

    /// File extension is not one of the supported formats
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NormalizeError {
    /// Whether this error aborts the whole run rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EngineUnavailable(_) | Self::InputNotFound(_) | Self::Config(_)
        )
    }
}

impl From<config::ConfigError> for NormalizeError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
