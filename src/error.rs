//! Error types for maintenance-ml
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)
//!
//! Variants group into three families:
//! - input schema: [`Error::InputSchema`], [`Error::InsufficientRows`]
//! - resource access: [`Error::FileAccess`], [`Error::ModelLoad`], [`Error::NotFound`]
//! - computation: [`Error::Computation`]

use std::path::Path;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// maintenance-ml error types
#[derive(Error, Debug)]
pub enum Error {
    /// Dataset file could not be opened or parsed
    #[error("Failed to read dataset '{path}': {reason}")]
    FileAccess {
        /// Offending path
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// Missing, non-numeric or null-bearing column, or malformed request field
    #[error("Input schema error: {0}")]
    InputSchema(String),

    /// Dataset too small to produce non-empty train and validation partitions
    #[error("Too few rows to split: got {rows}, need at least {required}")]
    InsufficientRows {
        /// Rows available
        rows: usize,
        /// Minimum rows required
        required: usize,
    },

    /// Model artifact could not be loaded
    #[error("Failed to load model from '{location}': {reason}")]
    ModelLoad {
        /// Path or URI that was requested
        location: String,
        /// Underlying failure
        reason: String,
    },

    /// Tracking store lookup matched nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Fit, predict, metric or drift computation failed
    #[error("Computation failed: {0}")]
    Computation(String),

    /// Tracking store write or layout error
    #[error("Tracking store error: {0}")]
    Tracking(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::FileAccess`] for `path`
    pub fn file_access(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::FileAccess {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`Error::ModelLoad`] for `location`
    pub fn model_load(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::ModelLoad {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// True for errors caused by caller input rather than server state
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::InputSchema(_) | Self::InsufficientRows { .. })
    }
}
