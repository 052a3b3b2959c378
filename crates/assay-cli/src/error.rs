//! Error types for the assay CLI

use std::path::PathBuf;
use thiserror::Error;

use assay::composition::{ComposeError, RenderError};
use assay::oscal::DocumentError;
use assay::ObservabilityError;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file read error
    #[error("Failed to read configuration file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration parse error
    #[error("Failed to parse configuration file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Invalid configuration or flag value
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Fewer than two assessment runs to compare
    #[error("Need at least two assessment results to compare, found {count}")]
    NotEnoughResults { count: usize },

    /// Evaluation found controls that stopped being satisfied
    #[error("Evaluation failed: {count} control(s) went from satisfied to not satisfied")]
    Regression { count: usize },

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Invalid template override: {0}")]
    Template(#[from] RenderError),

    #[error(transparent)]
    Observability(#[from] ObservabilityError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create an invalid value error
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
