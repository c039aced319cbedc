//! Error types for plan loading and data ingestion.

use std::path::PathBuf;

use focus_model::ConfigError;
use thiserror::Error;

/// Errors that can occur while loading plans or input data.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not a directory.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Input file or dataset not found.
    #[error("input not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Rule Configuration Errors ===
    /// Rule file is not valid YAML or has the wrong shape.
    #[error("failed to parse rule file {path}: {source}")]
    RuleParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Rule file parsed but failed validation.
    #[error("invalid rule file {path}: {source}")]
    RuleInvalid {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    /// No rule directory for the requested provider.
    #[error("no conversion configs for provider '{provider}' under {path}")]
    ProviderNotFound { provider: String, path: PathBuf },

    // === DataFrame Errors ===
    /// Input format could not be determined from the path.
    #[error("unsupported input format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
