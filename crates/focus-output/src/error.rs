//! Error types for segment export.

use std::path::PathBuf;

use focus_transform::ConvertError;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create export directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create segment file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write segment {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    /// Evaluating the batch failed before anything was written.
    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error("exporter already closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ExportError>;

impl From<ExportError> for ConvertError {
    fn from(err: ExportError) -> Self {
        match err {
            // Keeps missing-column detection for batches evaluated on export.
            ExportError::Polars(err) => ConvertError::from(err),
            err => ConvertError::Export(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_errors_keep_their_kind() {
        let err: ConvertError = ExportError::from(PolarsError::ColumnNotFound("Region".into())).into();
        assert!(matches!(err, ConvertError::MissingColumn { .. }));
    }

    #[test]
    fn io_errors_become_export_errors() {
        let err: ConvertError = ExportError::Closed.into();
        assert_eq!(err.to_string(), "failed to export batch: exporter already closed");
    }
}
