//! Output of converted FOCUS batches.
//!
//! [`SegmentExporter`] implements the converter's `BatchExporter` seam and
//! writes one numbered Parquet or CSV file per batch.

mod error;
mod segments;

pub use error::{ExportError, Result};
pub use segments::{ExportFormat, ExportOptions, SegmentExporter};
