//! Numbered segment files, one per converted batch.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use focus_transform::{BatchExporter, ConvertError};
use polars::prelude::{CsvWriter, DataFrame, Expr, LazyFrame, ParquetWriter, SerWriter, col};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ExportError, Result};

/// Segment file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Parquet,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::Csv => "csv",
        }
    }
}

/// Options for segment export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    /// File format of each segment.
    /// Defaults to Parquet.
    pub format: ExportFormat,

    /// Keep every column of the converted batch, FOCUS columns first.
    /// Defaults to true.
    pub include_source_columns: bool,

    /// Extra columns written after the FOCUS columns when source columns
    /// are excluded.
    pub passthrough_columns: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Parquet,
            include_source_columns: true,
            passthrough_columns: Vec::new(),
        }
    }
}

impl ExportOptions {
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_include_source_columns(mut self, include: bool) -> Self {
        self.include_source_columns = include;
        self
    }

    pub fn with_passthrough_columns(mut self, columns: Vec<String>) -> Self {
        self.passthrough_columns = columns;
        self
    }
}

/// Writes each collected batch to `segment_NNNNN.<ext>` under a directory.
#[derive(Debug)]
pub struct SegmentExporter {
    export_dir: PathBuf,
    options: ExportOptions,
    written: Vec<PathBuf>,
    rows: usize,
    closed: bool,
}

impl SegmentExporter {
    /// Create the exporter, creating `export_dir` if needed.
    pub fn new(export_dir: impl AsRef<Path>, options: ExportOptions) -> Result<Self> {
        let export_dir = export_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&export_dir).map_err(|source| ExportError::CreateDir {
            path: export_dir.clone(),
            source,
        })?;
        Ok(Self {
            export_dir,
            options,
            written: Vec::new(),
            rows: 0,
            closed: false,
        })
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Segment files written so far, in order.
    pub fn written_files(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Evaluate `batch` and write it as the next segment.
    pub fn write_batch(&mut self, mut batch: LazyFrame, target_columns: &[String]) -> Result<usize> {
        if self.closed {
            return Err(ExportError::Closed);
        }

        let schema = batch.collect_schema()?;
        let projected = self.projection(target_columns, schema.iter_names().map(|name| name.as_str()));
        let exprs: Vec<Expr> = projected.iter().map(|name| col(name.as_str())).collect();
        let mut df = batch.select(exprs).collect()?;

        let path = self.export_dir.join(format!(
            "segment_{:05}.{}",
            self.written.len(),
            self.options.format.extension()
        ));
        write_segment(&path, self.options.format, &mut df)?;

        let rows = df.height();
        debug!(path = %path.display(), rows, columns = df.width(), "segment written");
        self.rows += rows;
        self.written.push(path);
        Ok(rows)
    }

    /// FOCUS columns first, then either every other column or the
    /// configured passthrough columns.
    fn projection<'a>(
        &self,
        target_columns: &[String],
        batch_columns: impl Iterator<Item = &'a str>,
    ) -> Vec<String> {
        let mut projected: Vec<String> = Vec::with_capacity(target_columns.len());
        let extra: Vec<String> = if self.options.include_source_columns {
            batch_columns.map(str::to_string).collect()
        } else {
            self.options.passthrough_columns.clone()
        };
        for name in target_columns.iter().chain(extra.iter()) {
            if !projected.contains(name) {
                projected.push(name.clone());
            }
        }
        projected
    }

    /// Mark the exporter closed. Later calls are no-ops.
    pub fn finish(&mut self) {
        if !self.closed {
            self.closed = true;
            info!(
                dir = %self.export_dir.display(),
                segments = self.written.len(),
                rows = self.rows,
                "export closed"
            );
        }
    }
}

impl BatchExporter for SegmentExporter {
    fn collect(
        &mut self,
        batch: LazyFrame,
        target_columns: &[String],
    ) -> std::result::Result<usize, ConvertError> {
        Ok(self.write_batch(batch, target_columns)?)
    }

    fn close(&mut self) -> std::result::Result<(), ConvertError> {
        self.finish();
        Ok(())
    }
}

fn write_segment(path: &Path, format: ExportFormat, df: &mut DataFrame) -> Result<()> {
    let file = File::create(path).map_err(|source| ExportError::CreateFile {
        path: path.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);
    let written = match format {
        ExportFormat::Parquet => ParquetWriter::new(writer).finish(df).map(|_| ()),
        ExportFormat::Csv => CsvWriter::new(writer).include_header(true).finish(df),
    };
    written.map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}
