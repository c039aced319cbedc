//! Lazy billing data batches from CSV or Parquet.
//!
//! The input is split into fixed-size row batches. Nothing is read until
//! the first batch is requested. CSV batches are parsed as the iterator
//! advances; Parquet batches stay lazy until their consumer collects them.

use std::fs::File;
use std::path::{Path, PathBuf};

use polars::io::mmap::MmapBytesReader;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Default number of rows per batch.
pub const DEFAULT_BATCH_SIZE: usize = 500_000;

/// Largest batch polars can slice in one piece.
pub const MAX_BATCH_SIZE: usize = IdxSize::MAX as usize;

/// Input file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Csv,
    Parquet,
}

impl DataFormat {
    /// Guess the format from a path: directories are Parquet datasets.
    pub fn from_path(path: &Path) -> Option<Self> {
        if path.is_dir() {
            return Some(Self::Parquet);
        }
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else if ext.eq_ignore_ascii_case("parquet") {
            Some(Self::Parquet)
        } else {
            None
        }
    }
}

/// How a Parquet input is laid out on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParquetLayout {
    /// A single `.parquet` file.
    #[default]
    File,
    /// A directory of `.parquet` files scanned as one table.
    Dataset,
}

/// Options for batch loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderOptions {
    /// Rows per batch.
    /// Defaults to 500000.
    pub batch_size: usize,

    /// Rows used to infer CSV column types. `None` reads the whole file.
    /// Defaults to 10000.
    pub infer_schema_length: Option<usize>,

    /// Low memory mode for CSV scans.
    /// Defaults to false.
    pub low_memory: bool,

    /// Parquet layout, ignored for CSV.
    pub parquet_layout: ParquetLayout,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            infer_schema_length: Some(10_000),
            low_memory: false,
            parquet_layout: ParquetLayout::File,
        }
    }
}

impl LoaderOptions {
    /// Set the rows per batch, clamped to `1..=MAX_BATCH_SIZE`.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Batch size as used for reading, whatever was stored in `batch_size`.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    pub fn with_low_memory(mut self, enabled: bool) -> Self {
        self.low_memory = enabled;
        self
    }

    pub fn with_parquet_layout(mut self, layout: ParquetLayout) -> Self {
        self.parquet_layout = layout;
        self
    }
}

/// Lazy loader for one input path.
#[derive(Debug, Clone)]
pub struct DataLoader {
    path: PathBuf,
    format: DataFormat,
    options: LoaderOptions,
}

impl DataLoader {
    /// Create a loader. Fails when the path does not exist.
    pub fn new(path: impl AsRef<Path>, format: DataFormat, options: LoaderOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(IngestError::FileNotFound { path });
        }
        Ok(Self {
            path,
            format,
            options,
        })
    }

    /// Create a loader, taking the format from the path.
    pub fn from_path(path: impl AsRef<Path>, options: LoaderOptions) -> Result<Self> {
        let path = path.as_ref();
        let format = DataFormat::from_path(path).ok_or_else(|| IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        Self::new(path, format, options)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DataFormat {
        self.format
    }

    /// Scan the whole input lazily.
    pub fn scan(&self) -> Result<LazyFrame> {
        let path_str = self.path.to_string_lossy();
        let frame = match (self.format, self.options.parquet_layout) {
            (DataFormat::Csv, _) => LazyCsvReader::new(PlPath::new(&path_str))
                .with_has_header(true)
                .with_infer_schema_length(self.options.infer_schema_length)
                .with_low_memory(self.options.low_memory)
                .finish()?,
            (DataFormat::Parquet, ParquetLayout::File) => {
                LazyFrame::scan_parquet(PlPath::new(&path_str), ScanArgsParquet::default())?
            }
            (DataFormat::Parquet, ParquetLayout::Dataset) => {
                let pattern = self.path.join("**").join("*.parquet");
                let pattern = pattern.to_string_lossy();
                LazyFrame::scan_parquet(PlPath::new(&pattern), ScanArgsParquet::default())?
            }
        };
        Ok(frame)
    }

    /// One-pass iterator of lazy row batches.
    pub fn batches(&self) -> Batches {
        Batches {
            loader: self.clone(),
            state: None,
        }
    }

    fn open_csv_reader(&self) -> Result<OwnedBatchedCsvReader> {
        let file = File::open(&self.path).map_err(|source| IngestError::FileRead {
            path: self.path.clone(),
            source,
        })?;
        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.options.infer_schema_length)
            .with_low_memory(self.options.low_memory)
            .into_reader_with_file_handle(Box::new(file) as Box<dyn MmapBytesReader>)
            .batched(None)?;
        Ok(reader)
    }
}

/// Iterator over the batches of a [`DataLoader`].
///
/// The input is opened on the first call to `next`; a failure there is
/// yielded once and ends the iteration. CSV is parsed in a single forward
/// pass. Parquet batches are slices of one lazy scan, which polars resolves
/// against row group metadata.
pub struct Batches {
    loader: DataLoader,
    state: Option<BatchState>,
}

enum BatchState {
    Csv(CsvChunks),
    Parquet {
        frame: LazyFrame,
        total_rows: u64,
        offset: u64,
    },
    Done,
}

/// Regroups the reader's chunks into batches of exactly `batch_size` rows.
struct CsvChunks {
    reader: OwnedBatchedCsvReader,
    pending: Option<DataFrame>,
    exhausted: bool,
}

impl CsvChunks {
    fn next_frame(&mut self, batch_size: usize) -> Result<Option<DataFrame>> {
        loop {
            match self.pending.take() {
                Some(buffer) if buffer.height() >= batch_size => {
                    let (head, tail) = buffer.split_at(batch_size as i64);
                    if tail.height() > 0 {
                        self.pending = Some(tail);
                    }
                    return Ok(Some(head));
                }
                Some(buffer) if self.exhausted => {
                    return Ok((buffer.height() > 0).then_some(buffer));
                }
                None if self.exhausted => return Ok(None),
                buffer => self.pending = buffer,
            }

            match self.reader.next_batches(1)? {
                Some(chunks) => {
                    for chunk in chunks {
                        match self.pending.as_mut() {
                            Some(buffer) => {
                                buffer.vstack_mut(&chunk)?;
                            }
                            None => self.pending = Some(chunk),
                        }
                    }
                }
                None => self.exhausted = true,
            }
        }
    }
}

impl Batches {
    fn start(&self) -> Result<BatchState> {
        let state = match self.loader.format {
            DataFormat::Csv => BatchState::Csv(CsvChunks {
                reader: self.loader.open_csv_reader()?,
                pending: None,
                exhausted: false,
            }),
            DataFormat::Parquet => {
                let frame = self.loader.scan()?;
                let counted = frame.clone().select([len()]).collect()?;
                let total_rows = counted
                    .get_columns()
                    .first()
                    .map(|column| column.get(0))
                    .transpose()?
                    .and_then(|value| value.extract::<u64>())
                    .unwrap_or(0);
                BatchState::Parquet {
                    frame,
                    total_rows,
                    offset: 0,
                }
            }
        };
        debug!(
            path = %self.loader.path.display(),
            format = ?self.loader.format,
            batch_size = self.loader.options.effective_batch_size(),
            "opened input"
        );
        Ok(state)
    }

    fn advance(&mut self) -> Result<Option<LazyFrame>> {
        let batch_size = self.loader.options.effective_batch_size();
        let Some(state) = self.state.as_mut() else {
            return Ok(None);
        };
        match state {
            BatchState::Csv(chunks) => Ok(chunks.next_frame(batch_size)?.map(DataFrame::lazy)),
            BatchState::Parquet {
                frame,
                total_rows,
                offset,
            } => {
                if *offset >= *total_rows {
                    return Ok(None);
                }
                let batch = frame.clone().slice(*offset as i64, batch_size as IdxSize);
                *offset += batch_size as u64;
                Ok(Some(batch))
            }
            BatchState::Done => Ok(None),
        }
    }
}

impl Iterator for Batches {
    type Item = Result<LazyFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state.is_none() {
            match self.start() {
                Ok(state) => self.state = Some(state),
                Err(err) => {
                    self.state = Some(BatchState::Done);
                    return Some(Err(err));
                }
            }
        }

        match self.advance() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => {
                self.state = Some(BatchState::Done);
                None
            }
            Err(err) => {
                self.state = Some(BatchState::Done);
                Some(Err(err))
            }
        }
    }
}
