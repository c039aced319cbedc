//! CLI argument definitions for the FOCUS converter.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use focus_ingest::{DEFAULT_BATCH_SIZE, DataFormat, ParquetLayout};
use focus_output::ExportFormat;

#[derive(Parser)]
#[command(
    name = "focus-converter",
    version,
    about = "Convert cloud provider billing exports to the FOCUS schema",
    long_about = "Convert cloud provider billing exports to the FinOps FOCUS schema.\n\n\
                  Conversion rules are read per provider from YAML files and applied\n\
                  lazily to CSV or Parquet input, batch by batch."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding one folder of YAML conversion rules per provider.
    #[arg(
        long = "config-dir",
        value_name = "DIR",
        default_value = "conversion_configs",
        global = true
    )]
    pub config_dir: PathBuf,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a billing export into FOCUS segment files.
    Convert(ConvertArgs),

    /// Print the column dependency graph of a provider plan as DOT.
    Explain(ExplainArgs),

    /// List providers with conversion rules, as JSON.
    ListProviders,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Provider whose conversion plan is applied.
    #[arg(long = "provider")]
    pub provider: String,

    /// Input file, or a directory of Parquet files.
    #[arg(long = "data-path", value_name = "PATH")]
    pub data_path: PathBuf,

    /// Input format (default: from the file extension).
    #[arg(long = "data-format", value_enum)]
    pub data_format: Option<DataFormatArg>,

    /// Parquet input layout (default: dataset for directories, file otherwise).
    #[arg(long = "parquet-layout", value_enum)]
    pub parquet_layout: Option<ParquetLayoutArg>,

    /// Directory receiving the converted segment files.
    #[arg(long = "export-path", value_name = "DIR")]
    pub export_path: PathBuf,

    /// Segment file format.
    #[arg(long = "export-format", value_enum, default_value = "parquet")]
    pub export_format: ExportFormatArg,

    /// Write only FOCUS columns, plus any --passthrough columns.
    #[arg(long = "focus-only")]
    pub focus_only: bool,

    /// Source column kept next to the FOCUS columns with --focus-only (repeatable).
    #[arg(long = "passthrough", value_name = "COLUMN")]
    pub passthrough: Vec<String>,

    /// Rows per batch.
    #[arg(long = "batch-size", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Scan CSV input in low memory mode.
    #[arg(long = "low-memory")]
    pub low_memory: bool,
}

#[derive(Args)]
pub struct ExplainArgs {
    /// Provider whose plan is explained.
    #[arg(long = "provider")]
    pub provider: String,

    /// Write the DOT text to a file instead of stdout.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DataFormatArg {
    Csv,
    Parquet,
}

impl From<DataFormatArg> for DataFormat {
    fn from(arg: DataFormatArg) -> Self {
        match arg {
            DataFormatArg::Csv => DataFormat::Csv,
            DataFormatArg::Parquet => DataFormat::Parquet,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ParquetLayoutArg {
    File,
    Dataset,
}

impl From<ParquetLayoutArg> for ParquetLayout {
    fn from(arg: ParquetLayoutArg) -> Self {
        match arg {
            ParquetLayoutArg::File => ParquetLayout::File,
            ParquetLayoutArg::Dataset => ParquetLayout::Dataset,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormatArg {
    Parquet,
    Csv,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Parquet => ExportFormat::Parquet,
            ExportFormatArg::Csv => ExportFormat::Csv,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
