//! The conversion pipeline behind the CLI commands.
//!
//! Plans are loaded from the config directory, compiled once, and applied
//! to the input batch by batch while segment files are written.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use focus_ingest::{DataFormat, DataLoader, LoaderOptions, list_providers, load_provider_plan};
use focus_output::{ExportOptions, SegmentExporter};
use focus_transform::{ConversionSummary, DotRenderer, FocusConverter, GraphRenderer};
use serde_json::json;
use tracing::{info, info_span};

/// Everything `convert` needs.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub config_dir: PathBuf,
    pub provider: String,
    pub data_path: PathBuf,
    /// Taken from the path when not set.
    pub data_format: Option<DataFormat>,
    pub loader: LoaderOptions,
    pub export_dir: PathBuf,
    pub export: ExportOptions,
}

/// Result of a finished conversion.
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub summary: ConversionSummary,
    pub export_dir: PathBuf,
    pub segments: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Build a converter holding only `provider`'s plan.
pub fn load_converter(config_dir: &Path, provider: &str) -> Result<FocusConverter> {
    let plan = load_provider_plan(config_dir, provider)
        .with_context(|| format!("load conversion plan for '{provider}'"))?;
    info!(provider, rule_count = plan.len(), "loaded conversion plan");
    let mut plans = BTreeMap::new();
    plans.insert(provider.to_string(), plan);
    Ok(FocusConverter::with_standard_registry(plans))
}

/// Run a full conversion. `on_batch` is called with the running batch count
/// each time a batch is read from the input.
pub fn run_conversion(
    request: &ConvertRequest,
    mut on_batch: impl FnMut(usize),
) -> Result<ConvertOutcome> {
    let span = info_span!("conversion", provider = %request.provider);
    let _guard = span.enter();
    let started = Instant::now();

    let converter = load_converter(&request.config_dir, &request.provider)?;
    let plan = converter
        .prepare(&request.provider)
        .with_context(|| format!("compile conversion plan for '{}'", request.provider))?;

    let loader = match request.data_format {
        Some(format) => DataLoader::new(&request.data_path, format, request.loader.clone()),
        None => DataLoader::from_path(&request.data_path, request.loader.clone()),
    }
    .context("open input data")?;
    let mut exporter = SegmentExporter::new(&request.export_dir, request.export.clone())
        .context("prepare export directory")?;

    let mut read = 0usize;
    let batches = loader.batches().inspect(|_| {
        read += 1;
        on_batch(read);
    });
    let summary = plan
        .convert(batches, &mut exporter)
        .with_context(|| format!("convert {}", request.data_path.display()))?;

    Ok(ConvertOutcome {
        summary,
        export_dir: exporter.export_dir().to_path_buf(),
        segments: exporter.written_files().to_vec(),
        elapsed: started.elapsed(),
    })
}

/// DOT text of `provider`'s column dependency graph.
pub fn explain_dot(config_dir: &Path, provider: &str) -> Result<String> {
    let converter = load_converter(config_dir, provider)?;
    let graph = converter
        .explain(provider)
        .with_context(|| format!("explain plan for '{provider}'"))?;
    Ok(DotRenderer::default().render(&graph))
}

/// `{"providers": [...]}` for every provider under `config_dir`.
pub fn providers_json(config_dir: &Path) -> Result<String> {
    let providers = list_providers(config_dir)
        .with_context(|| format!("list providers in {}", config_dir.display()))?;
    Ok(serde_json::to_string_pretty(&json!({ "providers": providers }))?)
}
