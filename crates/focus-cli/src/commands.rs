use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use focus_ingest::{LoaderOptions, ParquetLayout};
use focus_output::ExportOptions;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use focus_cli::pipeline::{ConvertOutcome, ConvertRequest, explain_dot, providers_json, run_conversion};

use crate::cli::{ConvertArgs, ExplainArgs};

pub fn run_convert(config_dir: &Path, args: &ConvertArgs) -> Result<ConvertOutcome> {
    let request = convert_request(config_dir, args);
    let progress = spinner()?;
    progress.set_message(format!("converting {}", args.data_path.display()));
    let outcome = run_conversion(&request, |batch| {
        progress.set_message(format!("converting batch {batch}"));
    });
    progress.finish_and_clear();
    outcome
}

pub fn run_explain(config_dir: &Path, args: &ExplainArgs) -> Result<()> {
    let dot = explain_dot(config_dir, &args.provider)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, format!("{dot}\n"))
                .with_context(|| format!("write {}", path.display()))?;
            info!(path = %path.display(), "dependency graph written");
        }
        None => println!("{dot}"),
    }
    Ok(())
}

pub fn run_list_providers(config_dir: &Path) -> Result<()> {
    println!("{}", providers_json(config_dir)?);
    Ok(())
}

fn convert_request(config_dir: &Path, args: &ConvertArgs) -> ConvertRequest {
    let layout = match args.parquet_layout {
        Some(layout) => layout.into(),
        None if args.data_path.is_dir() => ParquetLayout::Dataset,
        None => ParquetLayout::File,
    };
    let loader = LoaderOptions::default()
        .with_batch_size(args.batch_size)
        .with_low_memory(args.low_memory)
        .with_parquet_layout(layout);
    let export = ExportOptions::default()
        .with_format(args.export_format.into())
        .with_include_source_columns(!args.focus_only)
        .with_passthrough_columns(args.passthrough.clone());
    ConvertRequest {
        config_dir: config_dir.to_path_buf(),
        provider: args.provider.clone(),
        data_path: args.data_path.clone(),
        data_format: args.data_format.map(Into::into),
        loader,
        export_dir: args.export_path.clone(),
        export,
    }
}

fn spinner() -> Result<ProgressBar> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .context("progress template")?,
    );
    progress.enable_steady_tick(Duration::from_millis(120));
    Ok(progress)
}
