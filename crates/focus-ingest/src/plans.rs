//! Provider rule plan loading.
//!
//! Rules live one per YAML file under `<config_dir>/<provider>/`. A file
//! that omits `dimension_id` or `priority` takes them from a `D<dim>_S<step>`
//! file name such as `D001_S002.yaml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use focus_model::{ConversionPlan, ConversionRule, ProviderPlans, RawRule};
use regex::Regex;
use tracing::{debug, info};

use crate::error::{IngestError, Result};

static RULE_FILE_ORDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[Dd](\d+)_[Ss](\d+)$").expect("Invalid rule file name regex"));

/// `(dimension_id, priority)` encoded in a rule file name, if any.
pub fn order_from_file_name(path: &Path) -> Option<(u32, u32)> {
    let stem = path.file_stem()?.to_str()?;
    let captures = RULE_FILE_ORDER.captures(stem)?;
    let dimension = captures.get(1)?.as_str().parse().ok()?;
    let step = captures.get(2)?.as_str().parse().ok()?;
    Some((dimension, step))
}

/// Provider directories under `config_dir`, sorted by name.
pub fn list_providers(config_dir: &Path) -> Result<Vec<String>> {
    let mut providers: Vec<String> = read_entries(config_dir)?
        .into_iter()
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
        })
        .collect();
    providers.sort();
    Ok(providers)
}

/// Parse and validate one rule file.
pub fn load_rule_file(path: &Path) -> Result<ConversionRule> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut raw: RawRule =
        serde_yaml::from_str(&text).map_err(|source| IngestError::RuleParse {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some((dimension, step)) = order_from_file_name(path) {
        raw.dimension_id.get_or_insert(dimension);
        raw.priority.get_or_insert(step);
    }
    if raw.plan_name.is_none() {
        raw.plan_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string);
    }

    ConversionRule::from_raw(raw).map_err(|source| IngestError::RuleInvalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every rule of one provider into an ordered plan.
pub fn load_provider_plan(config_dir: &Path, provider: &str) -> Result<ConversionPlan> {
    let provider_dir = config_dir.join(provider);
    if !provider_dir.is_dir() {
        return Err(IngestError::ProviderNotFound {
            provider: provider.to_string(),
            path: config_dir.to_path_buf(),
        });
    }

    let mut rules = Vec::new();
    for path in list_rule_files(&provider_dir)? {
        debug!(path = %path.display(), "reading conversion rule");
        rules.push(load_rule_file(&path)?);
    }
    Ok(ConversionPlan::new(provider, rules))
}

/// Load the plans of every provider under `config_dir`.
pub fn load_provider_plans(config_dir: &Path) -> Result<ProviderPlans> {
    let mut plans = BTreeMap::new();
    for provider in list_providers(config_dir)? {
        let plan = load_provider_plan(config_dir, &provider)?;
        info!(provider = %provider, rule_count = plan.len(), "loaded conversion plan");
        plans.insert(provider, plan);
    }
    Ok(plans)
}

fn list_rule_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = read_entries(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        })
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn read_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let read_error = |source| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };
    std::fs::read_dir(dir)
        .map_err(read_error)?
        .map(|entry| entry.map(|entry| entry.path()).map_err(read_error))
        .collect()
}
