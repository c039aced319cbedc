//! Plan execution over lazy batches.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{DataFrame, Expr, IntoLazy, LazyFrame, Schema, col};
use polars::sql::SQLContext;
use tracing::{debug, error, info, info_span, warn};

use crate::compilers::{CompiledExpr, SQL_TABLE_NAME, STAGING_COLUMN};
use crate::error::{BoxError, ConvertError, Result};
use crate::plan::CompiledPlan;

/// Sink for converted batches.
///
/// `collect` is called once per batch in input order. `close` is called
/// exactly once per conversion, on success and on failure, and must be safe
/// to call after a failed `collect`.
pub trait BatchExporter {
    /// Write one batch, projecting at least `target_columns`. Returns the
    /// number of rows written.
    fn collect(&mut self, batch: LazyFrame, target_columns: &[String]) -> Result<usize>;

    /// Flush and release resources.
    fn close(&mut self) -> Result<()>;
}

/// A batch with the plan applied, still lazy.
#[derive(Clone)]
pub struct AppliedBatch {
    pub frame: LazyFrame,
    /// Target columns resolved against this batch.
    pub target_columns: Vec<String>,
}

/// Columns each field-less unnest produced in the current batch, by alias.
type ExpandedColumns = BTreeMap<String, Vec<String>>;

/// Counters for a finished conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub provider: String,
    pub batches: usize,
    pub rows: usize,
}

impl CompiledPlan {
    /// Apply the plan to one batch: expressions in order, then SQL
    /// statements in order, then temporary columns are dropped.
    ///
    /// Only schema resolution happens here; data is computed when the
    /// exporter collects the returned frame.
    pub fn apply(&self, mut frame: LazyFrame) -> Result<AppliedBatch> {
        let mut expanded = ExpandedColumns::new();
        for compiled in &self.expressions {
            let expr = match compiled {
                CompiledExpr::Column(expr) => expr.clone(),
                CompiledExpr::Expanded { expr, prefix } => {
                    let produced = frame.clone().select([expr.clone()]).collect_schema()?;
                    let names = expanded.entry(prefix.clone()).or_default();
                    for name in produced.iter_names() {
                        if !names.iter().any(|known| known == name.as_str()) {
                            names.push(name.to_string());
                        }
                    }
                    expr.clone()
                }
                CompiledExpr::DefaultIfMissing { .. } => {
                    let schema = frame.collect_schema()?;
                    compiled.resolve(&schema)
                }
            };
            frame = frame.with_column(expr);
        }

        if !self.sql_statements.is_empty() {
            let mut context = SQLContext::new();
            context.register(SQL_TABLE_NAME, frame.clone());
            for statement in &self.sql_statements {
                let schema = frame.collect_schema()?;
                let sql = statement.render(Some(schema.as_ref()));
                debug!(%sql, "executing sql statement");
                frame = context
                    .execute(&sql)
                    .map_err(|source| ConvertError::sql(sql.as_str(), source))?;
                if let Some(replaced) = statement.replaced_column(&schema) {
                    frame = frame.select(replace_with_staged(&schema, replaced));
                }
                context.register(SQL_TABLE_NAME, frame.clone());
            }
        }

        let schema = frame.collect_schema()?;
        let temporaries: BTreeSet<String> =
            resolve_names(&self.temporary_columns, &expanded, &schema)
                .into_iter()
                .collect();
        if schema.iter_names().any(|name| temporaries.contains(name.as_str())) {
            let keep: Vec<Expr> = schema
                .iter_names()
                .filter(|name| !temporaries.contains(name.as_str()))
                .map(|name| col(name.clone()))
                .collect();
            frame = frame.select(keep);
        }

        let schema = frame.collect_schema()?;
        let target_columns = resolve_names(&self.target_columns, &expanded, &schema);
        Ok(AppliedBatch {
            frame,
            target_columns,
        })
    }

    /// Apply the plan to every batch and hand each result to `exporter`.
    ///
    /// Stops at the first failing batch. The exporter is closed exactly
    /// once either way; on failure a close error is logged and the original
    /// error returned.
    pub fn convert<I, E, X>(&self, batches: I, exporter: &mut X) -> Result<ConversionSummary>
    where
        I: IntoIterator<Item = std::result::Result<LazyFrame, E>>,
        E: Into<BoxError>,
        X: BatchExporter + ?Sized,
    {
        let span = info_span!("convert", provider = %self.provider);
        let _guard = span.enter();

        let mut summary = ConversionSummary {
            provider: self.provider.clone(),
            ..ConversionSummary::default()
        };
        match self.export_batches(batches, exporter, &mut summary) {
            Ok(()) => {
                exporter.close()?;
                info!(
                    batches = summary.batches,
                    rows = summary.rows,
                    "conversion finished"
                );
                Ok(summary)
            }
            Err(err) => {
                if let Err(close_err) = exporter.close() {
                    warn!(error = %close_err, "exporter close failed after conversion error");
                }
                error!(batch = summary.batches, error = %err, "conversion failed");
                Err(err)
            }
        }
    }

    fn export_batches<I, E, X>(
        &self,
        batches: I,
        exporter: &mut X,
        summary: &mut ConversionSummary,
    ) -> Result<()>
    where
        I: IntoIterator<Item = std::result::Result<LazyFrame, E>>,
        E: Into<BoxError>,
        X: BatchExporter + ?Sized,
    {
        for batch in batches {
            let frame = batch.map_err(|err| ConvertError::Source(err.into()))?;
            let applied = self.apply(frame)?;
            let rows = exporter.collect(applied.frame, &applied.target_columns)?;
            debug!(batch = summary.batches, rows, "batch exported");
            summary.batches += 1;
            summary.rows += rows;
        }
        Ok(())
    }

    /// Apply the plan to an eager frame and collect the result.
    pub fn apply_eager(&self, frame: DataFrame) -> Result<DataFrame> {
        Ok(self.apply(frame.lazy())?.frame.collect()?)
    }
}

/// Projection of `schema` with `replaced` taken from the staging column.
fn replace_with_staged(schema: &Schema, replaced: &str) -> Vec<Expr> {
    schema
        .iter_names()
        .map(|name| {
            if name.as_str() == replaced {
                col(STAGING_COLUMN).alias(replaced)
            } else {
                col(name.clone())
            }
        })
        .collect()
}

/// Swap aliases of field-less unnests for the columns they produced,
/// keeping only those still present in `schema`.
fn resolve_names(names: &[String], expanded: &ExpandedColumns, schema: &Schema) -> Vec<String> {
    let mut resolved = Vec::with_capacity(names.len());
    for name in names {
        match expanded.get(name) {
            Some(columns) => resolved.extend(
                columns
                    .iter()
                    .filter(|column| schema.contains(column.as_str()))
                    .cloned(),
            ),
            None => resolved.push(name.clone()),
        }
    }
    resolved
}
