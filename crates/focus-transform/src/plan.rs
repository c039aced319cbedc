//! Plan builder: turns a provider's ordered rules into compiled form.

use focus_model::ConversionPlan;
use polars::prelude::lit;
use tracing::{debug, info};

use crate::compilers::{CompiledExpr, SqlStatement};
use crate::error::{ConvertError, Result};
use crate::registry::{RuleCompiler, RuleRegistry};

/// Column carrying the provider identifier on every output row.
pub const PROVIDER_COLUMN: &str = "provider";

/// A provider plan compiled against a registry.
///
/// Building is side-effect free; [`CompiledPlan::apply`] runs it against a
/// batch. All fields are read-only once built.
#[derive(Debug, Clone)]
pub struct CompiledPlan {
    pub(crate) provider: String,
    pub(crate) expressions: Vec<CompiledExpr>,
    pub(crate) sql_statements: Vec<SqlStatement>,
    pub(crate) target_columns: Vec<String>,
    pub(crate) temporary_columns: Vec<String>,
}

impl CompiledPlan {
    /// Compile every rule of `plan` in stored order.
    ///
    /// # Errors
    ///
    /// Fails with [`ConvertError::UnsupportedRuleKind`] on the first rule whose
    /// kind has no registered compiler, or with the compiler's own error.
    /// No partial plan is returned.
    pub fn build(plan: &ConversionPlan, registry: &RuleRegistry) -> Result<Self> {
        let provider = plan.provider().to_string();
        let mut compiled = Self {
            expressions: vec![CompiledExpr::Column(
                lit(provider.clone()).alias(PROVIDER_COLUMN),
            )],
            provider,
            sql_statements: Vec::new(),
            target_columns: Vec::new(),
            temporary_columns: Vec::new(),
        };

        for rule in plan {
            let alias = rule.column_alias();
            if rule.is_temporary() && !compiled.temporary_columns.contains(&alias) {
                compiled.temporary_columns.push(alias.clone());
            }

            let compiler =
                registry
                    .get(rule.kind)
                    .ok_or_else(|| ConvertError::UnsupportedRuleKind {
                        kind: rule.kind,
                        plan_name: rule.plan_name.clone(),
                    })?;
            match compiler {
                RuleCompiler::Expression(compile) => {
                    compiled.expressions.push(compile(rule, &alias)?);
                }
                RuleCompiler::Sql(compile) => {
                    compiled.sql_statements.push(compile(rule, &alias)?);
                }
            }

            let target = rule.focus_column.as_str().to_string();
            if !compiled.target_columns.contains(&target) {
                compiled.target_columns.push(target);
            }
            debug!(
                rule = %rule.plan_name,
                kind = %rule.kind,
                alias = %alias,
                "compiled conversion rule"
            );
        }

        info!(
            provider = %compiled.provider,
            rule_count = plan.len(),
            expressions = compiled.expressions.len(),
            sql_statements = compiled.sql_statements.len(),
            "conversion plan built"
        );
        Ok(compiled)
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Column expressions in application order, provider column first.
    pub fn expressions(&self) -> &[CompiledExpr] {
        &self.expressions
    }

    /// SQL statements in application order.
    pub fn sql_statements(&self) -> &[SqlStatement] {
        &self.sql_statements
    }

    /// FOCUS columns the plan produces, deduplicated in first-seen order.
    pub fn target_columns(&self) -> &[String] {
        &self.target_columns
    }

    /// Working aliases dropped before export.
    pub fn temporary_columns(&self) -> &[String] {
        &self.temporary_columns
    }
}
