//! Rule compilers.
//!
//! Every compiler takes a validated rule plus the working alias its output
//! column must carry, and produces either a lazy column expression
//! ([`CompiledExpr`]) or a SQL statement ([`SqlStatement`]). Compilers never
//! look at data; anything that depends on the batch schema is deferred to
//! [`CompiledExpr::resolve`] or [`SqlStatement::render`].

pub mod column;
pub mod datetime;
pub mod sql;

use focus_model::{ConversionRule, StaticValue};
use polars::prelude::{DataType, Expr, NULL, Schema, col, lit};

use crate::error::{ConvertError, Result};
use crate::sql_refs::condition_columns;

/// Table name every SQL statement selects from.
pub const SQL_TABLE_NAME: &str = "TABLE_NAME";

/// Output of a condition that overwrites an existing column.
pub const STAGING_COLUMN: &str = "__focus_staging";

/// A compiled expression-kind rule.
#[derive(Debug, Clone)]
pub enum CompiledExpr {
    /// A single output column.
    Column(Expr),
    /// Several output columns named `{prefix}_{field}`.
    Expanded { expr: Expr, prefix: String },
    /// Copies `source` when the batch has it, otherwise a constant.
    DefaultIfMissing {
        source: String,
        alias: String,
        default: StaticValue,
    },
}

impl CompiledExpr {
    /// Turn into a concrete expression for a batch with `schema`.
    pub fn resolve(&self, schema: &Schema) -> Expr {
        match self {
            Self::Column(expr) | Self::Expanded { expr, .. } => expr.clone(),
            Self::DefaultIfMissing {
                source,
                alias,
                default,
            } => {
                if schema.contains(source) {
                    col(source.as_str()).alias(alias.as_str())
                } else {
                    static_literal(default).alias(alias.as_str())
                }
            }
        }
    }
}

/// A compiled SQL-kind rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlStatement {
    /// `CASE WHEN ...` assignment of one output column.
    Condition {
        alias: String,
        clauses: Vec<String>,
        /// Already rendered as a SQL literal.
        default: String,
    },
    /// A full query over [`SQL_TABLE_NAME`].
    Query { sql: String },
}

impl SqlStatement {
    /// Render against a batch schema.
    ///
    /// For conditions, clauses that reference a column the batch lacks are
    /// dropped. When no clause survives, every row receives the default.
    /// A condition whose alias already exists in the batch writes to
    /// [`STAGING_COLUMN`] instead; see [`SqlStatement::replaced_column`].
    /// Queries are returned as written.
    pub fn render(&self, schema: Option<&Schema>) -> String {
        match self {
            Self::Query { sql } => sql.clone(),
            Self::Condition {
                alias,
                clauses,
                default,
            } => {
                let output = match schema.and_then(|schema| self.replaced_column(schema)) {
                    Some(_) => quote_identifier(STAGING_COLUMN),
                    None => quote_identifier(alias),
                };
                let live: Vec<&str> = clauses
                    .iter()
                    .map(String::as_str)
                    .filter(|clause| match schema {
                        Some(schema) => condition_columns(clause)
                            .iter()
                            .all(|name| schema.contains(name)),
                        None => true,
                    })
                    .collect();
                if live.is_empty() {
                    format!("SELECT *, {default} AS {output} FROM {SQL_TABLE_NAME}")
                } else {
                    format!(
                        "SELECT *, CASE {} ELSE {default} END AS {output} FROM {SQL_TABLE_NAME}",
                        live.join(" ")
                    )
                }
            }
        }
    }

    /// Existing batch column a condition overwrites, if any.
    ///
    /// The rendered statement then produces [`STAGING_COLUMN`], which the
    /// executor moves into this column's place.
    pub fn replaced_column(&self, schema: &Schema) -> Option<&str> {
        match self {
            Self::Condition { alias, .. } if schema.contains(alias) => Some(alias),
            _ => None,
        }
    }
}

/// Double-quote an identifier for SQL.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Constant expression for a rule literal.
pub fn static_literal(value: &StaticValue) -> Expr {
    match value {
        StaticValue::Bool(value) => lit(*value),
        StaticValue::Int(value) => lit(*value),
        StaticValue::Float(value) => lit(*value),
        StaticValue::Str(value) => lit(value.clone()),
    }
}

/// Typed null string literal.
pub(crate) fn null_string() -> Expr {
    lit(NULL).cast(DataType::String)
}

pub(crate) fn source_column(rule: &ConversionRule) -> Result<&str> {
    rule.source_column
        .as_deref()
        .ok_or_else(|| ConvertError::invalid_args(&rule.plan_name, "source column required"))
}

pub(crate) fn mismatched_args(rule: &ConversionRule) -> ConvertError {
    ConvertError::invalid_args(
        &rule.plan_name,
        format!("arguments do not match conversion type '{}'", rule.kind),
    )
}
