//! Rule kind to compiler lookup.

use std::collections::BTreeMap;

use focus_model::{ConversionRule, RuleKind};

use crate::compilers::{CompiledExpr, SqlStatement, column, datetime, sql};
use crate::error::Result;

/// Compiles a rule into a column expression.
pub type ExprCompiler = fn(&ConversionRule, &str) -> Result<CompiledExpr>;

/// Compiles a rule into a SQL statement.
pub type SqlCompiler = fn(&ConversionRule, &str) -> Result<SqlStatement>;

/// A registered compiler, tagged with the output it produces.
#[derive(Debug, Clone, Copy)]
pub enum RuleCompiler {
    Expression(ExprCompiler),
    Sql(SqlCompiler),
}

/// Registry of compilers keyed by rule kind.
///
/// Built explicitly and handed to the plan builder; there is no global
/// instance. Kinds without a compiler fail plan construction.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    compilers: BTreeMap<RuleKind, RuleCompiler>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a compiler for every built-in kind except `lookup`.
    pub fn standard() -> Self {
        use RuleCompiler::{Expression, Sql};

        Self::new()
            .with(RuleKind::RenameColumn, Expression(column::rename_column))
            .with(RuleKind::StaticValue, Expression(column::static_value))
            .with(RuleKind::MapValues, Expression(column::map_values))
            .with(RuleKind::Unnest, Expression(column::unnest))
            .with(
                RuleKind::ApplyDefaultIfColumnMissing,
                Expression(column::apply_default_if_column_missing),
            )
            .with(RuleKind::SetColumnDtypes, Expression(column::set_column_dtypes))
            .with(RuleKind::AssignTimezone, Expression(datetime::assign_timezone))
            .with(
                RuleKind::AssignUtcTimezone,
                Expression(datetime::assign_utc_timezone),
            )
            .with(RuleKind::ConvertTimezone, Expression(datetime::convert_timezone))
            .with(RuleKind::ParseDatetime, Expression(datetime::parse_datetime))
            .with(RuleKind::SqlCondition, Sql(sql::sql_condition))
            .with(RuleKind::SqlQuery, Sql(sql::sql_query))
    }

    /// Register a compiler, returning the one it replaces.
    pub fn register(&mut self, kind: RuleKind, compiler: RuleCompiler) -> Option<RuleCompiler> {
        self.compilers.insert(kind, compiler)
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, kind: RuleKind, compiler: RuleCompiler) -> Self {
        self.register(kind, compiler);
        self
    }

    pub fn get(&self, kind: RuleKind) -> Option<RuleCompiler> {
        self.compilers.get(&kind).copied()
    }

    pub fn supports(&self, kind: RuleKind) -> bool {
        self.compilers.contains_key(&kind)
    }

    /// Registered kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = RuleKind> + '_ {
        self.compilers.keys().copied()
    }
}
