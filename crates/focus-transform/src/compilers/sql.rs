//! SQL compilers.

use focus_model::{ConversionArgs, ConversionRule};

use super::{SqlStatement, mismatched_args};
use crate::error::Result;

/// Ordered `CASE WHEN` assignment of the alias column.
pub fn sql_condition(rule: &ConversionRule, alias: &str) -> Result<SqlStatement> {
    let ConversionArgs::SqlCondition(args) = &rule.args else {
        return Err(mismatched_args(rule));
    };
    Ok(SqlStatement::Condition {
        alias: alias.to_string(),
        clauses: args
            .conditions
            .iter()
            .map(|clause| clause.trim().to_string())
            .collect(),
        default: args.default_value.to_sql_literal(),
    })
}

/// A query over the working table, run as written.
pub fn sql_query(rule: &ConversionRule, _alias: &str) -> Result<SqlStatement> {
    let ConversionArgs::SqlQuery(args) = &rule.args else {
        return Err(mismatched_args(rule));
    };
    Ok(SqlStatement::Query {
        sql: args.query().trim().to_string(),
    })
}
