//! Column references inside SQL fragments.

use std::ops::ControlFlow;

use sqlparser::ast::{Expr, visit_expressions};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::compilers::SQL_TABLE_NAME;

/// Identifiers a SQL statement reads as columns, in first-seen order.
///
/// Every identifier expression counts, quoted or not, so columns named
/// after keywords such as `type` or `date` are found. Compound identifiers
/// contribute their last part. Function names, aliases and table names are
/// not expressions and never count. Unparsable text yields no references.
pub fn referenced_columns(sql: &str) -> Vec<String> {
    let Ok(statements) = Parser::parse_sql(&GenericDialect {}, sql) else {
        return Vec::new();
    };

    let mut columns: Vec<String> = Vec::new();
    let _ = visit_expressions(&statements, |expr| {
        let ident = match expr {
            Expr::Identifier(ident) => Some(ident),
            Expr::CompoundIdentifier(parts) => parts.last(),
            _ => None,
        };
        if let Some(ident) = ident
            && !columns.contains(&ident.value)
        {
            columns.push(ident.value.clone());
        }
        ControlFlow::<()>::Continue(())
    });
    columns
}

/// Columns read by one or more `WHEN ... THEN ...` clauses.
pub fn condition_columns(clauses: &str) -> Vec<String> {
    referenced_columns(&format!("SELECT CASE {clauses} END FROM {SQL_TABLE_NAME}"))
}
