//! Error types for plan compilation and execution.

use focus_model::{ConfigError, RuleKind};
use polars::prelude::PolarsError;
use thiserror::Error;

/// Boxed error from a collaborator (batch source or exporter).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while building or applying a conversion plan.
#[derive(Debug, Error)]
pub enum ConvertError {
    // === Plan construction ===
    /// A rule document failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No plan was loaded for the requested provider.
    #[error("no conversion plan loaded for provider '{provider}'")]
    UnknownProvider { provider: String },

    /// No compiler is registered for the rule kind.
    #[error("conversion type '{kind}' used by '{plan_name}' is not supported")]
    UnsupportedRuleKind { kind: RuleKind, plan_name: String },

    /// Arguments were accepted by the model but cannot be compiled.
    #[error("invalid arguments for '{plan_name}': {message}")]
    InvalidArgs { plan_name: String, message: String },

    // === Batch evaluation ===
    /// A referenced column does not exist in the batch.
    #[error("column not found: {message}")]
    MissingColumn { message: String },

    /// A SQL statement failed to plan or evaluate.
    #[error("sql statement failed ({statement}): {source}")]
    Sql {
        statement: String,
        #[source]
        source: PolarsError,
    },

    /// Any other dataframe failure.
    #[error(transparent)]
    Polars(PolarsError),

    // === Collaborators ===
    /// The batch source failed to produce a batch.
    #[error("failed to read input batch: {0}")]
    Source(#[source] BoxError),

    /// The exporter failed to write or close.
    #[error("failed to export batch: {0}")]
    Export(#[source] BoxError),
}

impl ConvertError {
    pub(crate) fn sql(statement: impl Into<String>, source: PolarsError) -> Self {
        if is_column_not_found(&source) {
            return Self::from(source);
        }
        Self::Sql {
            statement: statement.into(),
            source,
        }
    }

    pub(crate) fn invalid_args(plan_name: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgs {
            plan_name: plan_name.to_string(),
            message: message.into(),
        }
    }
}

impl From<PolarsError> for ConvertError {
    fn from(err: PolarsError) -> Self {
        match err {
            PolarsError::ColumnNotFound(message) => Self::MissingColumn {
                message: message.to_string(),
            },
            err if is_column_not_found(&err) => Self::MissingColumn {
                message: err.to_string(),
            },
            err => Self::Polars(err),
        }
    }
}

fn is_column_not_found(err: &PolarsError) -> bool {
    match err {
        PolarsError::ColumnNotFound(_) => true,
        PolarsError::Context { error, .. } => is_column_not_found(error),
        _ => false,
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_not_found_maps_to_missing_column() {
        let err: ConvertError = PolarsError::ColumnNotFound("lineItem/UsageAmount".into()).into();
        assert!(matches!(err, ConvertError::MissingColumn { .. }));
        assert_eq!(err.to_string(), "column not found: lineItem/UsageAmount");
    }

    #[test]
    fn sql_errors_keep_the_statement() {
        let err = ConvertError::sql("SELECT 1", PolarsError::ComputeError("boom".into()));
        assert!(matches!(err, ConvertError::Sql { ref statement, .. } if statement == "SELECT 1"));
    }

    #[test]
    fn unsupported_kind_display() {
        let err = ConvertError::UnsupportedRuleKind {
            kind: RuleKind::Lookup,
            plan_name: "sku lookup".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "conversion type 'lookup' used by 'sku lookup' is not supported"
        );
    }
}
