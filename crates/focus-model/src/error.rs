use std::fmt;

use thiserror::Error;

/// A single problem found while validating a rule definition.
///
/// `loc` is the path of the offending field in the rule document
/// (e.g. `conversion_args`, `focus_column`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub loc: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(loc: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            message: message.into(),
        }
    }

    pub(crate) fn required(loc: &str) -> Self {
        Self::new(loc, "field required")
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.loc, self.message)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The rule document is missing or has malformed fields.
    #[error("invalid conversion rule '{plan_name}': {}", join_issues(.issues))]
    Validation {
        plan_name: String,
        issues: Vec<ValidationIssue>,
    },
}

impl ConfigError {
    /// Issues reported for a validation failure.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Validation { issues, .. } => issues,
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ConfigError>;
