//! The closed set of conversion rule kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Conversion rule kind (`conversion_type` in rule documents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    // datetime
    ConvertTimezone,
    AssignTimezone,
    AssignUtcTimezone,
    ParseDatetime,

    // sql
    SqlQuery,
    SqlCondition,

    // column
    RenameColumn,
    Unnest,
    Lookup,
    MapValues,
    StaticValue,
    ApplyDefaultIfColumnMissing,
    SetColumnDtypes,
}

impl RuleKind {
    pub const ALL: &'static [RuleKind] = &[
        Self::ConvertTimezone,
        Self::AssignTimezone,
        Self::AssignUtcTimezone,
        Self::ParseDatetime,
        Self::SqlQuery,
        Self::SqlCondition,
        Self::RenameColumn,
        Self::Unnest,
        Self::Lookup,
        Self::MapValues,
        Self::StaticValue,
        Self::ApplyDefaultIfColumnMissing,
        Self::SetColumnDtypes,
    ];

    /// Identifier used in rule documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConvertTimezone => "convert_timezone",
            Self::AssignTimezone => "assign_timezone",
            Self::AssignUtcTimezone => "assign_utc_timezone",
            Self::ParseDatetime => "parse_datetime",
            Self::SqlQuery => "sql_query",
            Self::SqlCondition => "sql_condition",
            Self::RenameColumn => "rename_column",
            Self::Unnest => "unnest",
            Self::Lookup => "lookup",
            Self::MapValues => "map_values",
            Self::StaticValue => "static_value",
            Self::ApplyDefaultIfColumnMissing => "apply_default_if_column_missing",
            Self::SetColumnDtypes => "set_column_dtypes",
        }
    }

    /// Whether the rule reads a raw input column (the `column` field).
    pub fn requires_source_column(&self) -> bool {
        !matches!(
            self,
            Self::StaticValue | Self::SqlQuery | Self::SqlCondition | Self::Lookup
        )
    }

    /// Whether the rule is evaluated through the SQL context rather than
    /// as a column expression.
    pub fn is_sql(&self) -> bool {
        matches!(self, Self::SqlQuery | Self::SqlCondition)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == trimmed)
            .ok_or_else(|| format!("unknown conversion type '{trimmed}'"))
    }
}
