//! Kind-specific rule arguments (`conversion_args`).
//!
//! Arguments arrive as loosely typed structured data and are decoded into
//! one of the typed structs below during validation. Each struct describes
//! the minimal schema its rule kind needs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar literal from a rule document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StaticValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl StaticValue {
    /// String form used for key comparison and string-typed outputs.
    pub fn to_key_string(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Str(value) => value.clone(),
        }
    }

    /// Render as a SQL literal. Strings are single-quoted with embedded
    /// quotes doubled.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Str(value) => format!("'{}'", value.replace('\'', "''")),
        }
    }
}

impl fmt::Display for StaticValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key_string())
    }
}

impl From<&str> for StaticValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// How a wall-clock time that occurs twice in a timezone is resolved.
///
/// Such times only exist in the hour repeated when clocks fall back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguousTime {
    Earliest,
    Latest,
    #[default]
    Null,
    /// Fail the batch.
    Raise,
}

impl AmbiguousTime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Earliest => "earliest",
            Self::Latest => "latest",
            Self::Null => "null",
            Self::Raise => "raise",
        }
    }
}

/// `assign_timezone` / `convert_timezone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneArgs {
    pub timezone: String,
    /// Resolution of repeated wall-clock times, used when assigning.
    #[serde(default)]
    pub ambiguous: AmbiguousTime,
}

/// `parse_datetime`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDatetimeArgs {
    /// strftime-style format. Inferred from the data when absent.
    #[serde(default)]
    pub format: Option<String>,
    /// Timezone attached to the parsed values.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Fail the batch on unparsable values instead of producing nulls.
    #[serde(default)]
    pub strict: bool,
    /// Resolution of repeated wall-clock times in `timezone`.
    #[serde(default)]
    pub ambiguous: AmbiguousTime,
}

/// `static_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticValueArgs {
    pub static_value: StaticValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueMapping {
    pub key: StaticValue,
    pub value: StaticValue,
}

/// `map_values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapValuesArgs {
    pub value_list: Vec<ValueMapping>,
    #[serde(default)]
    pub default_value: Option<StaticValue>,
    /// When false, null inputs stay null instead of receiving the default.
    #[serde(default = "default_true")]
    pub apply_default_if_null: bool,
}

fn default_true() -> bool {
    true
}

/// `unnest`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnnestArgs {
    /// Struct field to extract. Every field is expanded when absent.
    #[serde(default)]
    pub field: Option<String>,
}

/// `apply_default_if_column_missing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultValueArgs {
    pub default_value: StaticValue,
}

/// Primitive types accepted by `set_column_dtypes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnDtype {
    #[serde(alias = "utf8", alias = "str")]
    String,
    Int32,
    Int64,
    Float32,
    Float64,
    #[serde(alias = "bool")]
    Boolean,
    Date,
    Datetime,
}

/// `set_column_dtypes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDtypeArgs {
    pub dtype: ColumnDtype,
}

/// `sql_condition`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlConditionArgs {
    /// `WHEN <predicate> THEN <value>` clauses, evaluated in order.
    pub conditions: Vec<String>,
    pub default_value: StaticValue,
}

/// `sql_query`. Accepts either the bare query text or `{ sql_query: ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlQueryArgs {
    Text(String),
    Keyed { sql_query: String },
}

impl SqlQueryArgs {
    pub fn query(&self) -> &str {
        match self {
            Self::Text(query) | Self::Keyed { sql_query: query } => query,
        }
    }
}

/// Validated arguments, one variant per argument shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionArgs {
    /// Kinds without arguments (`rename_column`, `assign_utc_timezone`).
    None,
    Timezone(TimezoneArgs),
    ParseDatetime(ParseDatetimeArgs),
    StaticValue(StaticValueArgs),
    MapValues(MapValuesArgs),
    Unnest(UnnestArgs),
    DefaultValue(DefaultValueArgs),
    SetDtype(SetDtypeArgs),
    SqlCondition(SqlConditionArgs),
    SqlQuery(SqlQueryArgs),
    /// Kept verbatim; no compiler interprets it.
    Lookup(serde_json::Value),
}
