//! FOCUS conversion rule model.
//!
//! - **columns**: the FOCUS target column names
//! - **kind**: the closed set of rule kinds
//! - **args**: typed, kind-specific rule arguments
//! - **rule**: raw rule documents and their validation
//! - **plan**: per-provider ordered rule lists

pub mod args;
pub mod columns;
pub mod error;
pub mod kind;
pub mod plan;
pub mod rule;

pub use args::{
    AmbiguousTime, ColumnDtype, ConversionArgs, DefaultValueArgs, MapValuesArgs, ParseDatetimeArgs,
    SetDtypeArgs, SqlConditionArgs, SqlQueryArgs, StaticValue, StaticValueArgs, TimezoneArgs,
    UnnestArgs, ValueMapping,
};
pub use columns::{FocusColumn, UnknownFocusColumn};
pub use error::{ConfigError, Result, ValidationIssue};
pub use kind::RuleKind;
pub use plan::{ConversionPlan, ProviderPlans};
pub use rule::{ConversionRule, RawRule};
