//! Column-shaping compilers: renames, constants, value mapping, unnesting,
//! defaults and casts.

use focus_model::{ColumnDtype, ConversionArgs, ConversionRule};
use polars::prelude::{DataType, TimeUnit, col, lit, when};

use super::{CompiledExpr, mismatched_args, null_string, source_column, static_literal};
use crate::error::Result;

/// Copy the source column under the alias.
pub fn rename_column(rule: &ConversionRule, alias: &str) -> Result<CompiledExpr> {
    Ok(CompiledExpr::Column(col(source_column(rule)?).alias(alias)))
}

/// Constant value for every row.
pub fn static_value(rule: &ConversionRule, alias: &str) -> Result<CompiledExpr> {
    let ConversionArgs::StaticValue(args) = &rule.args else {
        return Err(mismatched_args(rule));
    };
    Ok(CompiledExpr::Column(
        static_literal(&args.static_value).alias(alias),
    ))
}

/// Key-to-value lookup on the stringified source.
///
/// The first matching key wins. Unmatched values receive the default (null
/// when no default is configured). Null inputs receive the default unless
/// `apply_default_if_null` is off, in which case they stay null.
pub fn map_values(rule: &ConversionRule, alias: &str) -> Result<CompiledExpr> {
    let ConversionArgs::MapValues(args) = &rule.args else {
        return Err(mismatched_args(rule));
    };
    let source = col(source_column(rule)?).cast(DataType::String);

    let default = match &args.default_value {
        Some(value) => lit(value.to_key_string()),
        None => null_string(),
    };
    let fallback = if args.apply_default_if_null {
        default
    } else {
        when(source.clone().is_null())
            .then(null_string())
            .otherwise(default)
    };

    let expr = args
        .value_list
        .iter()
        .rev()
        .fold(fallback, |otherwise, mapping| {
            when(source.clone().eq(lit(mapping.key.to_key_string())))
                .then(lit(mapping.value.to_key_string()))
                .otherwise(otherwise)
        });
    Ok(CompiledExpr::Column(expr.alias(alias)))
}

/// Extract a struct field, or expand every field as `{alias}_{field}`.
pub fn unnest(rule: &ConversionRule, alias: &str) -> Result<CompiledExpr> {
    let ConversionArgs::Unnest(args) = &rule.args else {
        return Err(mismatched_args(rule));
    };
    let source = col(source_column(rule)?);
    Ok(match &args.field {
        Some(field) => CompiledExpr::Column(source.struct_().field_by_name(field).alias(alias)),
        None => CompiledExpr::Expanded {
            expr: source
                .struct_()
                .field_by_names(["*"])
                .name()
                .prefix(&format!("{alias}_")),
            prefix: alias.to_string(),
        },
    })
}

/// Copy the source when present, otherwise fill with the default.
pub fn apply_default_if_column_missing(
    rule: &ConversionRule,
    alias: &str,
) -> Result<CompiledExpr> {
    let ConversionArgs::DefaultValue(args) = &rule.args else {
        return Err(mismatched_args(rule));
    };
    Ok(CompiledExpr::DefaultIfMissing {
        source: source_column(rule)?.to_string(),
        alias: alias.to_string(),
        default: args.default_value.clone(),
    })
}

/// Cast the source to a primitive type. Unconvertible values become null.
pub fn set_column_dtypes(rule: &ConversionRule, alias: &str) -> Result<CompiledExpr> {
    let ConversionArgs::SetDtype(args) = &rule.args else {
        return Err(mismatched_args(rule));
    };
    Ok(CompiledExpr::Column(
        col(source_column(rule)?)
            .cast(polars_dtype(args.dtype))
            .alias(alias),
    ))
}

fn polars_dtype(dtype: ColumnDtype) -> DataType {
    match dtype {
        ColumnDtype::String => DataType::String,
        ColumnDtype::Int32 => DataType::Int32,
        ColumnDtype::Int64 => DataType::Int64,
        ColumnDtype::Float32 => DataType::Float32,
        ColumnDtype::Float64 => DataType::Float64,
        ColumnDtype::Boolean => DataType::Boolean,
        ColumnDtype::Date => DataType::Date,
        ColumnDtype::Datetime => DataType::Datetime(TimeUnit::Microseconds, None),
    }
}
