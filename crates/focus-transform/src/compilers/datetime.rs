//! Datetime compilers.

use focus_model::{AmbiguousTime, ConversionArgs, ConversionRule};
use polars::prelude::{NonExistent, StrptimeOptions, TimeUnit, TimeZone, col, lit};

use super::{CompiledExpr, mismatched_args, source_column};
use crate::error::{ConvertError, Result};

const UTC: &str = "UTC";

/// Label naive datetimes with the configured timezone.
pub fn assign_timezone(rule: &ConversionRule, alias: &str) -> Result<CompiledExpr> {
    let ConversionArgs::Timezone(args) = &rule.args else {
        return Err(mismatched_args(rule));
    };
    replace_zone(rule, alias, &args.timezone, args.ambiguous)
}

/// Label naive datetimes as UTC.
pub fn assign_utc_timezone(rule: &ConversionRule, alias: &str) -> Result<CompiledExpr> {
    replace_zone(rule, alias, UTC, AmbiguousTime::default())
}

/// Express timezone-aware datetimes in another timezone. The instant is kept.
pub fn convert_timezone(rule: &ConversionRule, alias: &str) -> Result<CompiledExpr> {
    let ConversionArgs::Timezone(args) = &rule.args else {
        return Err(mismatched_args(rule));
    };
    let zone = time_zone(rule, &args.timezone)?;
    Ok(CompiledExpr::Column(
        col(source_column(rule)?)
            .dt()
            .convert_time_zone(zone)
            .alias(alias),
    ))
}

/// Parse strings into datetimes with an optional format and timezone.
///
/// Without a format the layout is inferred from the data. Unparsable values
/// become null unless the rule asks for strict parsing. Repeated wall-clock
/// times are resolved as the rule's `ambiguous` setting says.
pub fn parse_datetime(rule: &ConversionRule, alias: &str) -> Result<CompiledExpr> {
    let ConversionArgs::ParseDatetime(args) = &rule.args else {
        return Err(mismatched_args(rule));
    };
    let zone = match args.timezone.as_deref() {
        Some(name) => Some(time_zone(rule, name)?),
        None => None,
    };
    let options = StrptimeOptions {
        format: args.format.as_deref().map(Into::into),
        strict: args.strict,
        ..Default::default()
    };
    Ok(CompiledExpr::Column(
        col(source_column(rule)?)
            .str()
            .to_datetime(
                Some(TimeUnit::Microseconds),
                zone,
                options,
                lit(args.ambiguous.as_str()),
            )
            .alias(alias),
    ))
}

/// Times skipped by a daylight saving change become null.
fn replace_zone(
    rule: &ConversionRule,
    alias: &str,
    name: &str,
    ambiguous: AmbiguousTime,
) -> Result<CompiledExpr> {
    let zone = time_zone(rule, name)?;
    Ok(CompiledExpr::Column(
        col(source_column(rule)?)
            .dt()
            .replace_time_zone(Some(zone), lit(ambiguous.as_str()), NonExistent::Null)
            .alias(alias),
    ))
}

fn time_zone(rule: &ConversionRule, name: &str) -> Result<TimeZone> {
    TimeZone::opt_try_new(Some(name.trim()))
        .ok()
        .flatten()
        .ok_or_else(|| ConvertError::invalid_args(&rule.plan_name, format!("unknown timezone '{name}'")))
}
