//! Conversion rule definitions and their load-time validation.
//!
//! A [`RawRule`] is the document as parsed from configuration. It only
//! becomes a [`ConversionRule`] once every field required by its
//! `conversion_type` is present and well-formed. Validation collects every
//! issue before failing, so one report names all offending fields.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::args::{
    ConversionArgs, DefaultValueArgs, MapValuesArgs, ParseDatetimeArgs, SetDtypeArgs,
    SqlConditionArgs, SqlQueryArgs, StaticValueArgs, TimezoneArgs, UnnestArgs,
};
use crate::columns::FocusColumn;
use crate::error::{ConfigError, Result, ValidationIssue};
use crate::kind::RuleKind;

const CONVERSION_ARGS: &str = "conversion_args";

/// A rule document before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRule {
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub focus_column: Option<String>,
    #[serde(default, rename = "column", alias = "source_column")]
    pub source_column: Option<String>,
    #[serde(default)]
    pub conversion_type: Option<String>,
    #[serde(default)]
    pub conversion_args: Option<serde_json::Value>,
    #[serde(default)]
    pub column_prefix: Option<String>,
    #[serde(default)]
    pub dimension_id: Option<u32>,
    #[serde(default)]
    pub priority: Option<u32>,
}

/// A validated conversion rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRule {
    pub plan_name: String,
    pub focus_column: FocusColumn,
    pub source_column: Option<String>,
    pub kind: RuleKind,
    pub args: ConversionArgs,
    pub column_prefix: Option<String>,
    pub dimension_id: u32,
    pub priority: u32,
}

impl ConversionRule {
    /// Validate a raw rule document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] listing every offending field.
    pub fn from_raw(raw: RawRule) -> Result<Self> {
        let mut issues = Vec::new();
        let plan_name = raw
            .plan_name
            .clone()
            .unwrap_or_else(|| "<unnamed>".to_string());

        let focus_column = match raw.focus_column.as_deref() {
            None => {
                issues.push(ValidationIssue::required("focus_column"));
                None
            }
            Some(name) => match name.parse::<FocusColumn>() {
                Ok(column) => Some(column),
                Err(err) => {
                    issues.push(ValidationIssue::new("focus_column", err.to_string()));
                    None
                }
            },
        };

        let kind = match raw.conversion_type.as_deref() {
            None => {
                issues.push(ValidationIssue::required("conversion_type"));
                None
            }
            Some(name) => match name.parse::<RuleKind>() {
                Ok(kind) => Some(kind),
                Err(message) => {
                    issues.push(ValidationIssue::new("conversion_type", message));
                    None
                }
            },
        };

        let source_column = raw
            .source_column
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let args = kind.and_then(|kind| {
            if kind.requires_source_column() && source_column.is_none() {
                issues.push(ValidationIssue::new(
                    "column",
                    format!("field required for {kind}"),
                ));
            }
            validate_args(kind, raw.conversion_args.as_ref(), &mut issues)
        });

        let column_prefix = raw
            .column_prefix
            .as_deref()
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
            .map(str::to_string);

        match (focus_column, kind, args) {
            (Some(focus_column), Some(kind), Some(args)) if issues.is_empty() => Ok(Self {
                plan_name,
                focus_column,
                source_column,
                kind,
                args,
                column_prefix,
                dimension_id: raw.dimension_id.unwrap_or(0),
                priority: raw.priority.unwrap_or(0),
            }),
            _ => Err(ConfigError::Validation { plan_name, issues }),
        }
    }

    /// Name of the column this rule writes: `{prefix}_{focus_column}` for
    /// staged rules, the FOCUS column otherwise.
    pub fn column_alias(&self) -> String {
        match &self.column_prefix {
            Some(prefix) => format!("{prefix}_{}", self.focus_column),
            None => self.focus_column.as_str().to_string(),
        }
    }

    /// Whether the alias is an intermediate dropped before export.
    pub fn is_temporary(&self) -> bool {
        self.column_prefix.is_some()
    }

    /// Execution order key. The plan name breaks ties so ordering never
    /// depends on the order rules were loaded in.
    pub fn ordering_key(&self) -> (u32, u32, &str) {
        (self.dimension_id, self.priority, &self.plan_name)
    }
}

impl TryFrom<RawRule> for ConversionRule {
    type Error = ConfigError;

    fn try_from(raw: RawRule) -> Result<Self> {
        Self::from_raw(raw)
    }
}

fn validate_args(
    kind: RuleKind,
    raw: Option<&serde_json::Value>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<ConversionArgs> {
    match kind {
        RuleKind::RenameColumn | RuleKind::AssignUtcTimezone => Some(ConversionArgs::None),
        RuleKind::AssignTimezone | RuleKind::ConvertTimezone => {
            let args: TimezoneArgs = decode(raw, issues)?;
            if args.timezone.trim().is_empty() {
                issues.push(ValidationIssue::new(CONVERSION_ARGS, "timezone is empty"));
                return None;
            }
            Some(ConversionArgs::Timezone(args))
        }
        RuleKind::ParseDatetime => {
            // every field is optional
            let args = match raw {
                None | Some(serde_json::Value::Null) => ParseDatetimeArgs::default(),
                Some(_) => decode(raw, issues)?,
            };
            Some(ConversionArgs::ParseDatetime(args))
        }
        RuleKind::StaticValue => decode::<StaticValueArgs>(raw, issues).map(ConversionArgs::StaticValue),
        RuleKind::MapValues => {
            let args: MapValuesArgs = decode(raw, issues)?;
            if args.value_list.is_empty() {
                issues.push(ValidationIssue::new(CONVERSION_ARGS, "value_list is empty"));
                return None;
            }
            Some(ConversionArgs::MapValues(args))
        }
        RuleKind::Unnest => {
            let args = match raw {
                None | Some(serde_json::Value::Null) => UnnestArgs::default(),
                Some(_) => decode(raw, issues)?,
            };
            Some(ConversionArgs::Unnest(args))
        }
        RuleKind::ApplyDefaultIfColumnMissing => {
            decode::<DefaultValueArgs>(raw, issues).map(ConversionArgs::DefaultValue)
        }
        RuleKind::SetColumnDtypes => decode::<SetDtypeArgs>(raw, issues).map(ConversionArgs::SetDtype),
        RuleKind::SqlCondition => {
            let args: SqlConditionArgs = decode(raw, issues)?;
            if args.conditions.is_empty() {
                issues.push(ValidationIssue::new(CONVERSION_ARGS, "conditions is empty"));
                return None;
            }
            if let Some(bad) = args.conditions.iter().find(|clause| !is_when_clause(clause)) {
                issues.push(ValidationIssue::new(
                    CONVERSION_ARGS,
                    format!("condition must be a WHEN ... THEN ... clause: {bad}"),
                ));
                return None;
            }
            Some(ConversionArgs::SqlCondition(args))
        }
        RuleKind::SqlQuery => {
            let args: SqlQueryArgs = decode(raw, issues)?;
            if args.query().trim().is_empty() {
                issues.push(ValidationIssue::new(CONVERSION_ARGS, "sql query is empty"));
                return None;
            }
            Some(ConversionArgs::SqlQuery(args))
        }
        RuleKind::Lookup => Some(ConversionArgs::Lookup(
            raw.cloned().unwrap_or(serde_json::Value::Null),
        )),
    }
}

fn decode<T: DeserializeOwned>(
    raw: Option<&serde_json::Value>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<T> {
    let Some(value) = raw.filter(|value| !value.is_null()) else {
        issues.push(ValidationIssue::required(CONVERSION_ARGS));
        return None;
    };
    match serde_json::from_value(value.clone()) {
        Ok(args) => Some(args),
        Err(err) => {
            issues.push(ValidationIssue::new(CONVERSION_ARGS, err.to_string()));
            None
        }
    }
}

fn is_when_clause(clause: &str) -> bool {
    let upper = clause.trim_start().to_ascii_uppercase();
    upper.starts_with("WHEN ") && upper.contains(" THEN ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::StaticValue;

    fn raw(kind: &str, args: Option<serde_json::Value>) -> RawRule {
        RawRule {
            plan_name: Some("sample".to_string()),
            focus_column: Some("Region".to_string()),
            source_column: Some("test_column".to_string()),
            conversion_type: Some(kind.to_string()),
            conversion_args: args,
            ..RawRule::default()
        }
    }

    #[test]
    fn static_value_without_args_reports_one_issue() {
        let err = ConversionRule::from_raw(raw("static_value", None)).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].loc, "conversion_args");
    }

    #[test]
    fn static_value_null_is_rejected() {
        let args = serde_json::json!({ "static_value": null });
        let err = ConversionRule::from_raw(raw("static_value", Some(args))).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].loc, "conversion_args");
    }

    #[test]
    fn map_values_requires_entries() {
        let args = serde_json::json!({ "value_list": [], "default_value": "z" });
        let err = ConversionRule::from_raw(raw("map_values", Some(args))).unwrap_err();
        assert_eq!(err.issues()[0].message, "value_list is empty");
    }

    #[test]
    fn rename_requires_source_column() {
        let mut rule = raw("rename_column", None);
        rule.source_column = Some("  ".to_string());
        let err = ConversionRule::from_raw(rule).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].loc, "column");
    }

    #[test]
    fn collects_every_issue() {
        let rule = RawRule {
            plan_name: Some("broken".to_string()),
            focus_column: Some("NotAColumn".to_string()),
            conversion_type: Some("sql_condition".to_string()),
            conversion_args: Some(serde_json::json!({ "conditions": ["x = 1"] })),
            ..RawRule::default()
        };
        let err = ConversionRule::from_raw(rule).unwrap_err();
        let locs: Vec<&str> = err.issues().iter().map(|issue| issue.loc.as_str()).collect();
        assert_eq!(locs, vec!["focus_column", "conversion_args"]);
    }

    #[test]
    fn sql_condition_requires_when_clauses() {
        let args = serde_json::json!({ "conditions": ["x = 1"], "default_value": "d" });
        let err = ConversionRule::from_raw(raw("sql_condition", Some(args))).unwrap_err();
        assert!(err.issues()[0].message.starts_with("condition must be a WHEN"));
    }

    #[test]
    fn prefixed_alias_is_temporary() {
        let mut rule = raw("static_value", Some(serde_json::json!({ "static_value": "x" })));
        rule.column_prefix = Some("tmp".to_string());
        let rule = ConversionRule::from_raw(rule).unwrap();
        assert_eq!(rule.column_alias(), "tmp_Region");
        assert!(rule.is_temporary());
        assert_eq!(
            rule.args,
            ConversionArgs::StaticValue(StaticValueArgs {
                static_value: StaticValue::from("x")
            })
        );
    }

    #[test]
    fn lookup_is_accepted_by_the_model() {
        let mut rule = raw("lookup", None);
        rule.source_column = None;
        let rule = ConversionRule::from_raw(rule).unwrap();
        assert_eq!(rule.kind, RuleKind::Lookup);
    }
}
