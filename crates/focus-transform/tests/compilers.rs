//! Per-kind behavior of compiled rules on real frames.

use focus_model::{ConversionPlan, ConversionRule, RawRule};
use focus_transform::{CompiledPlan, ConvertError, RuleRegistry};
use polars::prelude::*;
use serde_json::json;

fn rule(value: serde_json::Value) -> ConversionRule {
    let raw: RawRule = serde_json::from_value(value).unwrap();
    ConversionRule::from_raw(raw).unwrap()
}

fn compile(rules: Vec<ConversionRule>) -> CompiledPlan {
    CompiledPlan::build(&ConversionPlan::new("test", rules), &RuleRegistry::standard()).unwrap()
}

fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect()
}

fn map_values_rule(apply_default_if_null: bool) -> ConversionRule {
    rule(json!({
        "plan_name": "sku",
        "focus_column": "SkuId",
        "column": "code",
        "conversion_type": "map_values",
        "conversion_args": {
            "value_list": [
                {"key": "1", "value": "a"},
                {"key": "2", "value": "b"}
            ],
            "default_value": "z",
            "apply_default_if_null": apply_default_if_null
        }
    }))
}

fn codes() -> DataFrame {
    DataFrame::new(vec![
        Series::new("code".into(), &[Some("1"), Some("2"), Some("3"), None]).into(),
    ])
    .unwrap()
}

#[test]
fn test_static_value_fills_every_row() {
    let plan = compile(vec![rule(json!({
        "plan_name": "currency",
        "focus_column": "BilledCurrency",
        "conversion_type": "static_value",
        "conversion_args": {"static_value": "USD"}
    }))]);
    let df = DataFrame::new(vec![Series::new("x".into(), &[1i64, 2, 3]).into()]).unwrap();

    let out = plan.apply_eager(df).unwrap();

    assert_eq!(strings(&out, "BilledCurrency"), vec![Some("USD".to_string()); 3]);
    assert_eq!(strings(&out, "provider"), vec![Some("test".to_string()); 3]);
}

#[test]
fn test_map_values_applies_default_to_nulls() {
    let out = compile(vec![map_values_rule(true)]).apply_eager(codes()).unwrap();
    let col = out.column("SkuId").unwrap().str().unwrap();
    assert_eq!(col.get(0), Some("a"));
    assert_eq!(col.get(1), Some("b"));
    assert_eq!(col.get(2), Some("z"));
    assert_eq!(col.get(3), Some("z"));
}

#[test]
fn test_map_values_keeps_nulls_when_asked() {
    let out = compile(vec![map_values_rule(false)]).apply_eager(codes()).unwrap();
    let col = out.column("SkuId").unwrap().str().unwrap();
    assert_eq!(col.get(2), Some("z"));
    assert_eq!(col.get(3), None);
}

#[test]
fn test_map_values_compares_string_form_of_numbers() {
    let plan = compile(vec![map_values_rule(true)]);
    let df = DataFrame::new(vec![Series::new("code".into(), &[2i64, 1]).into()]).unwrap();

    let out = plan.apply_eager(df).unwrap();

    let col = out.column("SkuId").unwrap().str().unwrap();
    assert_eq!(col.get(0), Some("b"));
    assert_eq!(col.get(1), Some("a"));
}

fn charge_category_rule() -> ConversionRule {
    rule(json!({
        "plan_name": "category",
        "focus_column": "ChargeCategory",
        "conversion_type": "sql_condition",
        "conversion_args": {
            "conditions": ["WHEN sample_column = 'matched_value' THEN 'Matched'"],
            "default_value": "default_value"
        }
    }))
}

#[test]
fn test_sql_condition_matches_and_defaults() {
    let df = DataFrame::new(vec![
        Series::new("sample_column".into(), &["matched_value", "unmatched_value"]).into(),
    ])
    .unwrap();

    let out = compile(vec![charge_category_rule()]).apply_eager(df).unwrap();

    let col = out.column("ChargeCategory").unwrap().str().unwrap();
    assert_eq!(col.get(0), Some("Matched"));
    assert_eq!(col.get(1), Some("default_value"));
}

#[test]
fn test_sql_condition_on_missing_column_assigns_default() {
    let df = DataFrame::new(vec![Series::new("other".into(), &["a", "b"]).into()]).unwrap();

    let out = compile(vec![charge_category_rule()]).apply_eager(df).unwrap();

    assert_eq!(
        strings(&out, "ChargeCategory"),
        vec![Some("default_value".to_string()); 2]
    );
}

#[test]
fn test_sql_condition_replaces_existing_column() {
    let df = DataFrame::new(vec![
        Series::new("sample_column".into(), &["matched_value"]).into(),
        Series::new("ChargeCategory".into(), &["stale"]).into(),
    ])
    .unwrap();

    let out = compile(vec![charge_category_rule()]).apply_eager(df).unwrap();

    assert_eq!(strings(&out, "ChargeCategory"), vec![Some("Matched".to_string())]);
}

#[test]
fn test_sql_condition_overrides_static_value_on_same_column() {
    let plan = compile(vec![
        rule(json!({
            "plan_name": "category default",
            "focus_column": "ChargeCategory",
            "conversion_type": "static_value",
            "conversion_args": {"static_value": "Usage"},
            "dimension_id": 1
        })),
        rule(json!({
            "plan_name": "category tax",
            "focus_column": "ChargeCategory",
            "conversion_type": "sql_condition",
            "conversion_args": {
                "conditions": ["WHEN \"t\" = 'Tax' THEN 'Tax'"],
                "default_value": "Usage"
            },
            "dimension_id": 2
        })),
    ]);
    let df = DataFrame::new(vec![Series::new("t".into(), &["Tax", "x"]).into()]).unwrap();

    let applied = plan.apply(df.lazy()).unwrap();

    assert_eq!(applied.target_columns, vec!["ChargeCategory"]);
    let out = applied.frame.collect().unwrap();
    let names: Vec<&str> = out.get_column_names().iter().map(|name| name.as_str()).collect();
    assert_eq!(names, ["t", "provider", "ChargeCategory"]);
    assert_eq!(
        strings(&out, "ChargeCategory"),
        vec![Some("Tax".to_string()), Some("Usage".to_string())]
    );
}

#[test]
fn test_sql_condition_may_read_the_column_it_replaces() {
    let plan = compile(vec![rule(json!({
        "plan_name": "category",
        "focus_column": "ChargeCategory",
        "conversion_type": "sql_condition",
        "conversion_args": {
            "conditions": ["WHEN \"ChargeCategory\" = 'Credit' THEN 'Adjustment'"],
            "default_value": "Usage"
        }
    }))]);
    let df = DataFrame::new(vec![
        Series::new("ChargeCategory".into(), &["Credit", "Fee"]).into(),
    ])
    .unwrap();

    let out = plan.apply_eager(df).unwrap();

    assert_eq!(
        strings(&out, "ChargeCategory"),
        vec![Some("Adjustment".to_string()), Some("Usage".to_string())]
    );
    assert!(out.column("__focus_staging").is_err());
}

fn keyword_columns_rule() -> ConversionRule {
    rule(json!({
        "plan_name": "category",
        "focus_column": "ChargeCategory",
        "conversion_type": "sql_condition",
        "conversion_args": {
            "conditions": [
                "WHEN type = 'Tax' THEN 'Tax'",
                "WHEN usage > 0 THEN 'Usage'",
                "WHEN date IS NULL THEN 'Adjustment'"
            ],
            "default_value": "Purchase"
        }
    }))
}

#[test]
fn test_sql_condition_on_absent_unquoted_keyword_columns_assigns_default() {
    let df = DataFrame::new(vec![Series::new("other".into(), &["a", "b"]).into()]).unwrap();

    let out = compile(vec![keyword_columns_rule()]).apply_eager(df).unwrap();

    assert_eq!(
        strings(&out, "ChargeCategory"),
        vec![Some("Purchase".to_string()); 2]
    );
}

#[test]
fn test_sql_condition_keeps_clauses_on_present_keyword_columns() {
    let df = DataFrame::new(vec![Series::new("type".into(), &["Tax", "Fee"]).into()]).unwrap();

    let out = compile(vec![keyword_columns_rule()]).apply_eager(df).unwrap();

    assert_eq!(
        strings(&out, "ChargeCategory"),
        vec![Some("Tax".to_string()), Some("Purchase".to_string())]
    );
}

#[test]
fn test_sql_query_runs_over_working_table() {
    let plan = compile(vec![rule(json!({
        "plan_name": "service",
        "focus_column": "ServiceName",
        "conversion_type": "sql_query",
        "conversion_args": "SELECT *, UPPER(\"product\") AS \"ServiceName\" FROM TABLE_NAME"
    }))]);
    let df = DataFrame::new(vec![Series::new("product".into(), &["ec2", "s3"]).into()]).unwrap();

    let out = plan.apply_eager(df).unwrap();

    let col = out.column("ServiceName").unwrap().str().unwrap();
    assert_eq!(col.get(0), Some("EC2"));
    assert_eq!(col.get(1), Some("S3"));
}

#[test]
fn test_sql_statements_compose_in_order() {
    let plan = compile(vec![
        rule(json!({
            "plan_name": "a service",
            "focus_column": "ServiceName",
            "conversion_type": "sql_query",
            "conversion_args": {"sql_query": "SELECT *, 'Compute' AS \"ServiceName\" FROM TABLE_NAME"},
            "dimension_id": 1
        })),
        rule(json!({
            "plan_name": "b category",
            "focus_column": "ServiceCategory",
            "conversion_type": "sql_condition",
            "conversion_args": {
                "conditions": ["WHEN \"ServiceName\" = 'Compute' THEN 'Compute'"],
                "default_value": "Other"
            },
            "dimension_id": 2
        })),
    ]);
    let df = DataFrame::new(vec![Series::new("x".into(), &[1i64]).into()]).unwrap();

    let out = plan.apply_eager(df).unwrap();

    assert_eq!(strings(&out, "ServiceCategory"), vec![Some("Compute".to_string())]);
}

#[test]
fn test_rename_of_missing_column_is_missing_column_error() {
    let plan = compile(vec![rule(json!({
        "plan_name": "region",
        "focus_column": "Region",
        "column": "product/region",
        "conversion_type": "rename_column"
    }))]);
    let df = DataFrame::new(vec![Series::new("other".into(), &["a"]).into()]).unwrap();

    let err = plan.apply_eager(df).unwrap_err();

    assert!(matches!(err, ConvertError::MissingColumn { .. }), "{err}");
}

fn default_if_missing_rule() -> ConversionRule {
    rule(json!({
        "plan_name": "issuer",
        "focus_column": "InvoiceIssuerName",
        "column": "bill/InvoicingEntity",
        "conversion_type": "apply_default_if_column_missing",
        "conversion_args": {"default_value": "Amazon Web Services"}
    }))
}

#[test]
fn test_default_if_missing_passes_present_column_through() {
    let df = DataFrame::new(vec![
        Series::new("bill/InvoicingEntity".into(), &["AWS EMEA"]).into(),
    ])
    .unwrap();

    let out = compile(vec![default_if_missing_rule()]).apply_eager(df).unwrap();

    assert_eq!(strings(&out, "InvoiceIssuerName"), vec![Some("AWS EMEA".to_string())]);
}

#[test]
fn test_default_if_missing_synthesizes_absent_column() {
    let df = DataFrame::new(vec![Series::new("other".into(), &["a", "b"]).into()]).unwrap();

    let out = compile(vec![default_if_missing_rule()]).apply_eager(df).unwrap();

    assert_eq!(
        strings(&out, "InvoiceIssuerName"),
        vec![Some("Amazon Web Services".to_string()); 2]
    );
}

#[test]
fn test_set_column_dtypes_casts() {
    let plan = compile(vec![rule(json!({
        "plan_name": "cost",
        "focus_column": "BilledCost",
        "column": "lineItem/UnblendedCost",
        "conversion_type": "set_column_dtypes",
        "conversion_args": {"dtype": "float64"}
    }))]);
    let df = DataFrame::new(vec![
        Series::new("lineItem/UnblendedCost".into(), &["1.5", "2.25"]).into(),
    ])
    .unwrap();

    let out = plan.apply_eager(df).unwrap();

    let col = out.column("BilledCost").unwrap().f64().unwrap();
    assert_eq!(col.get(0), Some(1.5));
    assert_eq!(col.get(1), Some(2.25));
}

#[test]
fn test_parse_then_assign_utc_through_temporary_column() {
    let plan = compile(vec![
        rule(json!({
            "plan_name": "parse start",
            "focus_column": "ChargePeriodStart",
            "column": "lineItem/UsageStartDate",
            "conversion_type": "parse_datetime",
            "conversion_args": {"format": "%Y-%m-%d %H:%M:%S"},
            "column_prefix": "tmp",
            "dimension_id": 1
        })),
        rule(json!({
            "plan_name": "utc start",
            "focus_column": "ChargePeriodStart",
            "column": "tmp_ChargePeriodStart",
            "conversion_type": "assign_utc_timezone",
            "dimension_id": 1,
            "priority": 1
        })),
    ]);
    let df = DataFrame::new(vec![
        Series::new("lineItem/UsageStartDate".into(), &["2023-01-01 10:00:00"]).into(),
    ])
    .unwrap();

    let out = plan.apply_eager(df).unwrap();

    assert!(out.column("tmp_ChargePeriodStart").is_err());
    let dtype = out.column("ChargePeriodStart").unwrap().dtype().to_string();
    assert!(dtype.contains("UTC"), "{dtype}");
}

#[test]
fn test_parse_datetime_lenient_yields_null() {
    let plan = compile(vec![rule(json!({
        "plan_name": "parse end",
        "focus_column": "ChargePeriodEnd",
        "column": "end",
        "conversion_type": "parse_datetime",
        "conversion_args": {"format": "%Y-%m-%d %H:%M:%S", "timezone": "UTC"}
    }))]);
    let df = DataFrame::new(vec![
        Series::new("end".into(), &["2023-01-01 10:00:00", "garbage"]).into(),
    ])
    .unwrap();

    let out = plan.apply_eager(df).unwrap();

    let col = out.column("ChargePeriodEnd").unwrap();
    assert_eq!(col.null_count(), 1);
    assert!(col.dtype().to_string().contains("UTC"));
}

fn new_york_plan(timezone_args: serde_json::Value) -> CompiledPlan {
    compile(vec![
        rule(json!({
            "plan_name": "a parse",
            "focus_column": "ChargePeriodStart",
            "column": "start",
            "conversion_type": "parse_datetime",
            "conversion_args": {"format": "%Y-%m-%d %H:%M:%S"},
            "column_prefix": "tmp"
        })),
        rule(json!({
            "plan_name": "b assign",
            "focus_column": "ChargePeriodStart",
            "column": "tmp_ChargePeriodStart",
            "conversion_type": "assign_timezone",
            "conversion_args": timezone_args
        })),
    ])
}

fn daylight_saving_frame() -> DataFrame {
    DataFrame::new(vec![
        Series::new(
            "start".into(),
            &[
                "2024-11-03 00:30:00",
                "2024-11-03 01:30:00",
                "2024-03-10 02:30:00",
            ],
        )
        .into(),
    ])
    .unwrap()
}

#[test]
fn test_assign_timezone_nulls_repeated_and_skipped_hours() {
    let plan = new_york_plan(json!({"timezone": "America/New_York"}));

    let out = plan.apply_eager(daylight_saving_frame()).unwrap();

    let col = out.column("ChargePeriodStart").unwrap();
    assert!(col.dtype().to_string().contains("America/New_York"));
    assert_eq!(col.null_count(), 2);
    assert!(!col.get(0).unwrap().is_null());
}

#[test]
fn test_assign_timezone_can_pick_the_earliest_repeated_hour() {
    let plan = new_york_plan(json!({"timezone": "America/New_York", "ambiguous": "earliest"}));

    let out = plan.apply_eager(daylight_saving_frame()).unwrap();

    let col = out.column("ChargePeriodStart").unwrap();
    assert!(!col.get(1).unwrap().is_null());
    assert!(col.get(2).unwrap().is_null());
}

#[test]
fn test_convert_timezone_changes_zone() {
    let plan = compile(vec![
        rule(json!({
            "plan_name": "a parse",
            "focus_column": "BillingPeriodStart",
            "column": "start",
            "conversion_type": "parse_datetime",
            "conversion_args": {"format": "%Y-%m-%d %H:%M:%S", "timezone": "UTC"},
            "column_prefix": "tmp"
        })),
        rule(json!({
            "plan_name": "b convert",
            "focus_column": "BillingPeriodStart",
            "column": "tmp_BillingPeriodStart",
            "conversion_type": "convert_timezone",
            "conversion_args": {"timezone": "America/New_York"}
        })),
    ]);
    let df = DataFrame::new(vec![
        Series::new("start".into(), &["2023-01-01 10:00:00"]).into(),
    ])
    .unwrap();

    let out = plan.apply_eager(df).unwrap();

    let dtype = out.column("BillingPeriodStart").unwrap().dtype().to_string();
    assert!(dtype.contains("America/New_York"), "{dtype}");
}

fn tagged_frame() -> LazyFrame {
    df!(
        "team" => &["core", "edge"],
        "env" => &["prod", "dev"],
    )
    .unwrap()
    .lazy()
    .select([as_struct(vec![col("team"), col("env")]).alias("resourceTags")])
}

#[test]
fn test_unnest_targets_ignore_unrelated_columns_with_the_same_prefix() {
    let plan = compile(vec![rule(json!({
        "plan_name": "tags",
        "focus_column": "Tags",
        "column": "resourceTags",
        "conversion_type": "unnest"
    }))]);
    let frame = tagged_frame().with_column(lit("old").alias("Tags_legacy"));

    let applied = plan.apply(frame).unwrap();

    assert_eq!(applied.target_columns, vec!["Tags_team", "Tags_env"]);
}

#[test]
fn test_unnest_single_field() {
    let plan = compile(vec![rule(json!({
        "plan_name": "team tag",
        "focus_column": "Tags",
        "column": "resourceTags",
        "conversion_type": "unnest",
        "conversion_args": {"field": "team"}
    }))]);

    let out = plan.apply(tagged_frame()).unwrap().frame.collect().unwrap();

    assert_eq!(
        strings(&out, "Tags"),
        vec![Some("core".to_string()), Some("edge".to_string())]
    );
}

#[test]
fn test_unnest_expands_every_field() {
    let plan = compile(vec![rule(json!({
        "plan_name": "tags",
        "focus_column": "Tags",
        "column": "resourceTags",
        "conversion_type": "unnest"
    }))]);

    let applied = plan.apply(tagged_frame()).unwrap();

    assert_eq!(applied.target_columns, vec!["Tags_team", "Tags_env"]);
    let out = applied.frame.collect().unwrap();
    assert_eq!(strings(&out, "Tags_env"), vec![Some("prod".to_string()), Some("dev".to_string())]);
}

#[test]
fn test_compiling_twice_is_deterministic() {
    let rules = vec![map_values_rule(true), charge_category_rule(), default_if_missing_rule()];
    let first = compile(rules.clone());
    let second = compile(rules);

    assert_eq!(
        format!("{:?}", first.expressions()),
        format!("{:?}", second.expressions())
    );
    assert_eq!(first.sql_statements(), second.sql_statements());
}
