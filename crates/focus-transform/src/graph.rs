//! Column dependency graph of a conversion plan.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use focus_model::{ConversionArgs, ConversionPlan, ConversionRule, RuleKind};

use crate::sql_refs::{condition_columns, referenced_columns};

/// "`source` is used to produce `target`" for one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub source: String,
    pub target: String,
    pub rule_name: String,
    pub kind: RuleKind,
}

/// Columns and the rules that connect them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: BTreeSet<String>,
    edges: Vec<DependencyEdge>,
}

impl DependencyGraph {
    pub fn from_plan(plan: &ConversionPlan) -> Self {
        let mut graph = Self::default();
        for rule in plan {
            graph.add_rule(rule);
        }
        graph
    }

    /// Add the produced column and one edge per referenced input.
    pub fn add_rule(&mut self, rule: &ConversionRule) {
        let target = rule.column_alias();
        self.nodes.insert(target.clone());
        for source in rule_sources(rule) {
            if source == target {
                continue;
            }
            self.nodes.insert(source.clone());
            self.edges.push(DependencyEdge {
                source,
                target: target.clone(),
                rule_name: rule.plan_name.clone(),
                kind: rule.kind,
            });
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Columns `column` is directly produced from.
    pub fn inputs_of(&self, column: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|edge| edge.target == column)
            .map(|edge| edge.source.as_str())
            .collect()
    }
}

fn rule_sources(rule: &ConversionRule) -> Vec<String> {
    match &rule.args {
        ConversionArgs::SqlCondition(args) => condition_columns(&args.conditions.join(" ")),
        ConversionArgs::SqlQuery(args) => referenced_columns(args.query()),
        _ => rule.source_column.iter().cloned().collect(),
    }
}

/// Renders a dependency graph into some output format.
pub trait GraphRenderer {
    type Output;

    fn render(&self, graph: &DependencyGraph) -> Self::Output;
}

/// Graphviz DOT output.
#[derive(Debug, Clone)]
pub struct DotRenderer {
    pub name: String,
}

impl Default for DotRenderer {
    fn default() -> Self {
        Self {
            name: "conversion_plan".to_string(),
        }
    }
}

impl GraphRenderer for DotRenderer {
    type Output = String;

    fn render(&self, graph: &DependencyGraph) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph {} {{", self.name);
        let _ = writeln!(out, "    rankdir=LR;");
        for node in graph.nodes() {
            let _ = writeln!(out, "    \"{}\";", escape(node));
        }
        for edge in graph.edges() {
            let _ = writeln!(
                out,
                "    \"{}\" -> \"{}\" [label=\"{} ({})\"];",
                escape(&edge.source),
                escape(&edge.target),
                escape(&edge.rule_name),
                edge.kind
            );
        }
        out.push('}');
        out
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use focus_model::{FocusColumn, SqlConditionArgs, StaticValue, StaticValueArgs};

    use super::*;

    fn rule(
        name: &str,
        focus: FocusColumn,
        source: Option<&str>,
        kind: RuleKind,
        args: ConversionArgs,
        dimension_id: u32,
    ) -> ConversionRule {
        ConversionRule {
            plan_name: name.to_string(),
            focus_column: focus,
            source_column: source.map(str::to_string),
            kind,
            args,
            column_prefix: None,
            dimension_id,
            priority: 0,
        }
    }

    fn sample_plan() -> ConversionPlan {
        ConversionPlan::new(
            "aws",
            vec![
                rule(
                    "usage start",
                    FocusColumn::ChargePeriodStart,
                    Some("lineItem/UsageStartDate"),
                    RuleKind::AssignUtcTimezone,
                    ConversionArgs::None,
                    1,
                ),
                rule(
                    "charge category",
                    FocusColumn::ChargeCategory,
                    None,
                    RuleKind::SqlCondition,
                    ConversionArgs::SqlCondition(SqlConditionArgs {
                        conditions: vec![
                            "WHEN \"lineItem/LineItemType\" = 'Tax' THEN 'Tax'".to_string(),
                        ],
                        default_value: StaticValue::from("Usage"),
                    }),
                    2,
                ),
                rule(
                    "currency",
                    FocusColumn::BilledCurrency,
                    None,
                    RuleKind::StaticValue,
                    ConversionArgs::StaticValue(StaticValueArgs {
                        static_value: StaticValue::from("USD"),
                    }),
                    3,
                ),
            ],
        )
    }

    #[test]
    fn edges_follow_source_and_sql_references() {
        let graph = DependencyGraph::from_plan(&sample_plan());
        assert_eq!(graph.edges().len(), 2);
        assert_eq!(graph.inputs_of("ChargeCategory"), vec!["lineItem/LineItemType"]);
        assert!(graph.inputs_of("BilledCurrency").is_empty());
        assert!(graph.nodes().any(|node| node == "BilledCurrency"));
    }

    #[test]
    fn dot_output() {
        let graph = DependencyGraph::from_plan(&sample_plan());
        insta::assert_snapshot!(DotRenderer::default().render(&graph), @r#"
        digraph conversion_plan {
            rankdir=LR;
            "BilledCurrency";
            "ChargeCategory";
            "ChargePeriodStart";
            "lineItem/LineItemType";
            "lineItem/UsageStartDate";
            "lineItem/UsageStartDate" -> "ChargePeriodStart" [label="usage start (assign_utc_timezone)"];
            "lineItem/LineItemType" -> "ChargeCategory" [label="charge category (sql_condition)"];
        }
        "#);
    }
}
