//! Lenient import of stored condition JSON and the flattened legacy export.
//!
//! Stored settings come in several historical shapes:
//! - the current `{ root }` tree
//! - `{ entries[], defaultAggregator, candle }` flattened lists
//! - `{ aggregator, candle }` partial objects
//! - comparisons keyed by `mode` with `targetEntryId`
//! - nodes without ids
//!
//! All of them are coerced into the current tree and then normalized. Nothing
//! here fails on shape problems: unknown kinds and unreadable leaves are
//! dropped, missing fields take defaults, missing ids are derived from the
//! node's path (`root`, `root-child-0`, ...).

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::action::ActionConfig;
use super::comparison::{CandleCondition, Comparator, Comparison, IndicatorMetric};
use super::factory::DEFAULT_ROOT_ID;
use super::indicator::{IndicatorEntry, IndicatorKind, IndicatorSpec};
use super::node::{
    ActionLeaf, CandleLeaf, ConditionNode, GroupNode, IndicatorConditions, IndicatorLeaf,
    LogicalOperator, StatusLeaf,
};
use super::status::{StatusMetric, StatusUnit};
use crate::algebra::normalize;
use crate::domain::{CandleReference, PriceField};
use crate::error::ModelError;

/// Parse stored JSON text of any supported shape.
///
/// Only JSON syntax errors are reported; shape problems are repaired.
pub fn migrate_legacy(json: &str) -> Result<IndicatorConditions, ModelError> {
    let value: Value = serde_json::from_str(json)?;
    Ok(conditions_from_value(&value))
}

/// Coerce any stored shape into a normalized tree.
pub fn conditions_from_value(value: &Value) -> IndicatorConditions {
    let Some(obj) = value.as_object() else {
        return normalize(&default_conditions());
    };

    if let Some(root) = obj.get("root").filter(|r| !r.is_null()) {
        if let Some(node) = node_from_value(root, "root") {
            return normalize(&IndicatorConditions::new(node));
        }
        warn!("stored root is unreadable, falling back to legacy fields");
    }

    if let Some(entries) = obj.get("entries").and_then(Value::as_array) {
        let operator = parse_operator(obj.get("defaultAggregator")).unwrap_or_default();
        let mut children = Vec::new();
        if let Some(candle) = obj.get("candle").filter(|c| c.is_object()) {
            children.push(candle_leaf(candle, "legacy-candle".to_string()));
        }
        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            let Some(leaf) = bare_indicator(entry, &format!("legacy-entry-{index}")) else {
                continue;
            };
            if seen.insert(entry_fingerprint(&leaf)) {
                children.push(ConditionNode::Indicator(leaf));
            }
        }
        return normalize(&group_conditions(operator, children));
    }

    if obj.get("aggregator").is_some_and(|v| !v.is_null()) || obj.get("candle").is_some_and(|v| !v.is_null()) {
        let operator = parse_operator(obj.get("aggregator")).unwrap_or_default();
        let mut children = Vec::new();
        if let Some(candle) = obj.get("candle").filter(|c| c.is_object()) {
            children.push(candle_leaf(candle, "legacy-candle".to_string()));
        }
        return normalize(&group_conditions(operator, children));
    }

    normalize(&default_conditions())
}

fn default_conditions() -> IndicatorConditions {
    group_conditions(LogicalOperator::Or, Vec::new())
}

fn group_conditions(operator: LogicalOperator, children: Vec<ConditionNode>) -> IndicatorConditions {
    IndicatorConditions::new(ConditionNode::Group(GroupNode {
        id: DEFAULT_ROOT_ID.to_string(),
        operator,
        children,
    }))
}

// ─── Node coercion ───────────────────────────────────────────────────

fn node_from_value(value: &Value, fallback_id: &str) -> Option<ConditionNode> {
    let obj = value.as_object()?;
    let id = str_field(obj, "id").unwrap_or(fallback_id).to_string();
    match obj.get("kind").and_then(Value::as_str) {
        Some("group") => {
            let operator = parse_operator(obj.get("operator")).unwrap_or_default();
            let children = obj
                .get("children")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .enumerate()
                        .filter_map(|(i, child)| node_from_value(child, &format!("{fallback_id}-child-{i}")))
                        .collect()
                })
                .unwrap_or_default();
            Some(ConditionNode::Group(GroupNode { id, operator, children }))
        }
        Some("indicator") => {
            if obj.get("indicator").is_some_and(|i| i.get("type").is_some()) {
                indicator_leaf(obj, id).map(ConditionNode::Indicator)
            } else {
                bare_indicator(value, fallback_id).map(ConditionNode::Indicator)
            }
        }
        Some("candle") => {
            let candle = obj.get("candle").unwrap_or(&Value::Null);
            Some(candle_leaf(candle, id))
        }
        Some("status") => status_leaf(obj, id).map(ConditionNode::Status),
        Some("action") => {
            let action = obj.get("action")?;
            match serde_json::from_value::<ActionConfig>(action.clone()) {
                Ok(action) => Some(ConditionNode::Action(ActionLeaf { id, action })),
                Err(err) => {
                    warn!(node = %id, error = %err, "dropping unreadable action leaf");
                    None
                }
            }
        }
        other => {
            warn!(node = %id, kind = ?other, "dropping node of unknown kind");
            None
        }
    }
}

/// `{ kind: "indicator", id, indicator: { id, type, config }, comparison }`.
fn indicator_leaf(obj: &Map<String, Value>, id: String) -> Option<IndicatorLeaf> {
    let indicator = obj.get("indicator")?.as_object()?;
    let kind = parse_kind(indicator.get("type"))?;
    let spec = lenient_spec(kind, indicator.get("config"), &id);
    let entry_id = str_field(indicator, "id").unwrap_or(&id).to_string();
    Some(IndicatorLeaf {
        comparison: lenient_comparison(obj.get("comparison")),
        indicator: IndicatorEntry::new(entry_id, spec),
        id,
    })
}

/// Legacy entry form `{ id, type, config, comparison }`.
fn bare_indicator(value: &Value, fallback_id: &str) -> Option<IndicatorLeaf> {
    let obj = value.as_object()?;
    let kind = parse_kind(obj.get("type"))?;
    let id = str_field(obj, "id").unwrap_or(fallback_id).to_string();
    let spec = lenient_spec(kind, obj.get("config"), &id);
    Some(IndicatorLeaf {
        comparison: lenient_comparison(obj.get("comparison")),
        indicator: IndicatorEntry::new(id.clone(), spec),
        id,
    })
}

fn lenient_spec(kind: IndicatorKind, config: Option<&Value>, id: &str) -> IndicatorSpec {
    let config = match config {
        Some(v) if v.is_object() => v.clone(),
        _ => return IndicatorSpec::default_for(kind),
    };
    IndicatorSpec::from_config(kind, config).unwrap_or_else(|err| {
        warn!(node = %id, error = %err, "unreadable indicator config, using defaults");
        IndicatorSpec::default_for(kind)
    })
}

fn candle_leaf(value: &Value, id: String) -> ConditionNode {
    let candle = if value.is_object() {
        serde_json::from_value::<CandleCondition>(value.clone()).unwrap_or_else(|err| {
            warn!(node = %id, error = %err, "unreadable candle condition, using defaults");
            CandleCondition::default()
        })
    } else {
        CandleCondition::default()
    };
    ConditionNode::Candle(CandleLeaf { id, candle })
}

fn status_leaf(obj: &Map<String, Value>, id: String) -> Option<StatusLeaf> {
    let Some(metric) = obj.get("metric").and_then(Value::as_str).and_then(StatusMetric::parse) else {
        warn!(node = %id, "dropping status leaf with unknown metric");
        return None;
    };
    Some(StatusLeaf {
        metric,
        comparator: parse_comparator(obj.get("comparator")).unwrap_or_default(),
        value: obj.get("value").and_then(Value::as_f64).filter(|v| v.is_finite()).unwrap_or(0.0),
        unit: obj.get("unit").and_then(Value::as_str).and_then(StatusUnit::parse),
        id,
    })
}

/// Accepts both `kind` and legacy `mode` discriminators.
fn lenient_comparison(value: Option<&Value>) -> Comparison {
    let Some(obj) = value.and_then(Value::as_object) else {
        return Comparison::None;
    };
    let tag = str_field(obj, "kind").or_else(|| str_field(obj, "mode"));
    let Some(comparator) = parse_comparator(obj.get("comparator")) else {
        return Comparison::None;
    };
    match tag {
        Some("candle") => Comparison::Candle {
            comparator,
            field: parse_enum::<PriceField>(obj.get("field")).unwrap_or(PriceField::High),
            reference: parse_enum::<CandleReference>(obj.get("reference")).unwrap_or(CandleReference::Previous),
        },
        Some("value") => match obj.get("value").and_then(Value::as_f64) {
            Some(value) if value.is_finite() => Comparison::Value { comparator, value },
            _ => Comparison::None,
        },
        Some("indicator") => {
            let target = str_field(obj, "targetIndicatorId")
                .or_else(|| str_field(obj, "targetEntryId"))
                .filter(|t| !t.is_empty());
            match target {
                Some(target) => Comparison::Indicator {
                    comparator,
                    target_indicator_id: target.to_string(),
                    metric: obj.get("metric").and_then(Value::as_str).and_then(IndicatorMetric::parse),
                    reference: parse_enum::<CandleReference>(obj.get("reference")),
                },
                None => Comparison::None,
            }
        }
        _ => Comparison::None,
    }
}

fn entry_fingerprint(leaf: &IndicatorLeaf) -> String {
    let comparison = serde_json::to_string(&leaf.comparison).unwrap_or_default();
    format!(
        "{}|{}|{}",
        leaf.indicator.kind(),
        leaf.indicator.spec.config_value(),
        comparison
    )
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn parse_enum<T: serde::de::DeserializeOwned>(value: Option<&Value>) -> Option<T> {
    value.and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn parse_operator(value: Option<&Value>) -> Option<LogicalOperator> {
    parse_enum(value)
}

fn parse_comparator(value: Option<&Value>) -> Option<Comparator> {
    parse_enum(value)
}

fn parse_kind(value: Option<&Value>) -> Option<IndicatorKind> {
    parse_enum(value)
}

// ─── Export ──────────────────────────────────────────────────────────

/// Flattened mirror of a tree for consumers that predate nested groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyView {
    pub root: ConditionNode,
    pub entries: Vec<LegacyEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candle: Option<CandleCondition>,
    pub default_aggregator: LogicalOperator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: IndicatorKind,
    pub aggregator: LogicalOperator,
    pub config: Value,
    pub comparison: LegacyComparison,
}

/// Legacy entries always carry `{ "mode": "none" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegacyComparison {
    pub mode: &'static str,
}

/// Export the legacy view: every indicator leaf as an entry, the last candle
/// leaf's condition, and the root operator.
pub fn to_legacy_view(conditions: &IndicatorConditions) -> LegacyView {
    let mut entries = Vec::new();
    let mut candle = None;
    conditions.root.walk(&mut |node| match node {
        ConditionNode::Indicator(leaf) => entries.push(LegacyEntry {
            id: leaf.id.clone(),
            kind: leaf.indicator.kind(),
            aggregator: LogicalOperator::And,
            config: leaf.indicator.spec.config_value(),
            comparison: LegacyComparison { mode: "none" },
        }),
        ConditionNode::Candle(leaf) => candle = Some(leaf.candle),
        _ => {}
    });
    let default_aggregator = conditions
        .root
        .as_group()
        .map(|g| g.operator)
        .unwrap_or_default();
    LegacyView {
        root: conditions.root.clone(),
        entries,
        candle,
        default_aggregator,
    }
}
