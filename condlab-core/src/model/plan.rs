//! Flattened, document-ordered view of a tree.

use serde::Serialize;

use super::action::ActionConfig;
use super::comparison::CandleCondition;
use super::node::{ConditionNode, IndicatorConditions, IndicatorLeaf, LogicalOperator, StatusLeaf};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedGroup {
    pub id: String,
    pub operator: LogicalOperator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedCandle {
    pub id: String,
    pub candle: CandleCondition,
}

/// An action leaf together with its enclosing groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedAction {
    pub id: String,
    /// Nearest enclosing group.
    pub group_id: String,
    /// Every enclosing group id, root first. The action is armed only when
    /// all of them passed.
    pub group_path: Vec<String>,
    pub action: ActionConfig,
}

impl PlannedAction {
    pub fn is_armed(&self, passed: impl Fn(&str) -> bool) -> bool {
        self.group_path.iter().all(|id| passed(id))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutablePlan {
    pub indicators: Vec<IndicatorLeaf>,
    pub statuses: Vec<StatusLeaf>,
    pub candles: Vec<PlannedCandle>,
    pub groups: Vec<PlannedGroup>,
    pub actions: Vec<PlannedAction>,
}

/// Flatten a tree into per-kind lists.
pub fn to_executable_plan(conditions: &IndicatorConditions) -> ExecutablePlan {
    let mut plan = ExecutablePlan::default();
    let root_id = conditions.root.id().to_string();
    let mut stack: Vec<String> = Vec::new();
    flatten(&conditions.root, &root_id, &mut stack, &mut plan);
    plan
}

fn flatten(node: &ConditionNode, root_id: &str, stack: &mut Vec<String>, plan: &mut ExecutablePlan) {
    match node {
        ConditionNode::Group(g) => {
            plan.groups.push(PlannedGroup {
                id: g.id.clone(),
                operator: g.operator,
            });
            stack.push(g.id.clone());
            for child in &g.children {
                flatten(child, root_id, stack, plan);
            }
            stack.pop();
        }
        ConditionNode::Indicator(leaf) => plan.indicators.push(leaf.clone()),
        ConditionNode::Status(leaf) => plan.statuses.push(leaf.clone()),
        ConditionNode::Candle(leaf) => plan.candles.push(PlannedCandle {
            id: leaf.id.clone(),
            candle: leaf.candle,
        }),
        ConditionNode::Action(leaf) => {
            let group_path = if stack.is_empty() {
                vec![root_id.to_string()]
            } else {
                stack.clone()
            };
            plan.actions.push(PlannedAction {
                id: leaf.id.clone(),
                group_id: group_path.last().cloned().unwrap_or_default(),
                group_path,
                action: leaf.action.clone(),
            });
        }
    }
}
