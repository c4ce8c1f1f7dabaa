//! Condition tree nodes.
//!
//! A tree is a `ConditionNode::Group` at the root with arbitrarily nested
//! groups and leaves beneath. Nodes are plain owned values; the algebra in
//! [`crate::algebra`] produces new trees rather than editing in place.

use serde::{Deserialize, Serialize};

use super::action::ActionConfig;
use super::comparison::{Comparator, Comparison, CandleCondition};
use super::indicator::IndicatorEntry;
use super::status::{StatusMetric, StatusUnit};

/// How a group combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    /// Combine child results. Empty AND is true, empty OR is false.
    pub fn combine<I: IntoIterator<Item = bool>>(self, results: I) -> bool {
        let mut iter = results.into_iter();
        match self {
            LogicalOperator::And => iter.all(|r| r),
            LogicalOperator::Or => iter.any(|r| r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub operator: LogicalOperator,
    #[serde(default)]
    pub children: Vec<ConditionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorLeaf {
    #[serde(default)]
    pub id: String,
    pub indicator: IndicatorEntry,
    #[serde(default)]
    pub comparison: Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusLeaf {
    #[serde(default)]
    pub id: String,
    pub metric: StatusMetric,
    #[serde(default)]
    pub comparator: Comparator,
    #[serde(default)]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<StatusUnit>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandleLeaf {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub candle: CandleCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLeaf {
    #[serde(default)]
    pub id: String,
    pub action: ActionConfig,
}

/// One node of a condition tree, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConditionNode {
    Group(GroupNode),
    Indicator(IndicatorLeaf),
    Status(StatusLeaf),
    Candle(CandleLeaf),
    Action(ActionLeaf),
}

impl ConditionNode {
    pub fn id(&self) -> &str {
        match self {
            ConditionNode::Group(n) => &n.id,
            ConditionNode::Indicator(n) => &n.id,
            ConditionNode::Status(n) => &n.id,
            ConditionNode::Candle(n) => &n.id,
            ConditionNode::Action(n) => &n.id,
        }
    }

    pub fn set_id(&mut self, id: String) {
        match self {
            ConditionNode::Group(n) => n.id = id,
            ConditionNode::Indicator(n) => n.id = id,
            ConditionNode::Status(n) => n.id = id,
            ConditionNode::Candle(n) => n.id = id,
            ConditionNode::Action(n) => n.id = id,
        }
    }

    /// Lowercase kind discriminator as persisted.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConditionNode::Group(_) => "group",
            ConditionNode::Indicator(_) => "indicator",
            ConditionNode::Status(_) => "status",
            ConditionNode::Candle(_) => "candle",
            ConditionNode::Action(_) => "action",
        }
    }

    /// Children of a group; empty for leaves.
    pub fn children(&self) -> &[ConditionNode] {
        match self {
            ConditionNode::Group(g) => &g.children,
            _ => &[],
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            ConditionNode::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut GroupNode> {
        match self {
            ConditionNode::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ConditionNode::Group(_))
    }

    /// Pre-order walk over this node and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a ConditionNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Pre-order walk with mutable access.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut ConditionNode)) {
        visit(self);
        if let ConditionNode::Group(g) = self {
            for child in &mut g.children {
                child.walk_mut(visit);
            }
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(ConditionNode::node_count).sum::<usize>()
    }
}

impl From<GroupNode> for ConditionNode {
    fn from(g: GroupNode) -> Self {
        ConditionNode::Group(g)
    }
}

/// One rule set: `{ "root": <group> }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConditions {
    pub root: ConditionNode,
}

impl IndicatorConditions {
    pub fn new(root: ConditionNode) -> Self {
        Self { root }
    }

    /// Parse the strict current JSON shape. See
    /// [`crate::model::conditions_from_value`] for the lenient path.
    pub fn from_json(json: &str) -> Result<Self, crate::error::ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, crate::error::ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn root_group(&self) -> Option<&GroupNode> {
        self.root.as_group()
    }
}
