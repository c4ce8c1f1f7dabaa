//! Node factories.
//!
//! Every constructor assigns a fresh id from the wrapped [`IdSource`] and
//! fills the remaining fields with safe defaults.

use crate::domain::{IdSource, RandomIds, INDICATOR_PREFIX, NODE_PREFIX};

use super::action::ActionConfig;
use super::comparison::{CandleCondition, Comparator, Comparison};
use super::indicator::{IndicatorEntry, IndicatorKind, IndicatorSpec};
use super::node::{
    ActionLeaf, CandleLeaf, ConditionNode, GroupNode, IndicatorConditions, IndicatorLeaf,
    LogicalOperator, StatusLeaf,
};
use super::status::StatusMetric;

/// Id of the root group in a freshly created tree.
pub const DEFAULT_ROOT_ID: &str = "cond-root";

/// Empty conditions: a root group with the stable id `cond-root`.
pub fn create_indicator_conditions(operator: LogicalOperator) -> IndicatorConditions {
    IndicatorConditions::new(ConditionNode::Group(GroupNode {
        id: DEFAULT_ROOT_ID.to_string(),
        operator,
        children: Vec::new(),
    }))
}

/// Builds nodes with fresh ids.
#[derive(Debug, Clone, Default)]
pub struct NodeFactory<S: IdSource = RandomIds> {
    ids: S,
}

impl<S: IdSource> NodeFactory<S> {
    pub fn new(ids: S) -> Self {
        Self { ids }
    }

    pub fn node_id(&mut self) -> String {
        self.ids.next_id(NODE_PREFIX)
    }

    pub fn entry_id(&mut self) -> String {
        self.ids.next_id(INDICATOR_PREFIX)
    }

    pub fn group(&mut self, operator: LogicalOperator, children: Vec<ConditionNode>) -> ConditionNode {
        ConditionNode::Group(GroupNode {
            id: self.node_id(),
            operator,
            children,
        })
    }

    /// Indicator entry with the default config for `kind`.
    pub fn indicator_entry(&mut self, kind: IndicatorKind) -> IndicatorEntry {
        IndicatorEntry::new(self.entry_id(), IndicatorSpec::default_for(kind))
    }

    pub fn indicator_leaf(&mut self, spec: IndicatorSpec, comparison: Comparison) -> ConditionNode {
        let entry = IndicatorEntry::new(self.entry_id(), spec);
        ConditionNode::Indicator(IndicatorLeaf {
            id: self.node_id(),
            indicator: entry,
            comparison,
        })
    }

    /// Indicator leaf with default config and no comparison.
    pub fn default_indicator(&mut self, kind: IndicatorKind) -> ConditionNode {
        self.indicator_leaf(IndicatorSpec::default_for(kind), Comparison::None)
    }

    pub fn status_leaf(&mut self, metric: StatusMetric, comparator: Comparator, value: f64) -> ConditionNode {
        ConditionNode::Status(StatusLeaf {
            id: self.node_id(),
            metric,
            comparator,
            value,
            unit: Some(metric.default_unit()),
        })
    }

    pub fn candle_leaf(&mut self, candle: Option<CandleCondition>) -> ConditionNode {
        ConditionNode::Candle(CandleLeaf {
            id: self.node_id(),
            candle: candle.unwrap_or_default(),
        })
    }

    pub fn action_leaf(&mut self, action: ActionConfig) -> ConditionNode {
        ConditionNode::Action(ActionLeaf {
            id: self.node_id(),
            action,
        })
    }

    /// Mutable access to the id source, for algebra operations that mint ids.
    pub fn ids_mut(&mut self) -> &mut S {
        &mut self.ids
    }
}
