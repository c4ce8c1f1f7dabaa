//! Tree evaluation with a per-node trace.
//!
//! Every child of a group is evaluated (no short-circuit) so the trace holds
//! an entry for each node id. Action leaves do not take part in their
//! group's combination; their trace entry is true only when every enclosing
//! group passed.
//!
//! Indicator leaves read their signal from `EvaluateOptions::indicator_signals`
//! when an entry exists for the leaf id, otherwise from the candle history.
//! Numeric outputs are computed lazily, at most once per leaf.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use super::context::EvaluationContext;
use crate::domain::{CandleReference, OhlcSeries};
use crate::indicators::last;
use crate::model::{
    CandleLeaf, Comparator, Comparison, ConditionNode, GroupNode, IndicatorConditions,
    IndicatorLeaf, StatusLeaf, StatusUnit,
};
use crate::signals::IndicatorOutputs;

/// Node id → passed.
pub type EvaluationTrace = BTreeMap<String, bool>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub result: bool,
    pub trace: EvaluationTrace,
}

impl EvaluationResult {
    pub fn passed(&self, id: &str) -> bool {
        self.trace.get(id).copied().unwrap_or(false)
    }

    /// Ids that evaluated true, in id order.
    pub fn passed_ids(&self) -> Vec<String> {
        self.trace
            .iter()
            .filter(|(_, &ok)| ok)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

/// Inputs besides the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluateOptions<'a> {
    /// Per-leaf signal overrides keyed by indicator leaf id.
    pub indicator_signals: Option<&'a HashMap<String, bool>>,
    /// Candle history, most recent last. Without it indicator leaves have no
    /// computed signal and no numeric value.
    pub history: Option<&'a OhlcSeries>,
}

impl<'a> EvaluateOptions<'a> {
    pub fn with_signals(mut self, signals: &'a HashMap<String, bool>) -> Self {
        self.indicator_signals = Some(signals);
        self
    }

    pub fn with_history(mut self, history: &'a OhlcSeries) -> Self {
        self.history = Some(history);
        self
    }
}

/// Evaluate the tree and record every node's truth value.
pub fn evaluate_with_trace(
    conditions: &IndicatorConditions,
    ctx: &EvaluationContext,
    opts: EvaluateOptions<'_>,
) -> EvaluationResult {
    let mut eval = Evaluator::new(&conditions.root, ctx, opts);
    let result = eval.node(&conditions.root);
    eval.arm_actions(&conditions.root, true);
    debug!(result, nodes = eval.trace.len(), "tree evaluated");
    EvaluationResult {
        result,
        trace: eval.trace,
    }
}

pub fn evaluate(conditions: &IndicatorConditions, ctx: &EvaluationContext, opts: EvaluateOptions<'_>) -> bool {
    evaluate_with_trace(conditions, ctx, opts).result
}

struct Evaluator<'a> {
    ctx: &'a EvaluationContext,
    opts: EvaluateOptions<'a>,
    leaves: HashMap<&'a str, &'a IndicatorLeaf>,
    outputs: HashMap<&'a str, IndicatorOutputs>,
    trace: EvaluationTrace,
}

impl<'a> Evaluator<'a> {
    fn new(root: &'a ConditionNode, ctx: &'a EvaluationContext, opts: EvaluateOptions<'a>) -> Self {
        let mut leaves = HashMap::new();
        root.walk(&mut |node| {
            if let ConditionNode::Indicator(leaf) = node {
                leaves.entry(leaf.id.as_str()).or_insert(leaf);
            }
        });
        Self {
            ctx,
            opts,
            leaves,
            outputs: HashMap::new(),
            trace: BTreeMap::new(),
        }
    }

    fn node(&mut self, node: &'a ConditionNode) -> bool {
        let passed = match node {
            ConditionNode::Group(group) => self.group(group),
            ConditionNode::Indicator(leaf) => self.indicator(leaf),
            ConditionNode::Status(leaf) => status(leaf, self.ctx),
            ConditionNode::Candle(leaf) => candle(leaf, self.ctx),
            // only reached when an action is the root
            ConditionNode::Action(_) => false,
        };
        self.trace.insert(node.id().to_string(), passed);
        passed
    }

    fn group(&mut self, group: &'a GroupNode) -> bool {
        let mut results = Vec::with_capacity(group.children.len());
        for child in &group.children {
            if !matches!(child, ConditionNode::Action(_)) {
                results.push(self.node(child));
            }
        }
        group.operator.combine(results)
    }

    /// Record each action leaf as passed only when every enclosing group
    /// passed. Runs after the walk, once every group result is known.
    fn arm_actions(&mut self, node: &ConditionNode, armed: bool) {
        let ConditionNode::Group(group) = node else {
            return;
        };
        let armed = armed && self.trace.get(&group.id).copied().unwrap_or(false);
        for child in &group.children {
            match child {
                ConditionNode::Action(action) => {
                    self.trace.insert(action.id.clone(), armed);
                }
                ConditionNode::Group(_) => self.arm_actions(child, armed),
                _ => {}
            }
        }
    }

    fn indicator(&mut self, leaf: &'a IndicatorLeaf) -> bool {
        let overridden = self
            .opts
            .indicator_signals
            .and_then(|signals| signals.get(&leaf.id).copied());
        let signal = match (overridden, self.opts.history) {
            (Some(forced), _) => forced,
            (None, Some(history)) => leaf.indicator.spec.as_signal().signal(history),
            (None, None) => false,
        };
        let passed = signal && self.comparison(leaf);
        debug!(node = %leaf.id, kind = %leaf.indicator.kind(), signal, forced = overridden.is_some(), passed, "indicator leaf");
        passed
    }

    fn comparison(&mut self, leaf: &'a IndicatorLeaf) -> bool {
        let (comparator, right) = match &leaf.comparison {
            Comparison::None => return true,
            Comparison::Value { comparator, value } => (*comparator, Some(*value)),
            Comparison::Candle {
                comparator,
                field,
                reference,
            } => (*comparator, self.ctx.candle(*reference).map(|c| c.field(*field))),
            Comparison::Indicator {
                comparator,
                target_indicator_id,
                metric,
                reference,
            } => {
                if target_indicator_id == &leaf.id {
                    return false;
                }
                let Some(target) = self.leaves.get(target_indicator_id.as_str()).copied() else {
                    return false;
                };
                let back = usize::from(*reference == Some(CandleReference::Previous));
                let right = self.outputs(target).map(|out| last(out.metric(*metric), back));
                (*comparator, right)
            }
        };
        let left = self.outputs(leaf).map(|out| last(out.primary(), 0));
        match (left, right) {
            (Some(l), Some(r)) => comparator.compare(l, r),
            _ => false,
        }
    }

    fn outputs(&mut self, leaf: &'a IndicatorLeaf) -> Option<&IndicatorOutputs> {
        let history = self.opts.history?;
        Some(
            self.outputs
                .entry(leaf.id.as_str())
                .or_insert_with(|| leaf.indicator.spec.as_signal().outputs(history)),
        )
    }
}

fn status(leaf: &StatusLeaf, ctx: &EvaluationContext) -> bool {
    if leaf.comparator.is_none() {
        return false;
    }
    let reading = if leaf.metric.is_money() {
        ctx.status.money(leaf.metric).and_then(|money| match leaf.unit {
            Some(unit) if unit.asset() != Some(money.asset) => None,
            _ => Some(money.value),
        })
    } else {
        match leaf.unit {
            Some(unit) if leaf.metric.default_unit() == StatusUnit::Percent && unit != StatusUnit::Percent => None,
            _ => ctx.status.scalar(leaf.metric, leaf.unit),
        }
    };
    let passed = reading.is_some_and(|v| leaf.comparator.compare(v, leaf.value));
    debug!(node = %leaf.id, metric = ?leaf.metric, ?reading, passed, "status leaf");
    passed
}

fn candle(leaf: &CandleLeaf, ctx: &EvaluationContext) -> bool {
    let cond = &leaf.candle;
    if !cond.enabled {
        return false;
    }
    let Some(bar) = ctx.candle(cond.reference) else {
        return false;
    };
    let comparator = if cond.comparator.is_none() {
        Comparator::Over
    } else {
        cond.comparator
    };
    comparator.compare(bar.field(cond.field), cond.target_value)
}
