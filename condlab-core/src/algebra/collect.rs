//! Document-order flattening traversals.

use crate::model::{ActionLeaf, CandleLeaf, ConditionNode, GroupNode, IndicatorLeaf, StatusLeaf};

pub fn collect_indicator_nodes(tree: &ConditionNode) -> Vec<&IndicatorLeaf> {
    let mut out = Vec::new();
    tree.walk(&mut |n| {
        if let ConditionNode::Indicator(leaf) = n {
            out.push(leaf);
        }
    });
    out
}

pub fn collect_group_nodes(tree: &ConditionNode) -> Vec<&GroupNode> {
    let mut out = Vec::new();
    tree.walk(&mut |n| {
        if let ConditionNode::Group(g) = n {
            out.push(g);
        }
    });
    out
}

pub fn collect_status_nodes(tree: &ConditionNode) -> Vec<&StatusLeaf> {
    let mut out = Vec::new();
    tree.walk(&mut |n| {
        if let ConditionNode::Status(leaf) = n {
            out.push(leaf);
        }
    });
    out
}

pub fn collect_candle_nodes(tree: &ConditionNode) -> Vec<&CandleLeaf> {
    let mut out = Vec::new();
    tree.walk(&mut |n| {
        if let ConditionNode::Candle(leaf) = n {
            out.push(leaf);
        }
    });
    out
}

pub fn collect_action_nodes(tree: &ConditionNode) -> Vec<&ActionLeaf> {
    let mut out = Vec::new();
    tree.walk(&mut |n| {
        if let ConditionNode::Action(leaf) = n {
            out.push(leaf);
        }
    });
    out
}

/// Every node id, pre-order.
pub fn collect_ids(tree: &ConditionNode) -> Vec<&str> {
    let mut out = Vec::new();
    tree.walk(&mut |n| out.push(n.id()));
    out
}
