//! Canonicalization of condition trees.
//!
//! `normalize` is the contract boundary for stored trees. It guarantees:
//! 1. The root is a group (a leaf root is wrapped in an AND group)
//! 2. Every node has a non-empty id, unique within the tree
//! 3. Indicator comparisons only target existing indicator leaves other than
//!    themselves; anything else becomes `Comparison::None`
//! 4. Status leaves carry an explicit unit
//!
//! The operation is idempotent and never drops a node.

use std::collections::HashSet;

use tracing::warn;

use crate::model::{Comparison, ConditionNode, GroupNode, IndicatorConditions, LogicalOperator};

/// Normalize a whole rule set.
pub fn normalize(conditions: &IndicatorConditions) -> IndicatorConditions {
    IndicatorConditions::new(normalize_node(&conditions.root))
}

/// Normalize a tree rooted at `node`; the result is always a group.
pub fn normalize_node(node: &ConditionNode) -> ConditionNode {
    let mut root = ensure_group(node);
    fill_missing_ids(&mut root, "root");
    dedupe_ids(&mut root);
    sanitize_comparisons(&mut root);
    infer_units(&mut root);
    root
}

/// Wrap a non-group node in an AND group; groups are returned as-is.
pub fn ensure_group(node: &ConditionNode) -> ConditionNode {
    if node.is_group() {
        return node.clone();
    }
    let id = if node.id().is_empty() {
        "root".to_string()
    } else {
        format!("{}-group", node.id())
    };
    ConditionNode::Group(GroupNode {
        id,
        operator: LogicalOperator::And,
        children: vec![node.clone()],
    })
}

fn fill_missing_ids(node: &mut ConditionNode, path: &str) {
    if node.id().is_empty() {
        node.set_id(path.to_string());
    }
    if let ConditionNode::Group(g) = node {
        for (i, child) in g.children.iter_mut().enumerate() {
            fill_missing_ids(child, &format!("{path}-child-{i}"));
        }
    }
}

fn dedupe_ids(root: &mut ConditionNode) {
    let mut taken: HashSet<String> = HashSet::new();
    root.walk(&mut |n| {
        taken.insert(n.id().to_string());
    });
    let mut seen: HashSet<String> = HashSet::new();
    root.walk_mut(&mut |n| {
        let id = n.id().to_string();
        if seen.insert(id.clone()) {
            return;
        }
        let mut suffix = 2;
        let fresh = loop {
            let candidate = format!("{id}-{suffix}");
            if !taken.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        warn!(duplicate = %id, renamed = %fresh, "duplicate node id");
        taken.insert(fresh.clone());
        seen.insert(fresh.clone());
        n.set_id(fresh);
    });
}

fn sanitize_comparisons(root: &mut ConditionNode) {
    let mut indicator_ids: HashSet<String> = HashSet::new();
    root.walk(&mut |n| {
        if let ConditionNode::Indicator(leaf) = n {
            indicator_ids.insert(leaf.id.clone());
        }
    });
    root.walk_mut(&mut |n| {
        if let ConditionNode::Indicator(leaf) = n {
            if let Some(target) = leaf.comparison.target_id() {
                if target == leaf.id || !indicator_ids.contains(target) {
                    warn!(node = %leaf.id, target = %target, "dropping unresolvable indicator comparison");
                    leaf.comparison = Comparison::None;
                }
            }
        }
    });
}

fn infer_units(root: &mut ConditionNode) {
    root.walk_mut(&mut |n| {
        if let ConditionNode::Status(leaf) = n {
            if leaf.unit.is_none() {
                leaf.unit = Some(leaf.metric.default_unit());
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StatusMetric, StatusUnit};

    fn parse(json: &str) -> IndicatorConditions {
        IndicatorConditions::from_json(json).unwrap()
    }

    #[test]
    fn wraps_leaf_root() {
        let c = parse(r#"{"root":{"kind":"candle","id":"c","candle":{"enabled":true}}}"#);
        let n = normalize(&c);
        let root = n.root_group().unwrap();
        assert_eq!(root.id, "c-group");
        assert_eq!(root.operator, LogicalOperator::And);
        assert_eq!(root.children[0].id(), "c");
    }

    #[test]
    fn drops_self_and_dangling_comparisons() {
        let c = parse(
            r#"{"root":{"kind":"group","id":"r","children":[
                {"kind":"indicator","id":"a","indicator":{"type":"ma"},
                 "comparison":{"kind":"indicator","comparator":"over","targetIndicatorId":"a"}},
                {"kind":"indicator","id":"b","indicator":{"type":"rsi"},
                 "comparison":{"kind":"indicator","comparator":"over","targetIndicatorId":"gone"}},
                {"kind":"indicator","id":"c","indicator":{"type":"rsi"},
                 "comparison":{"kind":"indicator","comparator":"under","targetIndicatorId":"a"}}
            ]}}"#,
        );
        let n = normalize(&c);
        let comps: Vec<bool> = n
            .root
            .children()
            .iter()
            .map(|child| match child {
                ConditionNode::Indicator(leaf) => leaf.comparison.is_none(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(comps, vec![true, true, false]);
    }

    #[test]
    fn duplicate_ids_get_suffixes() {
        let c = parse(
            r#"{"root":{"kind":"group","id":"r","children":[
                {"kind":"candle","id":"x"},
                {"kind":"candle","id":"x"},
                {"kind":"candle","id":"x-2"}
            ]}}"#,
        );
        let n = normalize(&c);
        let ids: Vec<&str> = n.root.children().iter().map(ConditionNode::id).collect();
        assert_eq!(ids, vec!["x", "x-3", "x-2"]);
    }

    #[test]
    fn infers_status_units() {
        let c = parse(
            r#"{"root":{"kind":"group","id":"r","children":[
                {"kind":"status","id":"s","metric":"entryAge","comparator":"over","value":3}
            ]}}"#,
        );
        let n = normalize(&c);
        match &n.root.children()[0] {
            ConditionNode::Status(s) => {
                assert_eq!(s.metric, StatusMetric::EntryAge);
                assert_eq!(s.unit, Some(StatusUnit::Days));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn idempotent_on_messy_tree() {
        let c = parse(
            r#"{"root":{"kind":"group","children":[
                {"kind":"candle"},
                {"kind":"group","id":"root-child-0","children":[{"kind":"candle","id":"root"}]}
            ]}}"#,
        );
        let once = normalize(&c);
        assert_eq!(normalize(&once), once);
    }
}
