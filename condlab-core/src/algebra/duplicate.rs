//! Deep-clone a subtree with regenerated ids.
//!
//! The clone is inserted right after the original. Every node id in the clone
//! is fresh, and so is every indicator entry id. The old→new node id map is
//! returned; comparisons are never re-pointed, neither those targeting the
//! original nor those inside the clone.

use std::collections::BTreeMap;

use crate::domain::{IdSource, INDICATOR_PREFIX, NODE_PREFIX};
use crate::model::ConditionNode;

use super::movement::{find_node, find_parent};

/// Result of a duplicate operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Duplication {
    pub tree: ConditionNode,
    pub new_id: String,
    pub id_map: BTreeMap<String, String>,
}

/// Duplicate the indicator leaf `id`. `None` if it is not an indicator leaf
/// with a parent.
pub fn duplicate_indicator<S: IdSource>(tree: &ConditionNode, id: &str, ids: &mut S) -> Option<Duplication> {
    match find_node(tree, id)? {
        ConditionNode::Indicator(_) => duplicate_subtree(tree, id, ids),
        _ => None,
    }
}

/// Duplicate the group `id` (not the root).
pub fn duplicate_group<S: IdSource>(tree: &ConditionNode, id: &str, ids: &mut S) -> Option<Duplication> {
    match find_node(tree, id)? {
        ConditionNode::Group(_) => duplicate_subtree(tree, id, ids),
        _ => None,
    }
}

fn duplicate_subtree<S: IdSource>(tree: &ConditionNode, id: &str, ids: &mut S) -> Option<Duplication> {
    let (parent_id, index) = find_parent(tree, id)?;
    let parent_id = parent_id.to_string();
    let mut clone = find_node(tree, id)?.clone();
    let mut id_map = BTreeMap::new();
    clone.walk_mut(&mut |n| {
        let fresh = ids.next_id(NODE_PREFIX);
        id_map.insert(n.id().to_string(), fresh.clone());
        n.set_id(fresh);
        if let ConditionNode::Indicator(leaf) = n {
            leaf.indicator.id = ids.next_id(INDICATOR_PREFIX);
        }
    });
    let new_id = clone.id().to_string();

    let mut out = tree.clone();
    let mut pending = Some(clone);
    out.walk_mut(&mut |n| {
        let Some(g) = n.as_group_mut() else { return };
        if g.id != parent_id {
            return;
        }
        if let Some(clone) = pending.take() {
            g.children.insert(index + 1, clone);
        }
    });
    Some(Duplication { tree: out, new_id, id_map })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeededIds;
    use crate::model::{Comparison, IndicatorConditions};

    fn tree() -> ConditionNode {
        IndicatorConditions::from_json(
            r#"{"root":{"kind":"group","id":"r","children":[
                {"kind":"group","id":"g","children":[
                    {"kind":"indicator","id":"a","indicator":{"id":"ea","type":"ma"}},
                    {"kind":"indicator","id":"b","indicator":{"id":"eb","type":"rsi"},
                     "comparison":{"kind":"indicator","comparator":"over","targetIndicatorId":"a"}}
                ]},
                {"kind":"candle","id":"c"}
            ]}}"#,
        )
        .unwrap()
        .root
    }

    #[test]
    fn indicator_clone_lands_after_original() {
        let t = tree();
        let mut ids = SeededIds::new(9);
        let dup = duplicate_indicator(&t, "a", &mut ids).unwrap();
        let g = find_node(&dup.tree, "g").unwrap();
        let order: Vec<&str> = g.children().iter().map(ConditionNode::id).collect();
        assert_eq!(order, vec!["a", dup.new_id.as_str(), "b"]);
        assert_eq!(dup.id_map.get("a"), Some(&dup.new_id));
        match find_node(&dup.tree, &dup.new_id).unwrap() {
            ConditionNode::Indicator(leaf) => assert_ne!(leaf.indicator.id, "ea"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn group_clone_keeps_comparison_targets() {
        let t = tree();
        let mut ids = SeededIds::new(9);
        let dup = duplicate_group(&t, "g", &mut ids).unwrap();
        assert_eq!(dup.id_map.len(), 3);
        let new_b = &dup.id_map["b"];
        match find_node(&dup.tree, new_b).unwrap() {
            ConditionNode::Indicator(leaf) => {
                assert!(matches!(&leaf.comparison, Comparison::Indicator { target_indicator_id, .. } if target_indicator_id == "a"));
            }
            other => panic!("unexpected {other:?}"),
        }
        let order: Vec<&str> = dup.tree.children().iter().map(ConditionNode::id).collect();
        assert_eq!(order, vec!["g", dup.new_id.as_str(), "c"]);
    }

    #[test]
    fn wrong_kind_or_root_is_none() {
        let t = tree();
        let mut ids = SeededIds::new(9);
        assert!(duplicate_indicator(&t, "g", &mut ids).is_none());
        assert!(duplicate_group(&t, "a", &mut ids).is_none());
        assert!(duplicate_group(&t, "r", &mut ids).is_none());
        assert!(duplicate_indicator(&t, "zzz", &mut ids).is_none());
    }
}
