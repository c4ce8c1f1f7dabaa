//! Id-addressed structural edits. Each function returns a new tree and
//! leaves the input untouched; an unknown id is a no-op.

use crate::model::{CandleLeaf, ConditionNode, IndicatorLeaf, LogicalOperator};

/// Append `child` to the children of group `group_id`.
pub fn insert_child(tree: &ConditionNode, group_id: &str, child: ConditionNode) -> ConditionNode {
    let mut out = tree.clone();
    let mut pending = Some(child);
    out.walk_mut(&mut |n| {
        if let ConditionNode::Group(g) = n {
            if g.id == group_id {
                if let Some(child) = pending.take() {
                    g.children.push(child);
                }
            }
        }
    });
    out
}

/// Remove the node `node_id` and its subtree.
///
/// Returns `None` when `node_id` is the root itself. Parents left empty are
/// kept. A missing id yields an unchanged copy.
pub fn remove_node(tree: &ConditionNode, node_id: &str) -> Option<ConditionNode> {
    if tree.id() == node_id {
        return None;
    }
    let mut out = tree.clone();
    out.walk_mut(&mut |n| {
        if let ConditionNode::Group(g) = n {
            g.children.retain(|c| c.id() != node_id);
        }
    });
    Some(out)
}

/// Replace the indicator leaf `id` with `updater(leaf)`.
pub fn replace_indicator_node(
    tree: &ConditionNode,
    id: &str,
    mut updater: impl FnMut(&IndicatorLeaf) -> IndicatorLeaf,
) -> ConditionNode {
    let mut out = tree.clone();
    out.walk_mut(&mut |n| {
        if let ConditionNode::Indicator(leaf) = n {
            if leaf.id == id {
                *leaf = updater(leaf);
            }
        }
    });
    out
}

/// Replace the candle leaf `id` with `updater(leaf)`.
pub fn replace_candle_node(
    tree: &ConditionNode,
    id: &str,
    mut updater: impl FnMut(&CandleLeaf) -> CandleLeaf,
) -> ConditionNode {
    let mut out = tree.clone();
    out.walk_mut(&mut |n| {
        if let ConditionNode::Candle(leaf) = n {
            if leaf.id == id {
                *leaf = updater(leaf);
            }
        }
    });
    out
}

pub fn replace_group_operator(tree: &ConditionNode, group_id: &str, operator: LogicalOperator) -> ConditionNode {
    let mut out = tree.clone();
    out.walk_mut(&mut |n| {
        if let ConditionNode::Group(g) = n {
            if g.id == group_id {
                g.operator = operator;
            }
        }
    });
    out
}

/// Swap the whole child list of group `group_id`.
pub fn replace_group_children(tree: &ConditionNode, group_id: &str, children: Vec<ConditionNode>) -> ConditionNode {
    let mut out = tree.clone();
    let mut pending = Some(children);
    out.walk_mut(&mut |n| {
        if let ConditionNode::Group(g) = n {
            if g.id == group_id {
                if let Some(children) = pending.take() {
                    g.children = children;
                }
            }
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::normalize_node;
    use crate::model::{Comparator, ConditionNode, IndicatorConditions};

    fn tree() -> ConditionNode {
        IndicatorConditions::from_json(
            r#"{"root":{"kind":"group","id":"r","operator":"or","children":[
                {"kind":"group","id":"g1","children":[
                    {"kind":"indicator","id":"ma","indicator":{"id":"e","type":"ma"}}
                ]},
                {"kind":"candle","id":"c","candle":{"enabled":true,"targetValue":100}}
            ]}}"#,
        )
        .unwrap()
        .root
    }

    #[test]
    fn insert_then_remove_restores() {
        let t = normalize_node(&tree());
        let leaf = ConditionNode::Candle(CandleLeaf {
            id: "new".into(),
            ..CandleLeaf::default()
        });
        let inserted = insert_child(&t, "g1", leaf);
        assert_eq!(inserted.node_count(), t.node_count() + 1);
        assert_eq!(remove_node(&inserted, "new").unwrap(), t);
    }

    #[test]
    fn insert_into_missing_group_is_noop() {
        let t = tree();
        let leaf = ConditionNode::Candle(CandleLeaf::default());
        assert_eq!(insert_child(&t, "nope", leaf.clone()), t);
        assert_eq!(insert_child(&t, "c", leaf), t);
    }

    #[test]
    fn remove_keeps_empty_group_and_refuses_root() {
        let t = tree();
        let out = remove_node(&t, "ma").unwrap();
        assert!(out.children()[0].children().is_empty());
        assert!(remove_node(&t, "r").is_none());
        assert_eq!(remove_node(&t, "missing").unwrap(), t);
    }

    #[test]
    fn targeted_replacements() {
        let t = tree();
        let out = replace_candle_node(&t, "c", |leaf| {
            let mut leaf = leaf.clone();
            leaf.candle.comparator = Comparator::Under;
            leaf
        });
        match &out.children()[1] {
            ConditionNode::Candle(c) => assert_eq!(c.candle.comparator, Comparator::Under),
            other => panic!("unexpected {other:?}"),
        }
        let out = replace_group_operator(&out, "g1", LogicalOperator::Or);
        assert_eq!(out.children()[0].as_group().unwrap().operator, LogicalOperator::Or);
        // original untouched
        assert_eq!(t.children()[0].as_group().unwrap().operator, LogicalOperator::And);
    }

    #[test]
    fn replace_children_swaps_list() {
        let t = tree();
        let out = replace_group_children(&t, "g1", Vec::new());
        assert!(out.children()[0].children().is_empty());
        assert_eq!(out.children()[1], t.children()[1]);
    }
}
