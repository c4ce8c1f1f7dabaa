//! Lookup and relocation of nodes.
//!
//! Moves are total: any request that cannot be honored (unknown ids, moving
//! the root, moving a group beneath itself) returns the tree unchanged.

use serde::{Deserialize, Serialize};

use crate::model::ConditionNode;

/// Sibling reorder direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Drop position relative to a target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelativePosition {
    Before,
    After,
}

pub fn find_node<'a>(tree: &'a ConditionNode, id: &str) -> Option<&'a ConditionNode> {
    if tree.id() == id {
        return Some(tree);
    }
    tree.children().iter().find_map(|c| find_node(c, id))
}

/// Parent group id and index of `id` within it.
pub fn find_parent<'a>(tree: &'a ConditionNode, id: &str) -> Option<(&'a str, usize)> {
    let group = tree.as_group()?;
    if let Some(index) = group.children.iter().position(|c| c.id() == id) {
        return Some((&group.id, index));
    }
    group.children.iter().find_map(|c| find_parent(c, id))
}

/// True when `node_id` lies strictly below group `ancestor_id`.
pub fn is_descendant(tree: &ConditionNode, ancestor_id: &str, node_id: &str) -> bool {
    match find_node(tree, ancestor_id) {
        Some(ancestor) if ancestor.is_group() => ancestor
            .children()
            .iter()
            .any(|c| find_node(c, node_id).is_some()),
        _ => false,
    }
}

/// Swap `id` with its previous or next sibling.
pub fn move_node(tree: &ConditionNode, id: &str, direction: MoveDirection) -> ConditionNode {
    let mut out = tree.clone();
    let Some((parent_id, index)) = find_parent(tree, id) else {
        return out;
    };
    let parent_id = parent_id.to_string();
    out.walk_mut(&mut |n| {
        let Some(g) = n.as_group_mut() else { return };
        if g.id != parent_id {
            return;
        }
        let other = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1).filter(|&i| i < g.children.len()),
        };
        if let Some(other) = other {
            g.children.swap(index, other);
        }
    });
    out
}

/// Detach `id` and append it to group `dest_group_id`.
pub fn move_node_to_group(tree: &ConditionNode, id: &str, dest_group_id: &str) -> ConditionNode {
    if id == dest_group_id || tree.id() == id {
        return tree.clone();
    }
    let dest_is_group = find_node(tree, dest_group_id).is_some_and(ConditionNode::is_group);
    if !dest_is_group || is_descendant(tree, id, dest_group_id) {
        return tree.clone();
    }
    let Some((moving, detached)) = detach(tree, id) else {
        return tree.clone();
    };
    super::edit::insert_child(&detached, dest_group_id, moving)
}

/// Drag-and-drop move: place `source_id` before or after `target_id`,
/// possibly in a different group.
pub fn move_node_relative(
    tree: &ConditionNode,
    source_id: &str,
    target_id: &str,
    position: RelativePosition,
) -> ConditionNode {
    if source_id == target_id || tree.id() == source_id {
        return tree.clone();
    }
    let (Some(_), Some((target_parent, _))) = (find_parent(tree, source_id), find_parent(tree, target_id)) else {
        return tree.clone();
    };
    if is_descendant(tree, source_id, target_id) {
        return tree.clone();
    }
    let target_parent = target_parent.to_string();
    let Some((moving, mut out)) = detach(tree, source_id) else {
        return tree.clone();
    };
    // Looked up after detaching so a same-parent shift is already applied.
    let Some((_, target_index)) = find_parent(&out, target_id) else {
        return tree.clone();
    };
    let insert_at = match position {
        RelativePosition::Before => target_index,
        RelativePosition::After => target_index + 1,
    };
    let mut pending = Some(moving);
    out.walk_mut(&mut |n| {
        let Some(g) = n.as_group_mut() else { return };
        if g.id != target_parent {
            return;
        }
        if let Some(moving) = pending.take() {
            let at = insert_at.min(g.children.len());
            g.children.insert(at, moving);
        }
    });
    out
}

/// Remove `id` from the tree and return it alongside the remaining tree.
fn detach(tree: &ConditionNode, id: &str) -> Option<(ConditionNode, ConditionNode)> {
    let moving = find_node(tree, id)?.clone();
    let remaining = super::edit::remove_node(tree, id)?;
    Some((moving, remaining))
}
