//! Tree algebra: pure operations that take a tree and return a new one.
//!
//! None of these functions fail. Requests that cannot apply (unknown ids,
//! cycles, wrong node kinds) leave the tree unchanged.

pub mod collect;
pub mod duplicate;
pub mod edit;
pub mod movement;
pub mod normalize;

pub use collect::{
    collect_action_nodes, collect_candle_nodes, collect_group_nodes, collect_ids,
    collect_indicator_nodes, collect_status_nodes,
};
pub use duplicate::{duplicate_group, duplicate_indicator, Duplication};
pub use edit::{
    insert_child, remove_node, replace_candle_node, replace_group_children,
    replace_group_operator, replace_indicator_node,
};
pub use movement::{
    find_node, find_parent, is_descendant, move_node, move_node_relative, move_node_to_group,
    MoveDirection, RelativePosition,
};
pub use normalize::{ensure_group, normalize, normalize_node};
