//! Location addressing and leaf lookup.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::node::{GridBranch, GridLeaf, GridNode, GridState, Location};

/// Walk `location` from the root.
///
/// Returns `None` when an index is out of range or the path tries to descend
/// into a leaf.
#[must_use]
pub fn find_node_at_location<'a>(state: &'a GridState, location: &[usize]) -> Option<&'a GridNode> {
    resolve(&state.root, location).map(Arc::as_ref)
}

/// Split a location into the parent path and the index within the parent.
///
/// The root location has no parent and yields `None`.
#[must_use]
pub fn tail(location: &[usize]) -> Option<(&[usize], usize)> {
    let (last, parent) = location.split_last()?;
    Some((parent, *last))
}

/// Current location of the leaf carrying `group_id`.
#[must_use]
pub fn find_leaf_location(state: &GridState, group_id: &str) -> Option<Location> {
    fn search(node: &GridNode, group_id: &str, path: &mut Location) -> bool {
        match node {
            GridNode::Leaf(leaf) => leaf.group_id == group_id,
            GridNode::Branch(branch) => {
                for (idx, child) in branch.children.iter().enumerate() {
                    path.push(idx);
                    if search(child, group_id, path) {
                        return true;
                    }
                    path.pop();
                }
                false
            }
        }
    }

    let mut path = Vec::new();
    search(&state.root, group_id, &mut path).then_some(path)
}

/// Every leaf with its location, in depth-first order.
#[must_use]
pub fn leaves(state: &GridState) -> Vec<(Location, &GridLeaf)> {
    fn collect<'a>(node: &'a GridNode, path: &mut Location, out: &mut Vec<(Location, &'a GridLeaf)>) {
        match node {
            GridNode::Leaf(leaf) => out.push((path.clone(), leaf)),
            GridNode::Branch(branch) => {
                for (idx, child) in branch.children.iter().enumerate() {
                    path.push(idx);
                    collect(child, path, out);
                    path.pop();
                }
            }
        }
    }

    let mut out = Vec::new();
    collect(&state.root, &mut Vec::new(), &mut out);
    out
}

/// Set of all group ids present in the grid.
#[must_use]
pub fn all_group_ids(state: &GridState) -> BTreeSet<String> {
    leaves(state)
        .into_iter()
        .map(|(_, leaf)| leaf.group_id.clone())
        .collect()
}

/// Number of leaves in the grid.
#[must_use]
pub fn leaf_count(state: &GridState) -> usize {
    fn count(node: &GridNode) -> usize {
        match node {
            GridNode::Leaf(_) => 1,
            GridNode::Branch(branch) => branch.children.iter().map(|child| count(child)).sum(),
        }
    }
    count(&state.root)
}

pub(crate) fn resolve<'a>(node: &'a Arc<GridNode>, location: &[usize]) -> Option<&'a Arc<GridNode>> {
    let mut current = node;
    for &idx in location {
        let GridNode::Branch(branch) = current.as_ref() else {
            return None;
        };
        current = branch.children.get(idx)?;
    }
    Some(current)
}

/// Path-copy update: rebuild every branch from `node` down to `location`,
/// replacing the node found there with the result of `edit`.
///
/// Siblings along the way are reused by reference. Returns `None` if the
/// location does not resolve or `edit` declines.
pub(crate) fn replace_at<F>(node: &Arc<GridNode>, location: &[usize], edit: F) -> Option<Arc<GridNode>>
where
    F: FnOnce(&Arc<GridNode>) -> Option<Arc<GridNode>>,
{
    let Some((&idx, rest)) = location.split_first() else {
        return edit(node);
    };
    let GridNode::Branch(branch) = node.as_ref() else {
        return None;
    };
    let child = branch.children.get(idx)?;
    let replaced = replace_at(child, rest, edit)?;
    Some(Arc::new(GridNode::Branch(GridBranch::with_child(
        branch, idx, replaced,
    ))))
}

/// Whether `ancestor` is a strict prefix of `descendant`.
pub(crate) fn is_strict_prefix(ancestor: &[usize], descendant: &[usize]) -> bool {
    ancestor.len() < descendant.len() && descendant.starts_with(ancestor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{FULL_SIZE, Orientation};

    fn leaf(id: &str, size: f64) -> Arc<GridNode> {
        Arc::new(GridNode::leaf(id, size))
    }

    /// `H[a, V[b, c]]`
    fn nested() -> GridState {
        let inner = GridNode::Branch(GridBranch::from_children(
            Orientation::Vertical,
            vec![leaf("b", 50.0), leaf("c", 50.0)],
            50.0,
        ));
        GridState::from_root(GridNode::Branch(GridBranch::from_children(
            Orientation::Horizontal,
            vec![leaf("a", 50.0), Arc::new(inner)],
            FULL_SIZE,
        )))
    }

    #[test]
    fn root_location_resolves_root() {
        let state = nested();
        assert!(find_node_at_location(&state, &[]).is_some_and(|node| !node.is_leaf()));
    }

    #[test]
    fn nested_location_resolves_leaf() {
        let state = nested();
        let node = find_node_at_location(&state, &[1, 1]).expect("c exists");
        assert_eq!(node.as_leaf().map(|leaf| leaf.group_id.as_str()), Some("c"));
    }

    #[test]
    fn out_of_range_and_through_leaf_are_none() {
        let state = nested();
        assert!(find_node_at_location(&state, &[2]).is_none());
        assert!(find_node_at_location(&state, &[0, 0]).is_none());
        assert!(find_node_at_location(&state, &[99, 99]).is_none());
    }

    #[test]
    fn tail_splits_parent_and_index() {
        assert_eq!(tail(&[]), None);
        assert_eq!(tail(&[3]), Some((&[][..], 3)));
        assert_eq!(tail(&[1, 0, 2]), Some((&[1, 0][..], 2)));
    }

    #[test]
    fn leaf_lookup_by_group() {
        let state = nested();
        assert_eq!(find_leaf_location(&state, "a"), Some(vec![0]));
        assert_eq!(find_leaf_location(&state, "c"), Some(vec![1, 1]));
        assert_eq!(find_leaf_location(&state, "zzz"), None);
    }

    #[test]
    fn leaves_in_depth_first_order() {
        let state = nested();
        let found: Vec<(Location, String)> = leaves(&state)
            .into_iter()
            .map(|(path, leaf)| (path, leaf.group_id.clone()))
            .collect();
        assert_eq!(
            found,
            vec![
                (vec![0], "a".to_string()),
                (vec![1, 0], "b".to_string()),
                (vec![1, 1], "c".to_string()),
            ]
        );
        assert_eq!(leaf_count(&state), 3);
        assert_eq!(all_group_ids(&state).len(), 3);
    }

    #[test]
    fn replace_at_shares_untouched_siblings() {
        let state = nested();
        let replaced = replace_at(&state.root, &[1, 0], |_| Some(leaf("x", 0.0)))
            .expect("location resolves");
        let before = state.root.as_branch().expect("branch root");
        let after = replaced.as_branch().expect("branch root");
        assert!(Arc::ptr_eq(&before.children[0], &after.children[0]));
        let inner = after.children[1].as_branch().expect("inner branch");
        assert_eq!(inner.children[0].as_leaf().map(|l| l.group_id.as_str()), Some("x"));
        // The replacement inherits the slot's share.
        assert_eq!(inner.children[0].size(), 50.0);
        assert!(Arc::ptr_eq(&inner.children[1], &state.root.children()[1].children()[1]));
    }

    #[test]
    fn replace_at_rejects_bad_paths() {
        let state = nested();
        assert!(replace_at(&state.root, &[5], |node| Some(Arc::clone(node))).is_none());
        assert!(replace_at(&state.root, &[0, 1], |node| Some(Arc::clone(node))).is_none());
    }

    #[test]
    fn strict_prefix() {
        assert!(is_strict_prefix(&[], &[0]));
        assert!(is_strict_prefix(&[1], &[1, 0]));
        assert!(!is_strict_prefix(&[1], &[1]));
        assert!(!is_strict_prefix(&[1, 0], &[1]));
        assert!(!is_strict_prefix(&[0], &[1, 0]));
    }
}
