//! Tree-wide invariant restoration.

use std::sync::Arc;

use crate::config::GridConfig;
use crate::node::{GridBranch, GridNode, GridState};

/// Collapse degenerate branches and re-establish the size invariant.
///
/// Bottom-up: children are normalized first, empty branches are dropped,
/// and a branch left with one child is replaced by that child carrying the
/// branch's own share. Any subtree that needed no change is returned as the
/// same allocation, so an already normal grid comes back [`GridState::ptr_eq`]
/// to the input and the pass is idempotent.
#[must_use]
pub fn normalize_grid(state: &GridState) -> GridState {
    normalize_grid_with(state, &GridConfig::default())
}

/// [`normalize_grid`] with an explicit size tolerance.
#[must_use]
pub fn normalize_grid_with(state: &GridState, config: &GridConfig) -> GridState {
    let root = normalize_node(&state.root, config);
    if Arc::ptr_eq(&root, &state.root) {
        state.clone()
    } else {
        state.with_root(root)
    }
}

pub(crate) fn normalize_node(node: &Arc<GridNode>, config: &GridConfig) -> Arc<GridNode> {
    let GridNode::Branch(branch) = node.as_ref() else {
        return Arc::clone(node);
    };

    let mut changed = false;
    let mut children = Vec::with_capacity(branch.children.len());
    let mut sizes = Vec::with_capacity(branch.children.len());
    for (idx, child) in branch.children.iter().enumerate() {
        let normalized = normalize_node(child, config);
        if !Arc::ptr_eq(&normalized, child) {
            changed = true;
        }
        if normalized.as_branch().is_some_and(|b| b.children.is_empty()) {
            changed = true;
            continue;
        }
        let share = branch
            .sizes
            .get(idx)
            .copied()
            .unwrap_or_else(|| normalized.size());
        sizes.push(share);
        children.push(normalized);
    }

    match children.len() {
        // An empty root has nothing to promote; keep it for the report.
        0 if !changed => return Arc::clone(node),
        0 => {
            return Arc::new(GridNode::Branch(GridBranch {
                orientation: branch.orientation,
                children,
                size: branch.size,
                sizes: Vec::new(),
            }));
        }
        1 => return GridNode::with_size(&children[0], branch.size),
        _ => {}
    }

    let drifted = branch.sizes.len() != branch.children.len()
        || !config.sums_to_full(sizes.iter().sum())
        || children
            .iter()
            .zip(&sizes)
            .any(|(child, share)| (child.size() - share).abs() > config.size_tolerance);

    if !changed && !drifted {
        return Arc::clone(node);
    }
    Arc::new(GridNode::Branch(GridBranch::from_parts(
        branch.orientation,
        children,
        &sizes,
        branch.size,
    )))
}
