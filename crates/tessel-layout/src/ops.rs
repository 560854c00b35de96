//! Structural grid mutations.
//!
//! Every primitive comes in two flavours:
//!
//! - `try_*` returns `Result<GridState, GridOpError>` and says why a request
//!   was rejected.
//! - The plain form (`add_view_to_grid`, `remove_view_from_grid`, ...) never
//!   fails. A rejected request hands back a clone of the input that is
//!   [`GridState::ptr_eq`] to it, so callers can fire speculative operations
//!   computed from stale UI state without validating them first.
//!
//! Inputs are never mutated. Successful operations rebuild only the path from
//! the edited node to the root.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::location::{find_leaf_location, is_strict_prefix, replace_at, resolve, tail};
use crate::node::{Direction, GridBranch, GridNode, GridState, HALF_SIZE, Location};
use crate::normalize::normalize_grid_with;

/// Stable operation discriminator used in logs and journals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridOperationKind {
    AddView,
    RemoveView,
    MoveView,
    ResizeView,
    SetMaximized,
    Normalize,
}

/// Structured reasons for rejecting a grid operation.
#[derive(Debug, Clone, PartialEq)]
pub enum GridOpError {
    /// No node lives at the location.
    MissingNode { location: Location },
    /// The parent path of the location does not resolve.
    MissingParent { location: Location },
    /// The last index of the location is past the parent's children.
    IndexOutOfRange { location: Location, len: usize },
    /// The parent of the location is a leaf where a branch was required.
    ParentNotBranch { location: Location },
    /// The operation only applies to leaves.
    NodeNotLeaf { location: Location },
    /// The root view can never be removed.
    CannotRemoveRoot,
    /// The root has no parent to move out of.
    CannotMoveRoot,
    /// The root has no sibling shares to resize against.
    CannotResizeRoot,
    /// The root of a split grid cannot take a new view here.
    RootDockingDisabled,
    /// Source and target are the same node.
    SameNode { location: Location },
    /// The target contains the source.
    AncestorConflict {
        ancestor: Location,
        descendant: Location,
    },
    /// Shares must be finite and non-negative.
    InvalidSize { size: f64 },
}

impl fmt::Display for GridOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNode { location } => write!(f, "no node at location {location:?}"),
            Self::MissingParent { location } => {
                write!(f, "parent of location {location:?} does not resolve")
            }
            Self::IndexOutOfRange { location, len } => write!(
                f,
                "location {location:?} is out of range for a parent with {len} children"
            ),
            Self::ParentNotBranch { location } => {
                write!(f, "parent of location {location:?} is not a branch")
            }
            Self::NodeNotLeaf { location } => write!(f, "node at {location:?} is not a leaf"),
            Self::CannotRemoveRoot => write!(f, "cannot remove the root view"),
            Self::CannotMoveRoot => write!(f, "cannot move the root view"),
            Self::CannotResizeRoot => write!(f, "cannot resize the root view"),
            Self::RootDockingDisabled => {
                write!(f, "inserting at the root of a split grid is disabled")
            }
            Self::SameNode { location } => {
                write!(f, "source and target are both {location:?}")
            }
            Self::AncestorConflict {
                ancestor,
                descendant,
            } => write!(f, "target {ancestor:?} contains source {descendant:?}"),
            Self::InvalidSize { size } => {
                write!(f, "invalid size {size}: must be finite and >= 0")
            }
        }
    }
}

impl std::error::Error for GridOpError {}

/// Insert a leaf for `group_id` next to the node at `location`.
///
/// Returns the input unchanged if the request cannot be applied.
#[must_use]
pub fn add_view_to_grid(
    state: &GridState,
    group_id: impl Into<String>,
    location: &[usize],
    direction: Direction,
    size: Option<f64>,
) -> GridState {
    try_add_view(
        state,
        group_id,
        location,
        direction,
        size,
        &GridConfig::default(),
    )
    .unwrap_or_else(|err| rejected(state, GridOperationKind::AddView, &err))
}

/// Remove the node at `location`, promoting a lone surviving sibling.
#[must_use]
pub fn remove_view_from_grid(state: &GridState, location: &[usize]) -> GridState {
    try_remove_view(state, location, &GridConfig::default())
        .unwrap_or_else(|err| rejected(state, GridOperationKind::RemoveView, &err))
}

/// Reorder a leaf within its branch, or relocate it next to another node.
#[must_use]
pub fn move_view_in_grid(
    state: &GridState,
    from: &[usize],
    to: &[usize],
    direction: Direction,
) -> GridState {
    try_move_view(state, from, to, direction, &GridConfig::default())
        .unwrap_or_else(|err| rejected(state, GridOperationKind::MoveView, &err))
}

/// Set the share of the node at `location` and rescale its siblings.
#[must_use]
pub fn resize_leaf(state: &GridState, location: &[usize], new_size: f64) -> GridState {
    try_resize_leaf(state, location, new_size, &GridConfig::default())
        .unwrap_or_else(|err| rejected(state, GridOperationKind::ResizeView, &err))
}

/// Set or clear the maximized flag of the leaf at `location`.
#[must_use]
pub fn set_leaf_maximized(state: &GridState, location: &[usize], maximized: bool) -> GridState {
    try_set_leaf_maximized(state, location, maximized)
        .unwrap_or_else(|err| rejected(state, GridOperationKind::SetMaximized, &err))
}

/// Fallible form of [`add_view_to_grid`].
///
/// Placement rules:
/// - root location on a leaf root: wrap root and new leaf in a `[50, 50]`
///   branch along the direction's axis.
/// - root location on a branch root: dock at the workspace edge (see
///   [`GridConfig::dock_at_root`]).
/// - parent branch with the direction's axis: splice the new leaf before or
///   after the target and renormalize the branch.
/// - parent branch with the other axis: wrap the target and the new leaf in
///   a `[50, 50]` branch that takes over the target's share.
/// - parent resolves to a leaf: wrap that leaf the same way.
pub fn try_add_view(
    state: &GridState,
    group_id: impl Into<String>,
    location: &[usize],
    direction: Direction,
    size: Option<f64>,
    config: &GridConfig,
) -> Result<GridState, GridOpError> {
    let size = size.unwrap_or(config.default_insert_size);
    check_size(size)?;
    let incoming = Arc::new(GridNode::leaf(group_id, size));

    let Some((parent_path, index)) = tail(location) else {
        let root = dock_at_root(&state.root, incoming, direction, config)?;
        return Ok(state.with_root(root));
    };

    let parent = resolve(&state.root, parent_path).ok_or_else(|| GridOpError::MissingParent {
        location: location.to_vec(),
    })?;

    let replacement = match parent.as_ref() {
        GridNode::Leaf(_) => wrap_pair(parent, incoming, direction),
        GridNode::Branch(branch) => {
            let target = branch
                .children
                .get(index)
                .ok_or_else(|| GridOpError::IndexOutOfRange {
                    location: location.to_vec(),
                    len: branch.children.len(),
                })?;
            if branch.orientation == direction.orientation() {
                let at = if direction.inserts_before() {
                    index
                } else {
                    index + 1
                };
                Arc::new(GridNode::Branch(splice(branch, at, incoming, size)))
            } else {
                let wrapped = wrap_pair(target, incoming, direction);
                Arc::new(GridNode::Branch(branch.with_child(index, wrapped)))
            }
        }
    };

    let root = replace_at(&state.root, parent_path, |_| Some(replacement)).ok_or_else(|| {
        GridOpError::MissingParent {
            location: location.to_vec(),
        }
    })?;
    Ok(state.with_root(root))
}

/// Fallible form of [`remove_view_from_grid`].
///
/// A branch left with one child is replaced by that child, which takes over
/// the branch's own share in the grandparent. The whole tree is normalized
/// afterwards.
pub fn try_remove_view(
    state: &GridState,
    location: &[usize],
    config: &GridConfig,
) -> Result<GridState, GridOpError> {
    let (parent_path, index) = tail(location).ok_or(GridOpError::CannotRemoveRoot)?;
    let parent = parent_branch(state, location, parent_path, index)?;

    let mut children = parent.children.clone();
    let mut sizes = current_shares(parent);
    children.remove(index);
    sizes.remove(index);

    let replacement = match children.len() {
        0 => Arc::new(GridNode::Branch(GridBranch {
            orientation: parent.orientation,
            children,
            size: parent.size,
            sizes: Vec::new(),
        })),
        1 => GridNode::with_size(&children[0], parent.size),
        _ => Arc::new(GridNode::Branch(GridBranch::from_parts(
            parent.orientation,
            children,
            &sizes,
            parent.size,
        ))),
    };

    let root = replace_at(&state.root, parent_path, |_| Some(replacement)).ok_or_else(|| {
        GridOpError::MissingParent {
            location: location.to_vec(),
        }
    })?;
    Ok(normalize_grid_with(&state.with_root(root), config))
}

/// Fallible form of [`move_view_in_grid`].
///
/// Only leaves move. When `from` and `to` share a parent the leaf and its
/// share are taken out of the paired `children`/`sizes` arrays and reinserted
/// at `to`'s index; `direction` is ignored. Otherwise the leaf is removed and re-added next to the target,
/// which is tracked across the removal so the caller's `to` stays meaningful.
pub fn try_move_view(
    state: &GridState,
    from: &[usize],
    to: &[usize],
    direction: Direction,
    config: &GridConfig,
) -> Result<GridState, GridOpError> {
    let (from_parent, from_index) = tail(from).ok_or(GridOpError::CannotMoveRoot)?;
    let source = resolve(&state.root, from).ok_or_else(|| GridOpError::MissingNode {
        location: from.to_vec(),
    })?;
    let GridNode::Leaf(source_leaf) = source.as_ref() else {
        return Err(GridOpError::NodeNotLeaf {
            location: from.to_vec(),
        });
    };
    let target = resolve(&state.root, to).ok_or_else(|| GridOpError::MissingNode {
        location: to.to_vec(),
    })?;
    if from == to {
        return Err(GridOpError::SameNode {
            location: from.to_vec(),
        });
    }

    if let Some((to_parent, to_index)) = tail(to)
        && to_parent == from_parent
    {
        return reorder(state, from_parent, from_index, to_index);
    }

    if !to.is_empty() && is_strict_prefix(to, from) {
        return Err(GridOpError::AncestorConflict {
            ancestor: to.to_vec(),
            descendant: from.to_vec(),
        });
    }

    let target_group = target.as_leaf().map(|leaf| leaf.group_id.clone());
    let parent_collapses = resolve(&state.root, from_parent)
        .is_some_and(|parent| parent.children().len() == 2);

    let removed = try_remove_view(state, from, config)?;
    let new_to = match target_group {
        Some(group_id) => {
            find_leaf_location(&removed, &group_id).ok_or_else(|| GridOpError::MissingNode {
                location: to.to_vec(),
            })?
        }
        None => relocate_after_removal(to, from_parent, from_index, parent_collapses),
    };

    try_add_view(
        &removed,
        source_leaf.group_id.clone(),
        &new_to,
        direction,
        None,
        config,
    )
}

/// Fallible form of [`resize_leaf`].
///
/// The new share is written into the parent's `sizes` and the whole array is
/// rescaled to 100, so every sibling gives up or absorbs space in proportion
/// to its current share. A new share within [`GridConfig::size_tolerance`]
/// of the current one leaves the grid untouched.
pub fn try_resize_leaf(
    state: &GridState,
    location: &[usize],
    new_size: f64,
    config: &GridConfig,
) -> Result<GridState, GridOpError> {
    check_size(new_size)?;
    let (parent_path, index) = tail(location).ok_or(GridOpError::CannotResizeRoot)?;
    let parent = parent_branch(state, location, parent_path, index)?;

    let mut sizes = current_shares(parent);
    if (sizes[index] - new_size).abs() <= config.size_tolerance {
        return Ok(state.clone());
    }
    sizes[index] = new_size;
    let resized = GridBranch::from_parts(
        parent.orientation,
        parent.children.clone(),
        &sizes,
        parent.size,
    );

    let root = replace_at(&state.root, parent_path, |_| {
        Some(Arc::new(GridNode::Branch(resized)))
    })
    .ok_or_else(|| GridOpError::MissingParent {
        location: location.to_vec(),
    })?;
    Ok(state.with_root(root))
}

/// Fallible form of [`set_leaf_maximized`].
pub fn try_set_leaf_maximized(
    state: &GridState,
    location: &[usize],
    maximized: bool,
) -> Result<GridState, GridOpError> {
    let mut failure = None;
    let root = replace_at(&state.root, location, |node| match node.as_ref() {
        GridNode::Leaf(leaf) => {
            let mut leaf = leaf.clone();
            leaf.maximized = maximized;
            Some(Arc::new(GridNode::Leaf(leaf)))
        }
        GridNode::Branch(_) => {
            failure = Some(GridOpError::NodeNotLeaf {
                location: location.to_vec(),
            });
            None
        }
    });
    match root {
        Some(root) => Ok(state.with_root(root)),
        None => Err(failure.unwrap_or_else(|| GridOpError::MissingNode {
            location: location.to_vec(),
        })),
    }
}

fn rejected(state: &GridState, kind: GridOperationKind, err: &GridOpError) -> GridState {
    #[cfg(feature = "tracing")]
    tracing::debug!(?kind, error = %err, "grid operation rejected");
    #[cfg(not(feature = "tracing"))]
    let _ = (kind, err);
    state.clone()
}

fn check_size(size: f64) -> Result<(), GridOpError> {
    if size.is_finite() && size >= 0.0 {
        Ok(())
    } else {
        Err(GridOpError::InvalidSize { size })
    }
}

fn parent_branch<'a>(
    state: &'a GridState,
    location: &[usize],
    parent_path: &[usize],
    index: usize,
) -> Result<&'a GridBranch, GridOpError> {
    let parent = resolve(&state.root, parent_path).ok_or_else(|| GridOpError::MissingParent {
        location: location.to_vec(),
    })?;
    let GridNode::Branch(branch) = parent.as_ref() else {
        return Err(GridOpError::ParentNotBranch {
            location: location.to_vec(),
        });
    };
    if index >= branch.children.len() {
        return Err(GridOpError::IndexOutOfRange {
            location: location.to_vec(),
            len: branch.children.len(),
        });
    }
    Ok(branch)
}

/// `sizes`, or the children's own sizes when the two disagree in length.
fn current_shares(branch: &GridBranch) -> Vec<f64> {
    if branch.sizes.len() == branch.children.len() {
        branch.sizes.clone()
    } else {
        branch.children.iter().map(|child| child.size()).collect()
    }
}

/// Branch holding `existing` and `incoming` side by side at `[50, 50]`.
///
/// The new branch takes over `existing`'s share in its parent.
fn wrap_pair(existing: &Arc<GridNode>, incoming: Arc<GridNode>, direction: Direction) -> Arc<GridNode> {
    let children = if direction.inserts_before() {
        vec![incoming, Arc::clone(existing)]
    } else {
        vec![Arc::clone(existing), incoming]
    };
    Arc::new(GridNode::Branch(GridBranch::from_parts(
        direction.orientation(),
        children,
        &[HALF_SIZE, HALF_SIZE],
        existing.size(),
    )))
}

fn splice(branch: &GridBranch, at: usize, incoming: Arc<GridNode>, size: f64) -> GridBranch {
    let mut children = branch.children.clone();
    let mut sizes = current_shares(branch);
    children.insert(at, incoming);
    sizes.insert(at, size);
    GridBranch::from_parts(branch.orientation, children, &sizes, branch.size)
}

fn dock_at_root(
    root: &Arc<GridNode>,
    incoming: Arc<GridNode>,
    direction: Direction,
    config: &GridConfig,
) -> Result<Arc<GridNode>, GridOpError> {
    match root.as_ref() {
        GridNode::Leaf(_) => Ok(wrap_pair(root, incoming, direction)),
        GridNode::Branch(_) if !config.dock_at_root => Err(GridOpError::RootDockingDisabled),
        GridNode::Branch(branch) if branch.orientation == direction.orientation() => {
            let at = if direction.inserts_before() {
                0
            } else {
                branch.children.len()
            };
            let size = incoming.size();
            Ok(Arc::new(GridNode::Branch(splice(branch, at, incoming, size))))
        }
        GridNode::Branch(_) => Ok(wrap_pair(root, incoming, direction)),
    }
}

fn reorder(
    state: &GridState,
    parent_path: &[usize],
    from_index: usize,
    to_index: usize,
) -> Result<GridState, GridOpError> {
    let mut failure = None;
    let root = replace_at(&state.root, parent_path, |node| {
        let GridNode::Branch(branch) = node.as_ref() else {
            failure = Some(GridOpError::ParentNotBranch {
                location: parent_path.to_vec(),
            });
            return None;
        };
        let mut children = branch.children.clone();
        let mut sizes = current_shares(branch);
        let moved_child = children.remove(from_index);
        let moved_size = sizes.remove(from_index);
        children.insert(to_index, moved_child);
        sizes.insert(to_index, moved_size);
        Some(Arc::new(GridNode::Branch(GridBranch {
            orientation: branch.orientation,
            children,
            size: branch.size,
            sizes,
        })))
    });
    root.map(|root| state.with_root(root)).ok_or_else(|| {
        failure.unwrap_or_else(|| GridOpError::MissingParent {
            location: parent_path.to_vec(),
        })
    })
}

/// Where a branch at `to` ends up after removing the leaf at
/// `removed_parent ++ [removed_index]`.
///
/// Later siblings shift down by one; if the parent collapsed onto its lone
/// survivor, the path component for that level disappears.
fn relocate_after_removal(
    to: &[usize],
    removed_parent: &[usize],
    removed_index: usize,
    parent_collapsed: bool,
) -> Location {
    let mut relocated = to.to_vec();
    let depth = removed_parent.len();
    if is_strict_prefix(removed_parent, to) {
        if relocated[depth] > removed_index {
            relocated[depth] -= 1;
        }
        if parent_collapsed {
            relocated.remove(depth);
        }
    }
    relocated
}
