#![forbid(unsafe_code)]

//! Recursive grid-splitting layout engine.
//!
//! A workspace is a tree of horizontal and vertical splits whose leaves are
//! opaque panel groups. Every primitive takes a [`GridState`] by reference
//! and returns a new one; inputs are never mutated, and untouched subtrees
//! are shared between the old and new state.
//!
//! ```
//! use tessel_layout::{Direction, GridState, add_view_to_grid, remove_view_from_grid};
//!
//! let grid = GridState::new("editor");
//! let grid = add_view_to_grid(&grid, "terminal", &[], Direction::Right, None);
//! let grid = add_view_to_grid(&grid, "preview", &[1], Direction::Down, None);
//! assert_eq!(tessel_layout::leaf_count(&grid), 3);
//!
//! // The inner split collapses and "preview" takes over its slot.
//! let grid = remove_view_from_grid(&grid, &[1, 0]);
//! assert_eq!(grid.root().as_branch().map(|b| b.sizes.clone()), Some(vec![50.0, 50.0]));
//! ```

pub mod config;
pub mod invariants;
pub mod location;
pub mod migration;
pub mod node;
pub mod normalize;
pub mod operation;
pub mod ops;
pub mod serialize;
pub mod sibling;

pub use config::{DEFAULT_SIZE_TOLERANCE, GridConfig};
pub use invariants::{
    GridInvariantCode, GridInvariantIssue, GridInvariantReport, GridInvariantSeverity,
};
pub use location::{all_group_ids, find_leaf_location, find_node_at_location, leaf_count, leaves, tail};
pub use migration::{
    LegacyDirection, LegacyLayout, LegacyPanel, LegacyWorkspace, migrate_from_grid_state,
    migrate_to_grid_state, migrate_workspace,
};
pub use node::{
    DEFAULT_GROUP_ID, DEFAULT_HEIGHT, DEFAULT_WIDTH, Direction, FULL_SIZE, GridBranch, GridLeaf,
    GridNode, GridState, HALF_SIZE, Location, Orientation, renormalize_sizes,
};
pub use normalize::{normalize_grid, normalize_grid_with};
pub use operation::{GridOperation, GridTimeline, GridTimelineEntry, GridTimelineError, apply_operation};
pub use ops::{
    GridOpError, GridOperationKind, add_view_to_grid, move_view_in_grid, remove_view_from_grid,
    resize_leaf, set_leaf_maximized, try_add_view, try_move_view, try_remove_view, try_resize_leaf,
    try_set_leaf_maximized,
};
pub use serialize::{
    GridDecodeError, SerializedGrid, SerializedLeafData, SerializedNode, deserialize_grid,
    serialize_grid, serialize_grid_to_value, try_deserialize_grid,
};
pub use sibling::find_nearest_sibling_leaf;
