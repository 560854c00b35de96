//! Grid tree node model.
//!
//! A grid is a tree of [`GridNode`] values. Leaves are panel slots keyed by an
//! opaque group identifier; branches split their extent along one axis and
//! hold the proportional share of every child in `sizes`.
//!
//! Nodes are shared through [`Arc`], so a mutation only rebuilds the path from
//! the edited node up to the root and every untouched subtree is reused as-is.
//! Comparing two roots with [`Arc::ptr_eq`] is a cheap "did anything change"
//! check.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Total share every branch distributes across its children.
pub const FULL_SIZE: f64 = 100.0;

/// Default share of a freshly wrapped pair of nodes.
pub const HALF_SIZE: f64 = FULL_SIZE / 2.0;

/// Group identifier used by [`GridState::empty`].
pub const DEFAULT_GROUP_ID: &str = "default";

/// Default pixel extents of a new grid.
pub const DEFAULT_WIDTH: f64 = 800.0;
pub const DEFAULT_HEIGHT: f64 = 600.0;

/// Path of child indices from the root to a node. `[]` is the root.
///
/// Locations are positional. Any structural change may invalidate them, so
/// re-resolve a group id with [`crate::find_leaf_location`] right before each
/// operation instead of keeping a location across state updates.
pub type Location = Vec<usize>;

/// Axis along which a branch lays out its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Children side by side, left to right.
    #[default]
    Horizontal,
    /// Children stacked, top to bottom.
    Vertical,
}

impl Orientation {
    /// The other axis.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }

    /// Parse a wire name, rejecting anything but the two known axes.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "horizontal" => Some(Self::Horizontal),
            "vertical" => Some(Self::Vertical),
            _ => None,
        }
    }
}

/// Side of an existing node on which a new node is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Split axis implied by the direction.
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        match self {
            Self::Left | Self::Right => Orientation::Horizontal,
            Self::Up | Self::Down => Orientation::Vertical,
        }
    }

    /// Whether the incoming node goes before the existing one.
    #[must_use]
    pub const fn inserts_before(self) -> bool {
        matches!(self, Self::Left | Self::Up)
    }
}

/// A single panel slot.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLeaf {
    /// Opaque caller-owned identifier. Never inspected by the engine.
    pub group_id: String,
    /// Share of the parent's extent (0-100).
    pub size: f64,
    /// Size remembered while the view is hidden.
    pub cached_visible_size: Option<f64>,
    pub maximized: bool,
}

impl GridLeaf {
    /// Build a visible, non-maximized leaf.
    #[must_use]
    pub fn new(group_id: impl Into<String>, size: f64) -> Self {
        Self {
            group_id: group_id.into(),
            size,
            cached_visible_size: None,
            maximized: false,
        }
    }

    /// Whether the leaf is currently shown.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.cached_visible_size.is_none()
    }
}

/// A split container.
#[derive(Debug, Clone, PartialEq)]
pub struct GridBranch {
    pub orientation: Orientation,
    pub children: Vec<Arc<GridNode>>,
    /// Share of the parent's extent (0-100).
    pub size: f64,
    /// `sizes[i]` is `children[i]`'s share of this branch. Sums to 100.
    pub sizes: Vec<f64>,
}

impl GridBranch {
    /// Build a branch from children and raw shares.
    ///
    /// The shares are renormalized to sum to [`FULL_SIZE`] and each child's own
    /// `size` is synced to its share. When `sizes` does not line up with
    /// `children`, the children's current sizes are used instead.
    #[must_use]
    pub fn from_parts(
        orientation: Orientation,
        children: Vec<Arc<GridNode>>,
        sizes: &[f64],
        size: f64,
    ) -> Self {
        let shares = if sizes.len() == children.len() {
            renormalize_sizes(sizes)
        } else {
            let current: Vec<f64> = children.iter().map(|child| child.size()).collect();
            renormalize_sizes(&current)
        };
        let children = children
            .into_iter()
            .zip(&shares)
            .map(|(child, share)| GridNode::with_size(&child, *share))
            .collect();
        Self {
            orientation,
            children,
            size,
            sizes: shares,
        }
    }

    /// Build a branch whose shares come from the children's own sizes.
    #[must_use]
    pub fn from_children(orientation: Orientation, children: Vec<Arc<GridNode>>, size: f64) -> Self {
        let sizes: Vec<f64> = children.iter().map(|child| child.size()).collect();
        Self::from_parts(orientation, children, &sizes, size)
    }

    /// Copy of this branch with `children[index]` replaced.
    ///
    /// The replacement inherits the share stored in `sizes[index]`.
    #[must_use]
    pub(crate) fn with_child(&self, index: usize, child: Arc<GridNode>) -> Self {
        let mut children = self.children.clone();
        let share = self.sizes.get(index).copied().unwrap_or_else(|| child.size());
        children[index] = GridNode::with_size(&child, share);
        Self {
            orientation: self.orientation,
            children,
            size: self.size,
            sizes: self.sizes.clone(),
        }
    }

    /// Sum of `sizes`.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.sizes.iter().sum()
    }
}

/// Node of the grid tree.
#[derive(Debug, Clone, PartialEq)]
pub enum GridNode {
    Leaf(GridLeaf),
    Branch(GridBranch),
}

impl GridNode {
    /// Shorthand for a visible leaf node.
    #[must_use]
    pub fn leaf(group_id: impl Into<String>, size: f64) -> Self {
        Self::Leaf(GridLeaf::new(group_id, size))
    }

    /// This node's share of its parent.
    #[must_use]
    pub fn size(&self) -> f64 {
        match self {
            Self::Leaf(leaf) => leaf.size,
            Self::Branch(branch) => branch.size,
        }
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    #[must_use]
    pub const fn as_leaf(&self) -> Option<&GridLeaf> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Branch(_) => None,
        }
    }

    #[must_use]
    pub const fn as_branch(&self) -> Option<&GridBranch> {
        match self {
            Self::Branch(branch) => Some(branch),
            Self::Leaf(_) => None,
        }
    }

    /// Children of a branch, empty for a leaf.
    #[must_use]
    pub fn children(&self) -> &[Arc<GridNode>] {
        match self {
            Self::Branch(branch) => &branch.children,
            Self::Leaf(_) => &[],
        }
    }

    /// Same node with a different share, reusing `node` when the share is
    /// already equal.
    #[must_use]
    pub fn with_size(node: &Arc<Self>, size: f64) -> Arc<Self> {
        if node.size() == size {
            return Arc::clone(node);
        }
        let mut updated = GridNode::clone(node);
        match &mut updated {
            Self::Leaf(leaf) => leaf.size = size,
            Self::Branch(branch) => branch.size = size,
        }
        Arc::new(updated)
    }

    /// First leaf in depth-first order, with its path relative to this node.
    #[must_use]
    pub fn first_leaf(&self) -> Option<(Location, &GridLeaf)> {
        match self {
            Self::Leaf(leaf) => Some((Vec::new(), leaf)),
            Self::Branch(branch) => branch.children.iter().enumerate().find_map(|(idx, child)| {
                child.first_leaf().map(|(mut path, leaf)| {
                    path.insert(0, idx);
                    (path, leaf)
                })
            }),
        }
    }
}

/// The root container handed between the caller and every primitive.
///
/// Cloning is cheap: the tree itself is shared. `width`/`height` are the last
/// known pixel extents and are carried for persistence only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    into = "crate::serialize::SerializedGrid",
    try_from = "crate::serialize::SerializedGrid"
)]
pub struct GridState {
    pub(crate) root: Arc<GridNode>,
    pub(crate) orientation: Orientation,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

impl GridState {
    /// Grid holding one full-size leaf.
    #[must_use]
    pub fn new(group_id: impl Into<String>) -> Self {
        Self::from_root(GridNode::leaf(group_id, FULL_SIZE))
    }

    /// Grid holding one full-size leaf with [`DEFAULT_GROUP_ID`].
    #[must_use]
    pub fn empty() -> Self {
        Self::new(DEFAULT_GROUP_ID)
    }

    /// Wrap an arbitrary tree without validating it.
    ///
    /// The root-level orientation follows the root branch, or defaults to
    /// horizontal for a leaf root.
    #[must_use]
    pub fn from_root(root: GridNode) -> Self {
        let orientation = root
            .as_branch()
            .map_or(Orientation::Horizontal, |branch| branch.orientation);
        Self {
            root: Arc::new(root),
            orientation,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }

    /// Same grid with new pixel extents.
    #[must_use]
    pub fn with_dimensions(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Same grid with a new root-level orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Successor state sharing dimensions, with a replaced root.
    ///
    /// A branch root dictates the root-level orientation; a leaf root keeps
    /// the previous one.
    #[must_use]
    pub(crate) fn with_root(&self, root: Arc<GridNode>) -> Self {
        let orientation = root
            .as_branch()
            .map_or(self.orientation, |branch| branch.orientation);
        Self {
            root,
            orientation,
            width: self.width,
            height: self.height,
        }
    }

    #[must_use]
    pub fn root(&self) -> &GridNode {
        &self.root
    }

    /// Shared handle to the root node.
    #[must_use]
    pub fn root_arc(&self) -> &Arc<GridNode> {
        &self.root
    }

    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// True when both states share the same root allocation and metadata.
    ///
    /// Every primitive returns a `ptr_eq` state when it did nothing.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
            && self.orientation == other.orientation
            && self.width.to_bits() == other.width.to_bits()
            && self.height.to_bits() == other.height.to_bits()
    }
}

impl Default for GridState {
    fn default() -> Self {
        Self::empty()
    }
}

/// Rescale raw shares so they sum to [`FULL_SIZE`].
///
/// Negative and non-finite entries count as zero. If nothing positive is
/// left, the space is split evenly. Any finite input gives finite shares.
#[must_use]
pub fn renormalize_sizes(raw: &[f64]) -> Vec<f64> {
    if raw.is_empty() {
        return Vec::new();
    }
    let mut cleaned: Vec<f64> = raw
        .iter()
        .map(|size| if size.is_finite() && *size > 0.0 { *size } else { 0.0 })
        .collect();
    let mut total: f64 = cleaned.iter().sum();
    if total.is_infinite() {
        // Every entry is finite, so only the sum overflowed. Scale down by
        // the largest entry first.
        let largest = cleaned.iter().copied().fold(0.0, f64::max);
        for size in &mut cleaned {
            *size /= largest;
        }
        total = cleaned.iter().sum();
    }
    if !total.is_finite() || total <= 0.0 {
        let even = FULL_SIZE / raw.len() as f64;
        return vec![even; raw.len()];
    }
    cleaned.iter().map(|size| size / total * FULL_SIZE).collect()
}
