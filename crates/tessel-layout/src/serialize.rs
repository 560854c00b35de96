//! JSON persistence shape and a validating loader.
//!
//! ```json
//! {
//!   "root": {
//!     "type": "branch",
//!     "orientation": "horizontal",
//!     "size": 100,
//!     "visible": true,
//!     "data": [
//!       { "type": "leaf", "data": { "groupId": "a" }, "size": 50, "visible": true, "maximized": false },
//!       { "type": "leaf", "data": { "groupId": "b" }, "size": 50, "visible": true, "maximized": false }
//!     ]
//!   },
//!   "orientation": "horizontal",
//!   "width": 800,
//!   "height": 600
//! }
//! ```
//!
//! Branch `sizes` are not stored. The loader rebuilds them from the
//! children's `size` fields: shares that already sum to 100 are kept as
//! written, and a stale or hand-edited document is renormalized so it still
//! loads with shares summing to 100.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DEFAULT_SIZE_TOLERANCE;
use crate::node::{FULL_SIZE, GridBranch, GridLeaf, GridNode, GridState, Orientation};

/// Root document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedGrid {
    pub root: SerializedNode,
    pub orientation: Orientation,
    pub width: f64,
    pub height: f64,
}

/// Leaf payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedLeafData {
    #[serde(rename = "groupId")]
    pub group_id: String,
}

/// One node of the persisted tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SerializedNode {
    Leaf {
        data: SerializedLeafData,
        size: f64,
        #[serde(default = "visible_by_default")]
        visible: bool,
        #[serde(default)]
        maximized: bool,
    },
    Branch {
        data: Vec<SerializedNode>,
        size: f64,
        #[serde(default = "visible_by_default")]
        visible: bool,
        /// Written by this crate; older documents omit it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        orientation: Option<Orientation>,
    },
}

fn visible_by_default() -> bool {
    true
}

/// Why a persisted grid was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum GridDecodeError {
    /// The document does not have the expected shape.
    Malformed { message: String },
    /// `orientation` is not `horizontal` or `vertical`.
    InvalidOrientation { value: String },
    /// `width`/`height` are negative or not finite.
    InvalidDimensions { width: f64, height: f64 },
    /// A leaf names a group outside the allow-list.
    UnknownGroup { group_id: String },
    /// A branch has no children.
    EmptyBranch,
    /// A node share is negative or not finite.
    InvalidSize { size: f64 },
}

impl fmt::Display for GridDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { message } => write!(f, "malformed grid document: {message}"),
            Self::InvalidOrientation { value } => write!(f, "invalid orientation {value:?}"),
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid grid dimensions {width}x{height}")
            }
            Self::UnknownGroup { group_id } => write!(f, "unknown group id {group_id:?}"),
            Self::EmptyBranch => write!(f, "branch has no children"),
            Self::InvalidSize { size } => write!(f, "invalid node size {size}"),
        }
    }
}

impl std::error::Error for GridDecodeError {}

/// Persisted form of `state`.
#[must_use]
pub fn serialize_grid(state: &GridState) -> SerializedGrid {
    SerializedGrid {
        root: serialize_node(&state.root),
        orientation: state.orientation,
        width: state.width,
        height: state.height,
    }
}

/// Persisted form of `state` as a JSON value.
pub fn serialize_grid_to_value(state: &GridState) -> serde_json::Result<Value> {
    serde_json::to_value(serialize_grid(state))
}

/// Load a grid, returning `None` on any validation failure.
///
/// Callers are expected to fall back to [`GridState::empty`].
#[must_use]
pub fn deserialize_grid(value: &Value, known_group_ids: Option<&BTreeSet<String>>) -> Option<GridState> {
    try_deserialize_grid(value, known_group_ids).ok()
}

/// Load a grid, saying why it was refused.
///
/// With `known_group_ids`, every leaf must name a group from the set.
pub fn try_deserialize_grid(
    value: &Value,
    known_group_ids: Option<&BTreeSet<String>>,
) -> Result<GridState, GridDecodeError> {
    let result = decode_value(value, known_group_ids);
    #[cfg(feature = "tracing")]
    {
        if let Err(err) = &result {
            tracing::debug!(error = %err, "grid document rejected");
        }
    }
    result
}

impl SerializedGrid {
    /// Validate and rebuild the tree.
    pub fn into_state(
        self,
        known_group_ids: Option<&BTreeSet<String>>,
    ) -> Result<GridState, GridDecodeError> {
        if !(self.width.is_finite() && self.width >= 0.0 && self.height.is_finite() && self.height >= 0.0) {
            return Err(GridDecodeError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let root = decode_node(&self.root, known_group_ids, Some(self.orientation))?;
        Ok(GridState {
            root,
            orientation: self.orientation,
            width: self.width,
            height: self.height,
        })
    }
}

impl From<GridState> for SerializedGrid {
    fn from(state: GridState) -> Self {
        serialize_grid(&state)
    }
}

impl TryFrom<SerializedGrid> for GridState {
    type Error = GridDecodeError;

    fn try_from(grid: SerializedGrid) -> Result<Self, Self::Error> {
        grid.into_state(None)
    }
}

fn decode_value(
    value: &Value,
    known_group_ids: Option<&BTreeSet<String>>,
) -> Result<GridState, GridDecodeError> {
    let Some(object) = value.as_object() else {
        return Err(GridDecodeError::Malformed {
            message: "expected an object".to_string(),
        });
    };
    if let Some(raw) = object.get("orientation").and_then(Value::as_str)
        && Orientation::parse(raw).is_none()
    {
        return Err(GridDecodeError::InvalidOrientation {
            value: raw.to_string(),
        });
    }
    let grid = SerializedGrid::deserialize(value).map_err(|err| GridDecodeError::Malformed {
        message: err.to_string(),
    })?;
    grid.into_state(known_group_ids)
}

fn serialize_node(node: &GridNode) -> SerializedNode {
    match node {
        GridNode::Leaf(leaf) => SerializedNode::Leaf {
            data: SerializedLeafData {
                group_id: leaf.group_id.clone(),
            },
            size: leaf.size,
            visible: leaf.is_visible(),
            maximized: leaf.maximized,
        },
        GridNode::Branch(branch) => SerializedNode::Branch {
            data: branch.children.iter().map(|child| serialize_node(child)).collect(),
            size: branch.size,
            visible: true,
            orientation: Some(branch.orientation),
        },
    }
}

/// `inherited` is the document-level orientation and only applies to the
/// root branch.
fn decode_node(
    node: &SerializedNode,
    known_group_ids: Option<&BTreeSet<String>>,
    inherited: Option<Orientation>,
) -> Result<Arc<GridNode>, GridDecodeError> {
    match node {
        SerializedNode::Leaf {
            data,
            size,
            visible,
            maximized,
        } => {
            check_size(*size)?;
            if let Some(known) = known_group_ids
                && !known.contains(&data.group_id)
            {
                return Err(GridDecodeError::UnknownGroup {
                    group_id: data.group_id.clone(),
                });
            }
            Ok(Arc::new(GridNode::Leaf(GridLeaf {
                group_id: data.group_id.clone(),
                size: *size,
                cached_visible_size: (!visible).then_some(*size),
                maximized: *maximized,
            })))
        }
        SerializedNode::Branch {
            data,
            size,
            orientation,
            ..
        } => {
            check_size(*size)?;
            let children = data
                .iter()
                .map(|child| decode_node(child, known_group_ids, None))
                .collect::<Result<Vec<_>, _>>()?;
            match children.len() {
                0 => Err(GridDecodeError::EmptyBranch),
                1 => Ok(GridNode::with_size(&children[0], *size)),
                _ => {
                    let orientation = orientation
                        .or(inherited)
                        .unwrap_or_else(|| first_branch_orientation(&children));
                    Ok(Arc::new(GridNode::Branch(rebuild_branch(
                        orientation,
                        children,
                        *size,
                    ))))
                }
            }
        }
    }
}

/// Shares that already sum to 100 are kept bit for bit so a saved grid
/// reloads with the same [`GridState::state_hash`]. Drifted shares are
/// renormalized.
fn rebuild_branch(orientation: Orientation, children: Vec<Arc<GridNode>>, size: f64) -> GridBranch {
    let sizes: Vec<f64> = children.iter().map(|child| child.size()).collect();
    let total: f64 = sizes.iter().sum();
    if (total - FULL_SIZE).abs() <= DEFAULT_SIZE_TOLERANCE {
        GridBranch {
            orientation,
            children,
            size,
            sizes,
        }
    } else {
        GridBranch::from_parts(orientation, children, &sizes, size)
    }
}

/// Orientation of the first branch child, or horizontal.
fn first_branch_orientation(children: &[Arc<GridNode>]) -> Orientation {
    children
        .iter()
        .find_map(|child| child.as_branch().map(|branch| branch.orientation))
        .unwrap_or_default()
}

fn check_size(size: f64) -> Result<(), GridDecodeError> {
    if size.is_finite() && size >= 0.0 {
        Ok(())
    } else {
        Err(GridDecodeError::InvalidSize { size })
    }
}
