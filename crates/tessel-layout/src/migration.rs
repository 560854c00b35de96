//! Conversion to and from the legacy flat panel layout.
//!
//! Older workspaces persisted a flat list of panels plus one linear layout
//! descriptor. These helpers lift such a layout into a grid and project a
//! grid back down for rollback.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::location::leaves;
use crate::node::{FULL_SIZE, GridBranch, GridNode, GridState, Orientation, renormalize_sizes};

/// One panel record of the legacy format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyPanel {
    pub id: String,
    #[serde(default)]
    pub size: Option<f64>,
}

/// Axis of the legacy layout. `Single` means one panel fills the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyDirection {
    #[default]
    Single,
    Horizontal,
    Vertical,
}

impl LegacyDirection {
    /// Grid axis for this direction. `Single` maps to horizontal.
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        match self {
            Self::Vertical => Orientation::Vertical,
            Self::Horizontal | Self::Single => Orientation::Horizontal,
        }
    }
}

/// Linear layout descriptor of the legacy format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LegacyLayout {
    #[serde(default)]
    pub direction: LegacyDirection,
    #[serde(default)]
    pub sizes: Vec<f64>,
}

/// A complete legacy document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LegacyWorkspace {
    #[serde(default)]
    pub panels: Vec<LegacyPanel>,
    #[serde(default)]
    pub layout: LegacyLayout,
}

/// Lift a legacy layout into a grid.
///
/// Zero panels give [`GridState::empty`], one panel gives a single leaf, and
/// more give one branch along `layout.direction`. Shares come from
/// `layout.sizes` when it has one entry per panel, otherwise from the panels'
/// own sizes, and are renormalized either way.
#[must_use]
pub fn migrate_to_grid_state(panels: &[LegacyPanel], layout: &LegacyLayout) -> GridState {
    match panels {
        [] => GridState::empty(),
        [only] => GridState::new(only.id.clone()),
        _ => {
            let raw: Vec<f64> = if layout.sizes.len() == panels.len() {
                layout.sizes.clone()
            } else {
                panels
                    .iter()
                    .map(|panel| panel.size.unwrap_or(FULL_SIZE / panels.len() as f64))
                    .collect()
            };
            let shares = renormalize_sizes(&raw);
            let children = panels
                .iter()
                .zip(&shares)
                .map(|(panel, share)| Arc::new(GridNode::leaf(panel.id.clone(), *share)))
                .collect();
            let orientation = layout.direction.orientation();
            GridState::from_root(GridNode::Branch(GridBranch::from_parts(
                orientation,
                children,
                &shares,
                FULL_SIZE,
            )))
        }
    }
}

/// [`migrate_to_grid_state`] over a whole legacy document.
#[must_use]
pub fn migrate_workspace(workspace: &LegacyWorkspace) -> GridState {
    migrate_to_grid_state(&workspace.panels, &workspace.layout)
}

/// Project a grid down to the legacy flat format.
///
/// Exact for a single leaf or one branch of leaves. Deeper trees keep every
/// leaf in depth-first order with its own `size` as the share, so nested
/// ratios are not preserved. `lookup` maps a group id to the legacy panel
/// id; leaves it returns `None` for are skipped.
pub fn migrate_from_grid_state<F>(state: &GridState, mut lookup: F) -> LegacyWorkspace
where
    F: FnMut(&str) -> Option<String>,
{
    let (panels, sizes): (Vec<LegacyPanel>, Vec<f64>) = leaves(state)
        .into_iter()
        .filter_map(|(_, leaf)| {
            lookup(&leaf.group_id).map(|id| {
                (
                    LegacyPanel {
                        id,
                        size: Some(leaf.size),
                    },
                    leaf.size,
                )
            })
        })
        .unzip();

    let direction = match state.root() {
        GridNode::Leaf(_) => LegacyDirection::Single,
        GridNode::Branch(branch) => match branch.orientation {
            Orientation::Horizontal => LegacyDirection::Horizontal,
            Orientation::Vertical => LegacyDirection::Vertical,
        },
    };
    let sizes = if direction == LegacyDirection::Single {
        vec![FULL_SIZE; panels.len().min(1)]
    } else {
        sizes
    };

    LegacyWorkspace {
        panels,
        layout: LegacyLayout { direction, sizes },
    }
}
