//! Engine tunables.

use serde::{Deserialize, Serialize};

use crate::node::HALF_SIZE;

/// Default tolerance for "shares sum to 100" checks.
pub const DEFAULT_SIZE_TOLERANCE: f64 = 1e-6;

/// Knobs shared by every grid primitive.
///
/// Unknown or missing fields fall back to [`GridConfig::default`], so a
/// partial JSON document is a valid config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Share given to a new view when the caller does not pass one.
    pub default_insert_size: f64,
    /// Allowed drift of a branch's share sum away from 100.
    pub size_tolerance: f64,
    /// Whether inserting at the root location of a split grid docks the new
    /// view at the workspace edge. When false such inserts are rejected.
    pub dock_at_root: bool,
}

impl GridConfig {
    /// Config with a custom default insert share.
    #[must_use]
    pub fn with_default_insert_size(mut self, size: f64) -> Self {
        self.default_insert_size = size;
        self
    }

    /// Config with a custom share tolerance.
    #[must_use]
    pub fn with_size_tolerance(mut self, tolerance: f64) -> Self {
        self.size_tolerance = tolerance;
        self
    }

    /// Config with root docking switched on or off.
    #[must_use]
    pub fn with_dock_at_root(mut self, dock: bool) -> Self {
        self.dock_at_root = dock;
        self
    }

    /// Whether `total` is close enough to the full share.
    #[must_use]
    pub(crate) fn sums_to_full(&self, total: f64) -> bool {
        (total - crate::node::FULL_SIZE).abs() <= self.size_tolerance
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            default_insert_size: HALF_SIZE,
            size_tolerance: DEFAULT_SIZE_TOLERANCE,
            dock_at_root: true,
        }
    }
}
