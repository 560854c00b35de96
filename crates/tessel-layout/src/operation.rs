//! Serializable grid operations and a replayable undo/redo timeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::node::{Direction, GridState, Location};
use crate::normalize::normalize_grid_with;
use crate::ops::{
    GridOpError, GridOperationKind, try_add_view, try_move_view, try_remove_view,
    try_resize_leaf, try_set_leaf_maximized,
};

/// One structural grid operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GridOperation {
    /// Insert a new leaf next to `location`.
    AddView {
        group_id: String,
        location: Location,
        direction: Direction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<f64>,
    },
    /// Remove the node at `location`.
    RemoveView { location: Location },
    /// Reorder or relocate the leaf at `from`.
    MoveView {
        from: Location,
        to: Location,
        direction: Direction,
    },
    /// Set the share of the node at `location`.
    ResizeView { location: Location, size: f64 },
    /// Set or clear a leaf's maximized flag.
    SetMaximized { location: Location, maximized: bool },
    /// Run the normalization pass.
    Normalize,
}

impl GridOperation {
    /// Operation family.
    #[must_use]
    pub const fn kind(&self) -> GridOperationKind {
        match self {
            Self::AddView { .. } => GridOperationKind::AddView,
            Self::RemoveView { .. } => GridOperationKind::RemoveView,
            Self::MoveView { .. } => GridOperationKind::MoveView,
            Self::ResizeView { .. } => GridOperationKind::ResizeView,
            Self::SetMaximized { .. } => GridOperationKind::SetMaximized,
            Self::Normalize => GridOperationKind::Normalize,
        }
    }
}

/// Apply `operation` to `state`.
pub fn apply_operation(
    state: &GridState,
    operation: &GridOperation,
    config: &GridConfig,
) -> Result<GridState, GridOpError> {
    match operation {
        GridOperation::AddView {
            group_id,
            location,
            direction,
            size,
        } => try_add_view(state, group_id.as_str(), location, *direction, *size, config),
        GridOperation::RemoveView { location } => try_remove_view(state, location, config),
        GridOperation::MoveView {
            from,
            to,
            direction,
        } => try_move_view(state, from, to, *direction, config),
        GridOperation::ResizeView { location, size } => {
            try_resize_leaf(state, location, *size, config)
        }
        GridOperation::SetMaximized {
            location,
            maximized,
        } => try_set_leaf_maximized(state, location, *maximized),
        GridOperation::Normalize => Ok(normalize_grid_with(state, config)),
    }
}

/// One recorded timeline event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridTimelineEntry {
    pub sequence: u64,
    pub operation: GridOperation,
    pub before_hash: u64,
    pub after_hash: u64,
}

/// Operation history with an undo/redo cursor.
///
/// States are rebuilt by replaying the applied prefix from the baseline, so
/// the timeline itself only stores the baseline and the operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridTimeline {
    /// State before the first recorded operation.
    pub baseline: Option<GridState>,
    /// Full history in application order.
    pub entries: Vec<GridTimelineEntry>,
    /// Number of entries currently applied (<= entries.len()).
    pub cursor: usize,
    /// Config every entry was applied with.
    #[serde(default)]
    pub config: GridConfig,
}

/// Timeline replay/undo/redo failures.
#[derive(Debug, Clone, PartialEq)]
pub enum GridTimelineError {
    MissingBaseline,
    ApplyFailed { sequence: u64, source: GridOpError },
    HashMismatch {
        sequence: u64,
        expected: u64,
        actual: u64,
    },
}

impl fmt::Display for GridTimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBaseline => write!(f, "timeline baseline is not set"),
            Self::ApplyFailed { sequence, source } => {
                write!(f, "timeline replay of entry {sequence} failed: {source}")
            }
            Self::HashMismatch {
                sequence,
                expected,
                actual,
            } => write!(
                f,
                "timeline entry {sequence} replayed to {actual:#018x}, recorded {expected:#018x}"
            ),
        }
    }
}

impl std::error::Error for GridTimelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ApplyFailed { source, .. } => Some(source),
            Self::MissingBaseline | Self::HashMismatch { .. } => None,
        }
    }
}

impl GridTimeline {
    /// Timeline starting at `state`.
    #[must_use]
    pub fn with_baseline(state: &GridState, config: GridConfig) -> Self {
        Self {
            baseline: Some(state.clone()),
            entries: Vec::new(),
            cursor: 0,
            config,
        }
    }

    /// Number of currently applied entries.
    #[must_use]
    pub const fn applied_len(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Apply `operation` to `state` and record it.
    ///
    /// After an undo, the entries past the cursor are dropped before the new
    /// one is appended. Rejected operations are not recorded.
    pub fn apply_and_record(
        &mut self,
        state: &GridState,
        operation: GridOperation,
    ) -> Result<GridState, GridOpError> {
        let next = apply_operation(state, &operation, &self.config)?;
        if self.baseline.is_none() {
            self.baseline = Some(state.clone());
        }
        if self.cursor < self.entries.len() {
            self.entries.truncate(self.cursor);
        }
        let sequence = self.entries.last().map_or(1, |entry| entry.sequence + 1);
        self.entries.push(GridTimelineEntry {
            sequence,
            operation,
            before_hash: state.state_hash(),
            after_hash: next.state_hash(),
        });
        self.cursor = self.entries.len();
        Ok(next)
    }

    /// Step back one entry. `None` when nothing is applied.
    pub fn undo(&mut self) -> Result<Option<GridState>, GridTimelineError> {
        if !self.can_undo() {
            return Ok(None);
        }
        self.cursor -= 1;
        self.replay().map(Some)
    }

    /// Step forward one entry. `None` when already at the head.
    pub fn redo(&mut self) -> Result<Option<GridState>, GridTimelineError> {
        if !self.can_redo() {
            return Ok(None);
        }
        self.cursor += 1;
        self.replay().map(Some)
    }

    /// Rebuild the current state from the baseline and the applied entries.
    ///
    /// Each replayed entry is checked against its recorded hash.
    pub fn replay(&self) -> Result<GridState, GridTimelineError> {
        let mut state = self
            .baseline
            .clone()
            .ok_or(GridTimelineError::MissingBaseline)?;
        for entry in self.entries.iter().take(self.cursor) {
            state = apply_operation(&state, &entry.operation, &self.config).map_err(|source| {
                GridTimelineError::ApplyFailed {
                    sequence: entry.sequence,
                    source,
                }
            })?;
            let actual = state.state_hash();
            if actual != entry.after_hash {
                return Err(GridTimelineError::HashMismatch {
                    sequence: entry.sequence,
                    expected: entry.after_hash,
                    actual,
                });
            }
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{all_group_ids, find_leaf_location};
    use serde_json::json;

    fn add(group_id: &str, location: &[usize], direction: Direction) -> GridOperation {
        GridOperation::AddView {
            group_id: group_id.to_string(),
            location: location.to_vec(),
            direction,
            size: None,
        }
    }

    #[test]
    fn operations_use_tagged_wire_shape() {
        let op = add("b", &[], Direction::Right);
        assert_eq!(
            serde_json::to_value(&op).expect("serializable"),
            json!({ "op": "add_view", "group_id": "b", "location": [], "direction": "right" })
        );
        let parsed: GridOperation =
            serde_json::from_value(json!({ "op": "resize_view", "location": [0], "size": 30.0 }))
                .expect("valid operation");
        assert_eq!(parsed.kind(), GridOperationKind::ResizeView);
        let parsed: GridOperation =
            serde_json::from_value(json!({ "op": "normalize" })).expect("valid operation");
        assert_eq!(parsed, GridOperation::Normalize);
    }

    #[test]
    fn apply_operation_dispatches() {
        let config = GridConfig::default();
        let state = GridState::new("a");
        let state = apply_operation(&state, &add("b", &[], Direction::Right), &config)
            .expect("split applies");
        let state = apply_operation(
            &state,
            &GridOperation::SetMaximized {
                location: vec![1],
                maximized: true,
            },
            &config,
        )
        .expect("maximize applies");
        assert!(state.root().children()[1].as_leaf().is_some_and(|leaf| leaf.maximized));
        let err = apply_operation(&state, &GridOperation::RemoveView { location: vec![] }, &config)
            .unwrap_err();
        assert_eq!(err, GridOpError::CannotRemoveRoot);
    }

    #[test]
    fn undo_redo_walks_history() {
        let base = GridState::new("a");
        let mut timeline = GridTimeline::with_baseline(&base, GridConfig::default());
        let one = timeline
            .apply_and_record(&base, add("b", &[], Direction::Right))
            .expect("split");
        let two = timeline
            .apply_and_record(&one, add("c", &[1], Direction::Down))
            .expect("split");
        assert_eq!(timeline.applied_len(), 2);
        assert_eq!(timeline.entries[1].before_hash, one.state_hash());
        assert_eq!(timeline.entries[1].after_hash, two.state_hash());

        let undone = timeline.undo().expect("replay").expect("one step back");
        assert_eq!(undone, one);
        let undone = timeline.undo().expect("replay").expect("one more");
        assert_eq!(undone, base);
        assert_eq!(timeline.undo().expect("replay"), None);

        let redone = timeline.redo().expect("replay").expect("forward");
        assert_eq!(redone, one);
        assert_eq!(timeline.replay().expect("replay"), one);
    }

    #[test]
    fn recording_after_undo_drops_redo_tail() {
        let base = GridState::new("a");
        let mut timeline = GridTimeline::with_baseline(&base, GridConfig::default());
        let one = timeline
            .apply_and_record(&base, add("b", &[], Direction::Right))
            .expect("split");
        let _ = timeline
            .apply_and_record(&one, add("c", &[1], Direction::Down))
            .expect("split");
        let back = timeline.undo().expect("replay").expect("undo");
        let fork = timeline
            .apply_and_record(&back, add("d", &[0], Direction::Left))
            .expect("split");
        assert_eq!(timeline.entries.len(), 2);
        assert!(!timeline.can_redo());
        assert_eq!(timeline.entries[1].sequence, 2);
        assert!(find_leaf_location(&fork, "d").is_some());
        assert!(!all_group_ids(&fork).contains("c"));
    }

    #[test]
    fn rejected_operations_are_not_recorded() {
        let base = GridState::new("a");
        let mut timeline = GridTimeline::default();
        assert!(timeline
            .apply_and_record(&base, GridOperation::RemoveView { location: vec![] })
            .is_err());
        assert!(timeline.entries.is_empty());
        assert_eq!(timeline.replay(), Err(GridTimelineError::MissingBaseline));
    }

    #[test]
    fn tampered_history_is_detected() {
        let base = GridState::new("a");
        let mut timeline = GridTimeline::with_baseline(&base, GridConfig::default());
        let _ = timeline
            .apply_and_record(&base, add("b", &[], Direction::Right))
            .expect("split");
        timeline.entries[0].operation = add("b", &[], Direction::Down);
        assert!(matches!(
            timeline.replay(),
            Err(GridTimelineError::HashMismatch { sequence: 1, .. })
        ));
    }

    #[test]
    fn timeline_round_trips_through_json() {
        let base = GridState::new("a");
        let mut timeline = GridTimeline::with_baseline(&base, GridConfig::default());
        let one = timeline
            .apply_and_record(&base, add("b", &[], Direction::Right))
            .expect("split");
        let text = serde_json::to_string(&timeline).expect("serializable");
        let restored: GridTimeline = serde_json::from_str(&text).expect("valid");
        assert_eq!(restored.replay().expect("replay"), one);
    }

    #[test]
    fn saved_timeline_with_uneven_baseline_replays() {
        let config = GridConfig::default();
        let base = GridState::new("a");
        let base = apply_operation(&base, &add("b", &[], Direction::Right), &config).expect("split");
        let base = apply_operation(&base, &add("c", &[1], Direction::Right), &config).expect("split");
        let base = apply_operation(
            &base,
            &GridOperation::ResizeView {
                location: vec![0],
                size: 4.937_365_295_552_909,
            },
            &config,
        )
        .expect("resize");

        let mut timeline = GridTimeline::with_baseline(&base, config);
        let one = timeline
            .apply_and_record(&base, add("d", &[2], Direction::Down))
            .expect("split");
        let two = timeline
            .apply_and_record(
                &one,
                GridOperation::ResizeView {
                    location: vec![1],
                    size: 20.928_020_657_106_085,
                },
            )
            .expect("resize");

        let text = serde_json::to_string(&timeline).expect("serializable");
        let mut restored: GridTimeline = serde_json::from_str(&text).expect("valid");
        assert_eq!(restored.baseline.as_ref().map(GridState::state_hash), Some(base.state_hash()));
        assert_eq!(restored.replay().expect("replay"), two);
        assert_eq!(restored.undo().expect("replay"), Some(one));
    }
}
