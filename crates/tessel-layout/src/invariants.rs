//! Structural hash and invariant diagnostics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::node::{GridNode, GridState, Location, Orientation};

/// Severity for one invariant finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridInvariantSeverity {
    Error,
    Warning,
}

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridInvariantCode {
    /// Branch with fewer than two children.
    DegenerateBranch,
    /// `sizes` and `children` differ in length.
    SizeCountMismatch,
    /// `sizes` does not sum to 100.
    SizeSumDrift,
    /// A share or a node size is NaN, infinite or negative.
    InvalidSize,
    /// A child's own size disagrees with its slot in `sizes`.
    ChildSizeMismatch,
    /// The same group id appears on more than one leaf.
    DuplicateGroupId,
}

/// One actionable invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridInvariantIssue {
    pub code: GridInvariantCode,
    pub severity: GridInvariantSeverity,
    pub location: Location,
    pub message: String,
}

/// Structured invariant report over a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridInvariantReport {
    pub state_hash: u64,
    pub issues: Vec<GridInvariantIssue>,
}

impl GridInvariantReport {
    /// Return true if any error-level finding exists.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == GridInvariantSeverity::Error)
    }

    /// Return true if there are no findings at all.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl GridState {
    /// Deterministic structural hash.
    ///
    /// Covers shape, orientations, group ids, flags and the exact bits of
    /// every size. Intended for operation logs and replay checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = Fnv1a::new();
        hasher.byte(orientation_tag(self.orientation));
        hasher.u64(self.width.to_bits());
        hasher.u64(self.height.to_bits());
        hash_node(&mut hasher, &self.root);
        hasher.finish()
    }

    /// Invariant report using the default size tolerance.
    #[must_use]
    pub fn invariant_report(&self) -> GridInvariantReport {
        self.invariant_report_with(&GridConfig::default())
    }

    /// Invariant report with an explicit size tolerance.
    #[must_use]
    pub fn invariant_report_with(&self, config: &GridConfig) -> GridInvariantReport {
        let mut issues = Vec::new();
        let mut groups: BTreeMap<&str, Vec<Location>> = BTreeMap::new();
        check_node(&self.root, &mut Vec::new(), config, &mut issues, &mut groups);
        for (group_id, locations) in groups {
            if let [_, duplicates @ ..] = locations.as_slice() {
                for location in duplicates {
                    issues.push(GridInvariantIssue {
                        code: GridInvariantCode::DuplicateGroupId,
                        severity: GridInvariantSeverity::Error,
                        location: location.clone(),
                        message: format!("group id {group_id:?} already used at {:?}", locations[0]),
                    });
                }
            }
        }
        GridInvariantReport {
            state_hash: self.state_hash(),
            issues,
        }
    }
}

struct Fnv1a(u64);

impl Fnv1a {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0001_0000_01b3;

    const fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    fn byte(&mut self, byte: u8) {
        self.0 ^= u64::from(byte);
        self.0 = self.0.wrapping_mul(Self::PRIME);
    }

    fn bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.byte(*byte);
        }
    }

    fn u64(&mut self, value: u64) {
        self.bytes(&value.to_le_bytes());
    }

    fn str(&mut self, value: &str) {
        self.u64(value.len() as u64);
        self.bytes(value.as_bytes());
    }

    const fn finish(&self) -> u64 {
        self.0
    }
}

const fn orientation_tag(orientation: Orientation) -> u8 {
    match orientation {
        Orientation::Horizontal => 0,
        Orientation::Vertical => 1,
    }
}

fn hash_node(hasher: &mut Fnv1a, node: &GridNode) {
    match node {
        GridNode::Leaf(leaf) => {
            hasher.byte(b'L');
            hasher.str(&leaf.group_id);
            hasher.u64(leaf.size.to_bits());
            match leaf.cached_visible_size {
                Some(cached) => {
                    hasher.byte(1);
                    hasher.u64(cached.to_bits());
                }
                None => hasher.byte(0),
            }
            hasher.byte(u8::from(leaf.maximized));
        }
        GridNode::Branch(branch) => {
            hasher.byte(b'B');
            hasher.byte(orientation_tag(branch.orientation));
            hasher.u64(branch.size.to_bits());
            hasher.u64(branch.sizes.len() as u64);
            for share in &branch.sizes {
                hasher.u64(share.to_bits());
            }
            hasher.u64(branch.children.len() as u64);
            for child in &branch.children {
                hash_node(hasher, child);
            }
        }
    }
}

fn push_issue(
    issues: &mut Vec<GridInvariantIssue>,
    code: GridInvariantCode,
    severity: GridInvariantSeverity,
    location: &[usize],
    message: impl Into<String>,
) {
    issues.push(GridInvariantIssue {
        code,
        severity,
        location: location.to_vec(),
        message: message.into(),
    });
}

fn check_node<'a>(
    node: &'a GridNode,
    path: &mut Location,
    config: &GridConfig,
    issues: &mut Vec<GridInvariantIssue>,
    groups: &mut BTreeMap<&'a str, Vec<Location>>,
) {
    let size = node.size();
    if !(size.is_finite() && size >= 0.0) {
        push_issue(
            issues,
            GridInvariantCode::InvalidSize,
            GridInvariantSeverity::Error,
            path,
            format!("node size {size} is not a finite non-negative share"),
        );
    }

    let branch = match node {
        GridNode::Leaf(leaf) => {
            groups.entry(leaf.group_id.as_str()).or_default().push(path.clone());
            return;
        }
        GridNode::Branch(branch) => branch,
    };

    if branch.children.len() < 2 {
        push_issue(
            issues,
            GridInvariantCode::DegenerateBranch,
            GridInvariantSeverity::Error,
            path,
            format!("branch has {} children", branch.children.len()),
        );
    }
    if branch.sizes.len() != branch.children.len() {
        push_issue(
            issues,
            GridInvariantCode::SizeCountMismatch,
            GridInvariantSeverity::Error,
            path,
            format!(
                "{} shares for {} children",
                branch.sizes.len(),
                branch.children.len()
            ),
        );
    }
    if branch
        .sizes
        .iter()
        .any(|share| !(share.is_finite() && *share >= 0.0))
    {
        push_issue(
            issues,
            GridInvariantCode::InvalidSize,
            GridInvariantSeverity::Error,
            path,
            format!("shares {:?} contain an invalid entry", branch.sizes),
        );
    } else if !branch.sizes.is_empty() && !config.sums_to_full(branch.total()) {
        push_issue(
            issues,
            GridInvariantCode::SizeSumDrift,
            GridInvariantSeverity::Error,
            path,
            format!("shares sum to {}", branch.total()),
        );
    }

    for (idx, child) in branch.children.iter().enumerate() {
        path.push(idx);
        if let Some(share) = branch.sizes.get(idx)
            && (child.size() - share).abs() > config.size_tolerance
        {
            push_issue(
                issues,
                GridInvariantCode::ChildSizeMismatch,
                GridInvariantSeverity::Warning,
                path,
                format!("child size {} differs from share {share}", child.size()),
            );
        }
        check_node(child, path, config, issues, groups);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Direction, FULL_SIZE, GridBranch};
    use crate::ops::add_view_to_grid;
    use std::sync::Arc;

    fn codes(report: &GridInvariantReport) -> Vec<GridInvariantCode> {
        report.issues.iter().map(|issue| issue.code).collect()
    }

    #[test]
    fn engine_built_grid_is_clean() {
        let state = add_view_to_grid(&GridState::new("a"), "b", &[], Direction::Right, None);
        let state = add_view_to_grid(&state, "c", &[1], Direction::Down, None);
        let report = state.invariant_report();
        assert!(report.is_clean(), "{report:?}");
        assert_eq!(report.state_hash, state.state_hash());
    }

    #[test]
    fn hash_is_deterministic_and_structure_sensitive() {
        let a = add_view_to_grid(&GridState::new("a"), "b", &[], Direction::Right, None);
        let b = add_view_to_grid(&GridState::new("a"), "b", &[], Direction::Right, None);
        let c = add_view_to_grid(&GridState::new("a"), "b", &[], Direction::Down, None);
        let d = add_view_to_grid(&GridState::new("a"), "b", &[], Direction::Left, None);
        assert_eq!(a.state_hash(), b.state_hash());
        assert_ne!(a.state_hash(), c.state_hash());
        assert_ne!(a.state_hash(), d.state_hash());
        assert_ne!(a.state_hash(), a.clone().with_dimensions(1.0, 1.0).state_hash());
    }

    #[test]
    fn hand_built_violations_are_reported() {
        let lonely = GridNode::Branch(GridBranch {
            orientation: Orientation::Vertical,
            children: vec![Arc::new(GridNode::leaf("a", 100.0))],
            size: 40.0,
            sizes: vec![100.0],
        });
        let root = GridNode::Branch(GridBranch {
            orientation: Orientation::Horizontal,
            children: vec![Arc::new(lonely), Arc::new(GridNode::leaf("a", 60.0))],
            size: FULL_SIZE,
            sizes: vec![40.0, 30.0],
        });
        let report = GridState::from_root(root).invariant_report();
        let found = codes(&report);
        assert!(found.contains(&GridInvariantCode::DegenerateBranch));
        assert!(found.contains(&GridInvariantCode::SizeSumDrift));
        assert!(found.contains(&GridInvariantCode::ChildSizeMismatch));
        assert!(found.contains(&GridInvariantCode::DuplicateGroupId));
        assert!(report.has_errors());

        let duplicate = report
            .issues
            .iter()
            .find(|issue| issue.code == GridInvariantCode::DuplicateGroupId)
            .expect("duplicate reported");
        assert_eq!(duplicate.location, vec![1]);
    }

    #[test]
    fn count_mismatch_and_invalid_shares() {
        let root = GridNode::Branch(GridBranch {
            orientation: Orientation::Horizontal,
            children: vec![
                Arc::new(GridNode::leaf("a", 50.0)),
                Arc::new(GridNode::leaf("b", 50.0)),
            ],
            size: FULL_SIZE,
            sizes: vec![f64::NAN],
        });
        let found = codes(&GridState::from_root(root).invariant_report());
        assert!(found.contains(&GridInvariantCode::SizeCountMismatch));
        assert!(found.contains(&GridInvariantCode::InvalidSize));
        assert!(!found.contains(&GridInvariantCode::SizeSumDrift));
    }

    #[test]
    fn child_mismatch_is_only_a_warning() {
        let root = GridNode::Branch(GridBranch {
            orientation: Orientation::Horizontal,
            children: vec![
                Arc::new(GridNode::leaf("a", 10.0)),
                Arc::new(GridNode::leaf("b", 50.0)),
            ],
            size: FULL_SIZE,
            sizes: vec![50.0, 50.0],
        });
        let report = GridState::from_root(root).invariant_report();
        assert_eq!(codes(&report), vec![GridInvariantCode::ChildSizeMismatch]);
        assert!(!report.has_errors());
    }
}
