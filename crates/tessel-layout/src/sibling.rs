//! Focus hand-off when a view closes.

use crate::location::{resolve, tail};
use crate::node::{GridLeaf, GridState, Location};

/// Nearest leaf among the siblings of the node at `location`.
///
/// Previous siblings are tried first, nearest first, then following ones.
/// A sibling branch contributes its first leaf in depth-first order. Returns
/// `None` for the root, for a location that does not resolve, and when the
/// node has no siblings.
#[must_use]
pub fn find_nearest_sibling_leaf(state: &GridState, location: &[usize]) -> Option<(Location, GridLeaf)> {
    let (parent_path, index) = tail(location)?;
    let parent = resolve(&state.root, parent_path)?;
    let siblings = parent.children();
    if index >= siblings.len() {
        return None;
    }

    let before = (0..index).rev();
    let after = index + 1..siblings.len();
    before.chain(after).find_map(|idx| {
        siblings[idx].first_leaf().map(|(sub_path, leaf)| {
            let mut found = parent_path.to_vec();
            found.push(idx);
            found.extend(sub_path);
            (found, leaf.clone())
        })
    })
}
