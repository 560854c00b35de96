use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;
use tessel_layout::{GridState, leaves};

use crate::error::Result;
use crate::util::load_grid;

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// Persisted grid document.
    pub grid: PathBuf,
}

/// One line per leaf: location, group id, share and flags.
#[must_use]
pub fn render_leaves(grid: &GridState) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "orientation={} size={}x{} hash={:016x}",
        grid.orientation().as_str(),
        grid.width(),
        grid.height(),
        grid.state_hash()
    );
    for (location, leaf) in leaves(grid) {
        let mut flags = Vec::new();
        if leaf.maximized {
            flags.push("maximized");
        }
        if !leaf.is_visible() {
            flags.push("hidden");
        }
        let _ = writeln!(
            out,
            "{location:?}\t{}\t{:.2}\t{}",
            leaf.group_id,
            leaf.size,
            flags.join(",")
        );
    }
    out
}

pub fn run_inspect(args: InspectArgs) -> Result<()> {
    let grid = load_grid(&args.grid, None)?;
    print!("{}", render_leaves(&grid));
    Ok(())
}
