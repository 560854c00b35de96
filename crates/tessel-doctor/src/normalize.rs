use std::path::PathBuf;

use clap::Args;
use tessel_layout::{GridConfig, normalize_grid_with};

use crate::error::Result;
use crate::util::{emit_json, load_grid};

#[derive(Debug, Clone, Args)]
pub struct NormalizeArgs {
    /// Persisted grid document.
    pub grid: PathBuf,

    /// Write the normalized grid here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn run_normalize(args: NormalizeArgs, config: &GridConfig) -> Result<()> {
    let grid = load_grid(&args.grid, None)?;
    let normalized = normalize_grid_with(&grid, config);
    if normalized.ptr_eq(&grid) {
        tracing::info!(path = %args.grid.display(), "grid already normal");
    }
    emit_json(&normalized, args.output.as_deref())
}
