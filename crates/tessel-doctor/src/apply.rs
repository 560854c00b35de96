use std::path::PathBuf;

use clap::Args;
use tessel_layout::{GridConfig, GridOperation, GridTimeline};

use crate::error::Result;
use crate::util::{emit_json, load_grid, read_json};

#[derive(Debug, Clone, Args)]
pub struct ApplyArgs {
    /// Persisted grid document to start from.
    pub grid: PathBuf,

    /// JSON array of operations, applied in order.
    #[arg(long)]
    pub ops: PathBuf,

    /// Write the resulting grid here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Also write the recorded timeline (baseline + accepted operations).
    #[arg(long)]
    pub timeline: Option<PathBuf>,
}

/// Counts reported after an `apply` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyStats {
    pub applied: usize,
    pub rejected: usize,
}

pub fn run_apply(args: ApplyArgs, config: &GridConfig) -> Result<ApplyStats> {
    let mut grid = load_grid(&args.grid, None)?;
    let operations: Vec<GridOperation> = read_json(&args.ops)?;
    let mut timeline = GridTimeline::with_baseline(&grid, *config);
    let mut stats = ApplyStats {
        applied: 0,
        rejected: 0,
    };

    for (index, operation) in operations.into_iter().enumerate() {
        let kind = operation.kind();
        match timeline.apply_and_record(&grid, operation) {
            Ok(next) => {
                grid = next;
                stats.applied += 1;
            }
            Err(error) => {
                tracing::warn!(index, ?kind, %error, "operation rejected, skipping");
                stats.rejected += 1;
            }
        }
    }

    emit_json(&grid, args.output.as_deref())?;
    if let Some(path) = args.timeline.as_deref() {
        emit_json(&timeline, Some(path))?;
    }
    tracing::info!(applied = stats.applied, rejected = stats.rejected, "apply finished");
    Ok(stats)
}
