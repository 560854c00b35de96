use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tessel_layout::{GridConfig, GridInvariantIssue, leaf_count};

use crate::error::{DoctorError, Result};
use crate::util::{emit_json, load_grid};

/// Exit code when the grid loads but breaks an invariant.
pub const INVARIANT_EXIT_CODE: i32 = 2;

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Persisted grid document.
    pub grid: PathBuf,

    /// Allowed group ids. Every leaf must name one of them.
    #[arg(long = "known", value_name = "GROUP_ID")]
    pub known: Vec<String>,

    /// Write the report here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ValidationSummary {
    pub status: &'static str,
    pub leaf_count: usize,
    pub state_hash: String,
    pub issues: Vec<GridInvariantIssue>,
}

pub fn run_validate(args: ValidateArgs, config: &GridConfig) -> Result<()> {
    let known: BTreeSet<String> = args.known.iter().cloned().collect();
    let grid = load_grid(&args.grid, (!known.is_empty()).then_some(&known))?;
    let report = grid.invariant_report_with(config);
    let has_errors = report.has_errors();

    let summary = ValidationSummary {
        status: if has_errors { "errors" } else { "ok" },
        leaf_count: leaf_count(&grid),
        state_hash: format!("{:016x}", report.state_hash),
        issues: report.issues,
    };
    emit_json(&summary, args.output.as_deref())?;

    if has_errors {
        let count = summary.issues.len();
        tracing::warn!(path = %args.grid.display(), count, "grid breaks invariants");
        return Err(DoctorError::exit(
            INVARIANT_EXIT_CODE,
            format!("{}: {count} invariant issue(s)", args.grid.display()),
        ));
    }
    Ok(())
}
