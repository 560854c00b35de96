use std::path::PathBuf;

use clap::Args;
use tessel_layout::{LegacyWorkspace, migrate_workspace};

use crate::error::{DoctorError, Result};
use crate::util::{emit_json, read_json};

#[derive(Debug, Clone, Args)]
pub struct MigrateArgs {
    /// Legacy `{panels, layout}` document.
    pub legacy: PathBuf,

    /// Write the grid here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn run_migrate(args: MigrateArgs) -> Result<()> {
    let workspace: LegacyWorkspace = read_json(&args.legacy)?;
    if let Some(panel) = workspace.panels.iter().find(|panel| panel.id.is_empty()) {
        return Err(DoctorError::invalid(format!(
            "legacy panel with size {:?} has an empty id",
            panel.size
        )));
    }
    tracing::debug!(
        panels = workspace.panels.len(),
        direction = ?workspace.layout.direction,
        "migrating legacy layout"
    );
    let grid = migrate_workspace(&workspace);
    emit_json(&grid, args.output.as_deref())
}
