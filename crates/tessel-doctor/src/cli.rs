use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::apply::{ApplyArgs, run_apply};
use crate::error::Result;
use crate::inspect::{InspectArgs, run_inspect};
use crate::logging::init_logging;
use crate::migrate::{MigrateArgs, run_migrate};
use crate::normalize::{NormalizeArgs, run_normalize};
use crate::util::load_config;
use crate::validate::{ValidateArgs, run_validate};

#[derive(Debug, Parser)]
#[command(
    name = "tessel-doctor",
    about = "Validate, repair, migrate and replay persisted grid layouts",
    version
)]
pub struct Cli {
    /// Engine config (JSON). Missing fields use the defaults.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace). `TESSEL_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load a grid and report invariant violations.
    Validate(ValidateArgs),

    /// Rewrite a grid in canonical normalized form.
    Normalize(NormalizeArgs),

    /// Apply a list of operations to a grid.
    Apply(ApplyArgs),

    /// Convert a legacy flat panel layout into a grid.
    Migrate(MigrateArgs),

    /// Print every leaf of a grid.
    Inspect(InspectArgs),
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Validate(args) => run_validate(args, &config),
        Commands::Normalize(args) => run_normalize(args, &config),
        Commands::Apply(args) => run_apply(args, &config).map(|_| ()),
        Commands::Migrate(args) => run_migrate(args),
        Commands::Inspect(args) => run_inspect(args),
    }
}
