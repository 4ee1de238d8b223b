//! # Migrate Command Implementation
//!
//! This module implements the `migrate` subcommand group, driving the
//! resumable production-migration pipeline. Re-invoking `migrate run`
//! after a failure picks up where the previous run stopped; `--restart`
//! discards one step's artifact and forces it to run again.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use odoo_toolbox::database::DbDriver;
use odoo_toolbox::migration::{build_pipeline, MigrationContext, Pipeline, StepOutcome};
use odoo_toolbox::output::{emoji, OutputConfig};
use odoo_toolbox::process::SystemRunner;
use odoo_toolbox::project::Project;

/// Default endpoint of the external upgrade service.
const DEFAULT_UPGRADE_ENDPOINT: &str = "https://upgrade.odoo.com/database/v1/upgrade";

/// Production migration pipeline
#[derive(Subcommand, Debug)]
pub enum MigrateCommand {
    /// Run (or resume) the migration pipeline
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Production dump to migrate (custom format)
    #[arg(value_name = "DUMP")]
    pub dump: PathBuf,

    /// Discard this step's artifact and run it again
    #[arg(long, value_name = "STEP")]
    pub restart: Option<String>,

    /// Enterprise contract number (default: read from the restored
    /// production database)
    #[arg(long, value_name = "CONTRACT")]
    pub contract: Option<String>,

    /// Target Odoo version (default: the project's tracked series)
    #[arg(long, value_name = "VERSION")]
    pub target_version: Option<String>,

    /// Upgrade service endpoint
    #[arg(
        long,
        value_name = "URL",
        env = "ODOO_UPGRADE_ENDPOINT",
        default_value = DEFAULT_UPGRADE_ENDPOINT
    )]
    pub endpoint: String,
}

/// Execute the `migrate` command.
pub fn execute(cmd: MigrateCommand, color_flag: &str) -> Result<()> {
    match cmd {
        MigrateCommand::Run(args) => run(args, &OutputConfig::from_env_and_flag(color_flag)),
    }
}

fn run(args: RunArgs, out: &OutputConfig) -> Result<()> {
    let project = Project::discover()?;
    let runner = SystemRunner;
    let db = DbDriver::new(&runner, &project.root);

    let ctx = MigrationContext::resolve(
        &project,
        &db,
        args.dump,
        args.contract,
        args.target_version,
        args.endpoint,
    )?;
    println!(
        "{} migrating to {} (contract {})",
        emoji(out, "🚀", "[RUN]"),
        ctx.target_version,
        ctx.contract
    );

    let steps = build_pipeline(&project, &ctx);
    let pipeline = Pipeline::new(&project, &runner);
    let outcomes = pipeline.run(&db, steps, args.restart.as_deref())?;

    let completed = outcomes
        .iter()
        .filter(|o| matches!(o, StepOutcome::Completed(_)))
        .count();
    println!(
        "{} migration finished ({} step(s) run, {} skipped)",
        emoji(out, "✅", "[OK]"),
        completed,
        outcomes.len() - completed
    );
    Ok(())
}
