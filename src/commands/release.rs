//! # Release Command Implementation
//!
//! This module implements the `release` subcommand group. Bumping writes
//! the new version to the project `VERSION` file, keeps
//! `.bumpversion.cfg` in sync and inserts a changelog stub.

use anyhow::Result;
use clap::{Args, Subcommand};

use odoo_toolbox::project::Project;
use odoo_toolbox::version::{append_changelog_stub, current_version, write_version, BumpKind};

/// Release management
#[derive(Subcommand, Debug)]
pub enum ReleaseCommand {
    /// Bump the project version
    Bump(BumpArgs),
}

#[derive(Args, Debug)]
pub struct BumpArgs {
    /// Which release component to bump (major, minor or patch)
    #[arg(long = "type", value_name = "KIND")]
    pub kind: BumpKind,
}

/// Execute the `release` command.
pub fn execute(cmd: ReleaseCommand) -> Result<()> {
    match cmd {
        ReleaseCommand::Bump(args) => bump(args),
    }
}

fn bump(args: BumpArgs) -> Result<()> {
    let project = Project::discover()?;
    let current = current_version(&project)?;
    let next = current.bump(args.kind);
    write_version(&project, &next)?;
    append_changelog_stub(&project.root, &next)?;
    println!("🔖 {} → {}", current, next);
    Ok(())
}
