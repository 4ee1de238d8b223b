//! # Submodule Command Implementation
//!
//! This module implements the `submodule` subcommand group: thin wrappers
//! over `git submodule` for the project's vendored repositories.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use odoo_toolbox::git;
use odoo_toolbox::process::SystemRunner;
use odoo_toolbox::project::Project;

/// Git submodule helpers
#[derive(Subcommand, Debug)]
pub enum SubmoduleCommand {
    /// Initialize and fetch every submodule
    Init,
    /// List submodules declared in .gitmodules
    Ls,
    /// Update submodules (optionally a single path)
    Update(UpdateArgs),
    /// Sync remote URLs after .gitmodules edits
    Sync,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Limit the update to one submodule path
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Recurse into nested submodules
    #[arg(short, long)]
    pub recursive: bool,
}

/// Execute the `submodule` command.
pub fn execute(cmd: SubmoduleCommand) -> Result<()> {
    let project = Project::discover()?;
    let runner = SystemRunner;
    git::ensure_repository(&project.root)?;
    match cmd {
        SubmoduleCommand::Init => {
            git::submodule_sync(&runner, &project.root)?;
            git::submodule_update(&runner, &project.root, None, false)?;
            println!("✅ submodules initialized");
            Ok(())
        }
        SubmoduleCommand::Ls => {
            for sub in git::submodules(&project.root)? {
                println!("{}  {}", sub.path.display(), sub.url);
            }
            Ok(())
        }
        SubmoduleCommand::Update(args) => {
            git::submodule_update(
                &runner,
                &project.root,
                args.path.as_deref(),
                args.recursive,
            )?;
            println!("✅ submodules updated");
            Ok(())
        }
        SubmoduleCommand::Sync => {
            git::submodule_sync(&runner, &project.root)?;
            println!("✅ submodule URLs synced");
            Ok(())
        }
    }
}
