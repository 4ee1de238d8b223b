//! # Db Command Implementation
//!
//! This module implements the `db` subcommand group: database chores run
//! through the project's docker compose stack. Destructive operations ask
//! for confirmation unless `--yes` is passed.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use odoo_toolbox::confirm::{Always, Confirm, Interactive};
use odoo_toolbox::database::DbDriver;
use odoo_toolbox::error::Error;
use odoo_toolbox::process::SystemRunner;
use odoo_toolbox::project::Project;

/// Database management
#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// List databases
    List,
    /// Create an empty database
    Create(NameArgs),
    /// Drop a database
    Drop(DropArgs),
    /// Dump a database to a local file (custom format)
    Dump(FileArgs),
    /// Restore a dump into a new database
    Restore(FileArgs),
    /// List installed module versions of a database
    ListVersions(NameArgs),
}

#[derive(Args, Debug)]
pub struct NameArgs {
    /// Database name
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct DropArgs {
    /// Database name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Drop without asking
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct FileArgs {
    /// Database name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Dump file path
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute the `db` command.
pub fn execute(cmd: DbCommand) -> Result<()> {
    let project = Project::discover()?;
    let runner = SystemRunner;
    let driver = DbDriver::new(&runner, &project.root);
    match cmd {
        DbCommand::List => {
            for name in driver.list()? {
                println!("{}", name);
            }
            Ok(())
        }
        DbCommand::Create(args) => {
            driver.create(&args.name)?;
            println!("✅ created {}", args.name);
            Ok(())
        }
        DbCommand::Drop(args) => {
            let confirm: Box<dyn Confirm> = if args.yes {
                Box::new(Always(true))
            } else {
                Box::new(Interactive)
            };
            let go = confirm.confirm(&format!("Drop database {}?", args.name), false)?;
            if !go {
                return Err(Error::Aborted.into());
            }
            driver.drop(&args.name)?;
            println!("🗑  dropped {}", args.name);
            Ok(())
        }
        DbCommand::Dump(args) => {
            driver.dump(&args.name, &args.file)?;
            println!("✅ dumped {} to {}", args.name, args.file.display());
            Ok(())
        }
        DbCommand::Restore(args) => {
            driver.restore(&args.name, &args.file)?;
            println!("✅ restored {} from {}", args.name, args.file.display());
            Ok(())
        }
        DbCommand::ListVersions(args) => {
            for (module, version) in driver.list_versions(&args.name)? {
                println!("{} {}", module, version);
            }
            Ok(())
        }
    }
}
