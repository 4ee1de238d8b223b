//! # Project Command Implementation
//!
//! This module implements the `project` subcommand group: scaffolding a
//! new project tree and materializing the core Odoo checkout.

use anyhow::Result;
use clap::{Args, Subcommand};

use odoo_toolbox::git;
use odoo_toolbox::process::SystemRunner;
use odoo_toolbox::project::Project;
use odoo_toolbox::scaffold::{self, ScaffoldOutcome};

/// Project scaffolding
#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Scaffold the project template files into the current directory
    Init(InitArgs),
    /// Shallow-clone core Odoo at the tracked series branch
    CheckoutLocalOdoo(CheckoutArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project identifier (used in generated branch names)
    #[arg(value_name = "PROJECT_ID")]
    pub project_id: String,

    /// Tracked Odoo series, e.g. 14.0
    #[arg(long, value_name = "SERIES")]
    pub odoo_version: String,

    /// Git remote name of the team's fork
    #[arg(long, value_name = "REMOTE", default_value = "camptocamp")]
    pub company: String,

    /// Overwrite existing files (backups are taken where configured)
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Clone URL (default: the community OCB fork)
    #[arg(long, value_name = "URL", default_value = "https://github.com/OCA/OCB.git")]
    pub url: String,
}

/// Execute the `project` command.
pub fn execute(cmd: ProjectCommand) -> Result<()> {
    match cmd {
        ProjectCommand::Init(args) => init(args),
        ProjectCommand::CheckoutLocalOdoo(args) => checkout_local_odoo(args),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let root = std::env::current_dir()?;
    let vars = scaffold::project_vars(&args.project_id, &args.odoo_version, &args.company);
    for outcome in scaffold::init(&root, &vars, args.force)? {
        match outcome {
            ScaffoldOutcome::Written(path) => println!("✅ wrote {}", path.display()),
            ScaffoldOutcome::Kept(path) => println!("⏭  kept {}", path.display()),
        }
    }
    Ok(())
}

fn checkout_local_odoo(args: CheckoutArgs) -> Result<()> {
    let project = Project::discover()?;
    let runner = SystemRunner;
    let target = project.odoo_src_path();
    println!(
        "⬇️  cloning {} at {} into {}",
        args.url,
        project.marker.odoo_version,
        target.display()
    );
    git::clone_shallow(&runner, &args.url, &project.marker.odoo_version, &target)?;
    println!("✅ checkout ready");
    Ok(())
}
