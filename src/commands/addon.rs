//! # Addon Command Implementation
//!
//! This module implements the `addon` subcommand group, which pins addon
//! packages into the project's `requirements.txt`.
//!
//! ## Functionality
//!
//! - **Name Resolution**: Plain addon names are mapped to their
//!   package-index names for the tracked series
//! - **Version Lookup**: Without `--version`, the latest published version
//!   is fetched from the package index
//! - **PR Pinning**: `--pr` pins the addon to a pull-request head through
//!   a VCS requirement line instead of an index release

use anyhow::Result;
use clap::{Args, Subcommand};

use odoo_toolbox::github::PullRequestRef;
use odoo_toolbox::project::Project;
use odoo_toolbox::pypi::{IndexClient, VersionCache};
use odoo_toolbox::requirements::{
    full_version, resolve_package_name, upsert_requirement, RequirementEntry,
};

/// Addon requirement management
#[derive(Subcommand, Debug)]
pub enum AddonCommand {
    /// Add or update an addon pin in requirements.txt
    Add(AddArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Addon name (e.g. edi_oca) or full package name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Pin this exact version instead of asking the package index
    #[arg(long, value_name = "VERSION", conflicts_with = "pr")]
    pub version: Option<String>,

    /// Pin the addon to a pull request head instead of a release
    #[arg(long, value_name = "URL")]
    pub pr: Option<String>,
}

/// Execute the `addon` command.
pub fn execute(cmd: AddonCommand) -> Result<()> {
    match cmd {
        AddonCommand::Add(args) => add(args),
    }
}

fn add(args: AddArgs) -> Result<()> {
    let project = Project::discover()?;
    let package = resolve_package_name(&args.name, project.series()?);
    let requirements = project.requirements_path();

    let entry = if let Some(pr_url) = &args.pr {
        let pr = PullRequestRef::parse(pr_url)?;
        let uri = format!(
            "git+https://github.com/{}/{}@{}#subdirectory=setup/{}",
            pr.upstream,
            pr.repo,
            pr.merge_ref(),
            args.name
        );
        RequirementEntry::vcs(package.clone(), uri)
    } else {
        let latest = match &args.version {
            Some(version) => version.clone(),
            None => {
                let client = IndexClient::new();
                let mut cache = VersionCache::new();
                client.latest_version(&mut cache, &package)?
            }
        };
        RequirementEntry::pinned(
            package.clone(),
            full_version(&project.marker.odoo_version, &latest),
        )
    };

    upsert_requirement(&requirements, &entry)?;
    println!("✅ pinned {} in {}", entry, requirements.display());
    Ok(())
}
