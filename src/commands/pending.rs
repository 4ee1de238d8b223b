//! # Pending Command Implementation
//!
//! This module implements the `pending` subcommand group, the front door to
//! the pending-merge descriptors: listing tracked pull requests with their
//! forge state, adding and removing references, running the aggregator and
//! upgrading descriptors after upstream releases.
//!
//! ## Reference Forms
//!
//! `add` and `remove` accept two reference shapes:
//!
//! - A pull-request URL (`https://github.com/OCA/edi/pull/778`): the
//!   repository is inferred from the URL unless `--repo` overrides it
//! - A commit sha (7 to 40 hex digits), tracked as a cherry-pick;
//!   `--repo` is required because a sha carries no repository

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use regex::Regex;

use odoo_toolbox::confirm::{Always, Confirm, Interactive};
use odoo_toolbox::error::Error;
use odoo_toolbox::github::{ForgeClient, Lifecycle, PullRequestRef};
use odoo_toolbox::output::{emoji, OutputConfig};
use odoo_toolbox::pending::{Tracker, CORE_REPO_NAME};
use odoo_toolbox::process::SystemRunner;
use odoo_toolbox::project::Project;

/// Pending-merge descriptor management
#[derive(Subcommand, Debug)]
pub enum PendingCommand {
    /// List tracked pull requests and their forge state
    Show,
    /// Run the aggregator for tracked repositories
    Aggregate(AggregateArgs),
    /// Track a pull request or commit
    Add(RefArgs),
    /// Stop tracking a pull request or commit
    Remove(RefArgs),
    /// Report merged pull requests and optionally purge them
    Upgrade(UpgradeArgs),
}

#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// Repository to aggregate (default: every tracked repository)
    #[arg(value_name = "REPO")]
    pub repo: Option<String>,

    /// Push the aggregation result to the target branch
    #[arg(short, long)]
    pub push: bool,

    /// Override the derived target branch name
    #[arg(long, value_name = "BRANCH")]
    pub target: Option<String>,
}

#[derive(Args, Debug)]
pub struct RefArgs {
    /// Pull request URL or commit sha
    #[arg(value_name = "REFERENCE")]
    pub reference: String,

    /// Repository name (inferred from a PR URL, required for a sha)
    #[arg(short, long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Remote the commit is fetched from (sha references only)
    #[arg(long, value_name = "REMOTE", default_value = "OCA")]
    pub upstream: String,

    /// Answer yes to every prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Remove every tracked PR in this lifecycle bucket
    #[arg(long, value_enum, value_name = "BUCKET")]
    pub purge: Option<PurgeBucket>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PurgeBucket {
    /// Closed without merging
    Closed,
    /// Merged upstream
    Merged,
}

impl From<PurgeBucket> for Lifecycle {
    fn from(bucket: PurgeBucket) -> Self {
        match bucket {
            PurgeBucket::Closed => Lifecycle::Closed,
            PurgeBucket::Merged => Lifecycle::Merged,
        }
    }
}

/// Execute the `pending` command.
pub fn execute(cmd: PendingCommand, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let project = Project::discover()?;
    let runner = SystemRunner;
    let tracker = Tracker::new(&project, &runner);
    match cmd {
        PendingCommand::Show => show(&tracker, &out),
        PendingCommand::Aggregate(args) => aggregate(&tracker, args),
        PendingCommand::Add(args) => add(&project, &tracker, args, &out),
        PendingCommand::Remove(args) => remove(&tracker, args, &out),
        PendingCommand::Upgrade(args) => upgrade(&tracker, args, &out),
    }
}

fn show(tracker: &Tracker, out: &OutputConfig) -> Result<()> {
    let forge = ForgeClient::from_env();
    let entries = tracker.collect_pull_requests(&forge)?;
    if entries.is_empty() {
        println!("No pending merges tracked.");
        return Ok(());
    }
    let mut current_repo = String::new();
    for (repo, pr, lifecycle) in entries {
        if repo != current_repo {
            println!("{} {}", emoji(out, "📁", "[repo]"), repo);
            current_repo = repo;
        }
        let state = lifecycle
            .map(|l| l.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  #{} {}/{} ({})",
            pr.number, pr.upstream, pr.repo, state
        );
    }
    Ok(())
}

fn aggregate(tracker: &Tracker, args: AggregateArgs) -> Result<()> {
    let names = match args.repo {
        Some(name) => vec![name],
        None => tracker.tracked_repos()?,
    };
    if names.is_empty() {
        println!("No pending merges tracked.");
        return Ok(());
    }
    for name in names {
        let repo = tracker.descriptor(&name);
        tracker.aggregate(&repo, args.push, args.target.as_deref())?;
    }
    Ok(())
}

/// Classify a reference string as a commit sha or a pull-request URL.
fn is_commit_sha(reference: &str) -> bool {
    Regex::new(r"^[0-9a-f]{7,40}$").unwrap().is_match(reference)
}

/// Pick the descriptor a PR URL maps to: the core repo for both the
/// vendor's and the community fork of Odoo, the forge repository name
/// otherwise.
fn repo_for_pr(pr: &PullRequestRef, override_name: Option<&str>) -> String {
    if let Some(name) = override_name {
        return name.to_string();
    }
    if pr.repo == "odoo" || pr.repo == "OCB" {
        CORE_REPO_NAME.to_string()
    } else {
        pr.repo.clone()
    }
}

fn confirm_policy(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(Always(true))
    } else {
        Box::new(Interactive)
    }
}

fn add(project: &Project, tracker: &Tracker, args: RefArgs, out: &OutputConfig) -> Result<()> {
    let confirm = confirm_policy(args.yes);
    if is_commit_sha(&args.reference) {
        let name = args.repo.as_deref().ok_or_else(|| Error::Precondition {
            message: "a commit sha carries no repository name".to_string(),
            hint: Some("pass --repo <name>".to_string()),
        })?;
        let repo = tracker.descriptor(name);
        tracker.add_commit(&repo, &args.upstream, &args.reference, confirm.as_ref())?;
        println!(
            "{} tracking commit {} in {}",
            emoji(out, "➕", "[ADD]"),
            args.reference,
            name
        );
        return Ok(());
    }

    let pr = PullRequestRef::parse(&args.reference)?;
    let name = repo_for_pr(&pr, args.repo.as_deref());
    let repo = tracker.descriptor(&name);
    let forge = ForgeClient::from_env();
    tracker.add_pull_request(&repo, &pr, Some(&forge), confirm.as_ref())?;
    println!(
        "{} tracking {}/{}#{} in {} (series {})",
        emoji(out, "➕", "[ADD]"),
        pr.upstream,
        pr.repo,
        pr.number,
        name,
        project.marker.odoo_version
    );
    Ok(())
}

fn remove(tracker: &Tracker, args: RefArgs, out: &OutputConfig) -> Result<()> {
    if is_commit_sha(&args.reference) {
        let name = args.repo.as_deref().ok_or_else(|| Error::Precondition {
            message: "a commit sha carries no repository name".to_string(),
            hint: Some("pass --repo <name>".to_string()),
        })?;
        let repo = tracker.descriptor(name);
        tracker.remove_commit(&repo, &args.upstream, &args.reference)?;
        println!(
            "{} stopped tracking commit {}",
            emoji(out, "➖", "[DEL]"),
            args.reference
        );
        return Ok(());
    }

    let pr = PullRequestRef::parse(&args.reference)?;
    let name = repo_for_pr(&pr, args.repo.as_deref());
    let repo = tracker.descriptor(&name);
    tracker.remove_pull_request(&repo, &pr)?;
    println!(
        "{} stopped tracking {}/{}#{}",
        emoji(out, "➖", "[DEL]"),
        pr.upstream,
        pr.repo,
        pr.number
    );
    Ok(())
}

fn upgrade(tracker: &Tracker, args: UpgradeArgs, out: &OutputConfig) -> Result<()> {
    let forge = ForgeClient::from_env();
    match args.purge {
        Some(bucket) => {
            let removed = tracker.purge(&forge, bucket.into())?;
            println!("Purged {} pull request(s).", removed);
        }
        None => {
            let mut stale = 0;
            for (repo, pr, lifecycle) in tracker.collect_pull_requests(&forge)? {
                if matches!(lifecycle, Some(Lifecycle::Merged) | Some(Lifecycle::Closed)) {
                    println!(
                        "{} {}/{}#{} in {} is {}",
                        emoji(out, "🪦", "[STALE]"),
                        pr.upstream,
                        pr.repo,
                        pr.number,
                        repo,
                        lifecycle.unwrap()
                    );
                    stale += 1;
                }
            }
            if stale == 0 {
                println!("Every tracked pull request is still open.");
            } else {
                println!("Re-run with --purge merged (or --purge closed) to remove them.");
            }
        }
    }
    Ok(())
}
