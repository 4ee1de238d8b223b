//! # Pending-Merge Descriptors
//!
//! The core of the toolbox: per-repository YAML descriptors declaring what
//! upstream state a vendored repository must aggregate, and the commands
//! that mutate and reconcile them.
//!
//! A descriptor lives under the configured pending-merge directory, one
//! file per tracked repository, keyed by the repository path relative to
//! that directory (the layout the external aggregator expects):
//!
//! ```yaml
//! ../odoo/external-src/edi:
//!   remotes:
//!     OCA: git@github.com:OCA/edi.git
//!     camptocamp: git@github.com:camptocamp/edi.git
//!   target: camptocamp merge-branch-acme_corp-master-abc1234
//!   merges:
//!     - OCA 14.0
//!     - OCA refs/pull/778/head
//! ```
//!
//! Invariant: `merges[0]` is always the base-branch line. Pull-request
//! entries are inserted immediately after it, so base-branch updates stay
//! the aggregation root and PRs apply on top in addition order. Tracked
//! commits and patches use `shell_command_after` instead of `merges`.
//!
//! A descriptor exists only while there is something worth tracking: it is
//! created by the first add (or by an explicit template generation) and
//! deleted when the last pull request and shell command are removed.
//!
//! The actual fetch/rebase/push is delegated to the external
//! `gitaggregate` tool; this module only manages the state file and builds
//! the invocation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::confirm::Confirm;
use crate::error::{Error, Result};
use crate::git;
use crate::github::{ForgeClient, Lifecycle, PullRequestRef};
use crate::process::{CommandLine, Runner};
use crate::project::Project;

/// Name under which the core Odoo repository is tracked.
pub const CORE_REPO_NAME: &str = "odoo";

/// Organisation maintaining the branch-compatible fork of core Odoo.
const COMMUNITY_ORG: &str = "OCA";
/// Name of the community fork repository of core Odoo.
const COMMUNITY_CORE_REPO: &str = "OCB";
/// The vendor's canonical organisation and repository name.
const VENDOR_ORG: &str = "odoo";

/// Identifies one tracked repository and the paths derived from its name.
///
/// The derived paths are pure functions of the name and the project
/// configuration: the core Odoo repository maps to the configured
/// `odoo_src` path, every other name to `ext_src/<name>`.
#[derive(Debug, Clone)]
pub struct RepoDescriptor {
    pub name: String,
    root: PathBuf,
    rel_path: PathBuf,
    merges_file: PathBuf,
    yaml_key: String,
}

impl RepoDescriptor {
    pub fn new(project: &Project, name: &str) -> Self {
        let rel_path = if name == CORE_REPO_NAME {
            project.config.odoo_src.clone()
        } else {
            project.config.ext_src.join(name)
        };
        let merges_file = project.pending_merge_path().join(format!("{}.yml", name));
        let ups = "../".repeat(project.config.pending_merge.components().count());
        let yaml_key = format!("{}{}", ups, rel_path.display());
        RepoDescriptor {
            name: name.to_string(),
            root: project.root.clone(),
            rel_path,
            merges_file,
            yaml_key,
        }
    }

    /// Absolute path of the repository checkout.
    pub fn checkout_path(&self) -> PathBuf {
        self.root.join(&self.rel_path)
    }

    /// Absolute path of the descriptor file.
    pub fn merges_path(&self) -> &Path {
        &self.merges_file
    }

    /// Whether this descriptor tracks core Odoo.
    pub fn is_core(&self) -> bool {
        self.name == CORE_REPO_NAME
    }

    /// The GitHub repository name upstreams publish under.
    ///
    /// External addon repositories share their tracked name; core Odoo is
    /// `odoo` at the vendor and `OCB` at the community organisation.
    fn forge_repo(&self, org: &str) -> String {
        if self.is_core() && org != VENDOR_ORG {
            COMMUNITY_CORE_REPO.to_string()
        } else if self.is_core() {
            VENDOR_ORG.to_string()
        } else {
            self.name.clone()
        }
    }

    fn remote_url(&self, org: &str) -> String {
        format!("git@github.com:{}/{}.git", org, self.forge_repo(org))
    }
}

/// Parsed content of one pending-merge YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeConfig {
    /// Remote name → URL.
    pub remotes: BTreeMap<String, String>,
    /// `"<remote> <branch>"` the aggregation result is pushed to.
    pub target: String,
    /// Ordered merge instructions; `merges[0]` is the base branch.
    pub merges: Vec<String>,
    /// Extra commands run after aggregation (cherry-picks, patches).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shell_command_after: Vec<String>,
}

impl MergeConfig {
    /// Whether nothing but the base-branch line is left.
    pub fn is_empty(&self) -> bool {
        self.merges.len() <= 1 && self.shell_command_after.is_empty()
    }

    /// Pull-request references recorded in `merges`, with the owner/repo
    /// resolved from the remote URL.
    pub fn pull_requests(&self) -> Vec<PullRequestRef> {
        let pull_re = Regex::new(r"^refs/pull/(\d+)/head$").unwrap();
        let mut result = Vec::new();
        for line in &self.merges {
            let Some((remote, r#ref)) = line.split_once(' ') else {
                continue;
            };
            let Some(caps) = pull_re.captures(r#ref.trim()) else {
                continue;
            };
            let Some(url) = self.remotes.get(remote) else {
                continue;
            };
            let Some((owner, repo)) = parse_forge_slug(url) else {
                continue;
            };
            result.push(PullRequestRef {
                upstream: owner,
                repo,
                number: caps[1].parse().unwrap_or(0),
            });
        }
        result
    }
}

/// Extract `owner/repo` from an SSH or HTTPS forge URL.
fn parse_forge_slug(url: &str) -> Option<(String, String)> {
    let slug_re = Regex::new(r"github\.com[:/]([^/]+)/([^/]+?)(?:\.git)?/?$").unwrap();
    let caps = slug_re.captures(url)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Manager for the descriptor files of one project.
pub struct Tracker<'a> {
    project: &'a Project,
    runner: &'a dyn Runner,
}

impl<'a> Tracker<'a> {
    pub fn new(project: &'a Project, runner: &'a dyn Runner) -> Self {
        Tracker { project, runner }
    }

    pub fn descriptor(&self, name: &str) -> RepoDescriptor {
        RepoDescriptor::new(self.project, name)
    }

    /// Load the descriptor file for `repo`, if it exists.
    pub fn load(&self, repo: &RepoDescriptor) -> Result<Option<MergeConfig>> {
        if !repo.merges_path().is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(repo.merges_path())?;
        let mut document: BTreeMap<String, MergeConfig> = serde_yaml::from_str(&content)?;
        document
            .remove(&repo.yaml_key)
            .or_else(|| {
                // Hand-edited files sometimes use a different relative
                // spelling; fall back to the single entry.
                let mut values: Vec<_> = document.into_values().collect();
                (values.len() == 1).then(|| values.remove(0))
            })
            .map(Some)
            .ok_or_else(|| Error::PendingMerge {
                repo: repo.name.clone(),
                message: format!(
                    "{} does not describe {}",
                    repo.merges_path().display(),
                    repo.yaml_key
                ),
            })
    }

    /// Load the descriptor, failing when it does not exist.
    pub fn load_required(&self, repo: &RepoDescriptor) -> Result<MergeConfig> {
        self.load(repo)?.ok_or_else(|| Error::Precondition {
            message: format!("no pending merges tracked for {}", repo.name),
            hint: Some(format!("expected descriptor {}", repo.merges_path().display())),
        })
    }

    /// Write the descriptor file, creating the directory when needed.
    pub fn save(&self, repo: &RepoDescriptor, config: &MergeConfig) -> Result<()> {
        let mut document = BTreeMap::new();
        document.insert(repo.yaml_key.clone(), config.clone());
        if let Some(parent) = repo.merges_path().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(repo.merges_path(), serde_yaml::to_string(&document)?)?;
        Ok(())
    }

    /// Delete the descriptor file.
    fn delete(&self, repo: &RepoDescriptor) -> Result<()> {
        fs::remove_file(repo.merges_path())?;
        Ok(())
    }

    /// Create a fresh descriptor tracking only the base branch.
    ///
    /// For core Odoo with the vendor's canonical organisation the operator
    /// is asked whether to aggregate `odoo/odoo` directly; declining falls
    /// back to the community `OCA/OCB` fork (the default for everything
    /// pinned to a stable series). This is the one interactive decision in
    /// the component.
    pub fn generate_template(
        &self,
        repo: &RepoDescriptor,
        upstream: &str,
        confirm: &dyn Confirm,
    ) -> Result<MergeConfig> {
        let mut upstream = upstream.to_string();
        if repo.is_core() && upstream == VENDOR_ORG {
            let direct = confirm.confirm(
                "Aggregate odoo/odoo directly? (default is the OCA/OCB fork)",
                false,
            )?;
            if !direct {
                upstream = COMMUNITY_ORG.to_string();
            }
        }

        let mut remotes = BTreeMap::new();
        remotes.insert(upstream.clone(), repo.remote_url(&upstream));
        let company = &self.project.config.company_remote;
        remotes.insert(company.clone(), repo.remote_url(company));

        let config = MergeConfig {
            remotes,
            target: format!(
                "{} merge-branch-{}-master",
                company, self.project.marker.project_id
            ),
            merges: vec![format!("{} {}", upstream, self.project.marker.odoo_version)],
            shell_command_after: Vec::new(),
        };
        self.save(repo, &config)?;
        Ok(config)
    }

    /// Track a pull request for aggregation.
    ///
    /// Creates the descriptor when the repository is untracked, registers
    /// the upstream remote when unknown, and inserts the merge line at
    /// position 1, immediately after the base branch, never at the end.
    pub fn add_pull_request(
        &self,
        repo: &RepoDescriptor,
        pr: &PullRequestRef,
        forge: Option<&ForgeClient>,
        confirm: &dyn Confirm,
    ) -> Result<()> {
        let mut config = match self.load(repo)? {
            Some(config) => config,
            None => self.generate_template(repo, &pr.upstream, confirm)?,
        };

        let line = format!("{} {}", pr.upstream, pr.merge_ref());
        if config.merges.contains(&line) {
            return Err(Error::PendingMerge {
                repo: repo.name.clone(),
                message: format!("{} already mentioned in {}", line, repo.merges_path().display()),
            });
        }

        if let Some(forge) = forge {
            match forge.pull_request(pr) {
                Ok(info) if info.base.r#ref != self.project.marker.odoo_version => {
                    warn!(
                        "PR #{} targets base branch {} (project tracks {})",
                        pr.number, info.base.r#ref, self.project.marker.odoo_version
                    );
                    println!(
                        "⚠️  PR #{} targets {}, not {}",
                        pr.number, info.base.r#ref, self.project.marker.odoo_version
                    );
                }
                Ok(_) => {}
                Err(e) => warn!("cannot check base branch of PR #{}: {}", pr.number, e),
            }
        }

        config
            .remotes
            .entry(pr.upstream.clone())
            .or_insert_with(|| repo.remote_url(&pr.upstream));
        config.merges.insert(1, line);
        self.save(repo, &config)
    }

    /// Stop tracking a pull request.
    ///
    /// Fails loudly when the exact merge line is absent; deletes the
    /// descriptor file when nothing worth tracking remains.
    pub fn remove_pull_request(&self, repo: &RepoDescriptor, pr: &PullRequestRef) -> Result<()> {
        let mut config = self.load_required(repo)?;
        let line = format!("{} {}", pr.upstream, pr.merge_ref());
        let position =
            config
                .merges
                .iter()
                .position(|m| m == &line)
                .ok_or_else(|| Error::PendingMerge {
                    repo: repo.name.clone(),
                    message: format!("no such reference found: {}", line),
                })?;
        config.merges.remove(position);

        if config.is_empty() {
            self.delete(repo)?;
            println!("🗑  {} has no pending merges left, descriptor removed", repo.name);
        } else {
            self.save(repo, &config)?;
        }
        Ok(())
    }

    fn commit_lines(remote: &str, sha: &str) -> (String, String) {
        (
            format!("git fetch {}", remote),
            format!("git cherry-pick {}", sha),
        )
    }

    /// Track a single commit through `shell_command_after`.
    ///
    /// Same look-before-you-leap validation as pull requests: a duplicate
    /// add is rejected without mutating the file.
    pub fn add_commit(
        &self,
        repo: &RepoDescriptor,
        remote: &str,
        sha: &str,
        confirm: &dyn Confirm,
    ) -> Result<()> {
        let mut config = match self.load(repo)? {
            Some(config) => config,
            None => self.generate_template(repo, remote, confirm)?,
        };
        let (fetch, pick) = Self::commit_lines(remote, sha);
        if config.shell_command_after.contains(&pick) {
            return Err(Error::PendingMerge {
                repo: repo.name.clone(),
                message: format!("{} already mentioned in {}", sha, repo.merges_path().display()),
            });
        }
        config
            .remotes
            .entry(remote.to_string())
            .or_insert_with(|| repo.remote_url(remote));
        config.shell_command_after.push(fetch);
        config.shell_command_after.push(pick);
        self.save(repo, &config)
    }

    /// Stop tracking a commit; both the fetch and cherry-pick lines must
    /// be present.
    pub fn remove_commit(&self, repo: &RepoDescriptor, remote: &str, sha: &str) -> Result<()> {
        let mut config = self.load_required(repo)?;
        let (fetch, pick) = Self::commit_lines(remote, sha);
        let has_both = config.shell_command_after.contains(&fetch)
            && config.shell_command_after.contains(&pick);
        if !has_both {
            return Err(Error::PendingMerge {
                repo: repo.name.clone(),
                message: format!("no such reference found: {}", sha),
            });
        }
        config
            .shell_command_after
            .retain(|line| line != &fetch && line != &pick);

        if config.is_empty() {
            self.delete(repo)?;
            println!("🗑  {} has no pending merges left, descriptor removed", repo.name);
        } else {
            self.save(repo, &config)?;
        }
        Ok(())
    }

    /// Derive the aggregation target branch.
    ///
    /// `merge-branch-<project_id>-<branch>-<shorthash>` of the project
    /// repository, so a generated branch is traceable back to the commit
    /// that triggered it.
    pub fn target_branch(&self) -> Result<String> {
        git::ensure_repository(&self.project.root)?;
        let branch = git::current_branch(self.runner, &self.project.root)?;
        let hash = git::short_hash(self.runner, &self.project.root)?;
        Ok(format!(
            "merge-branch-{}-{}-{}",
            self.project.marker.project_id, branch, hash
        ))
    }

    /// Run the external aggregator against one descriptor.
    ///
    /// The descriptor's `target` is rewritten to the derived (or
    /// overridden) branch before the aggregator runs, then `gitaggregate`
    /// performs the fetch/merge/push.
    pub fn aggregate(
        &self,
        repo: &RepoDescriptor,
        push: bool,
        target_override: Option<&str>,
    ) -> Result<()> {
        let mut config = self.load_required(repo)?;
        git::ensure_repository(&repo.checkout_path())?;

        let branch = match target_override {
            Some(branch) => branch.to_string(),
            None => self.target_branch()?,
        };
        config.target = format!("{} {}", self.project.config.company_remote, branch);
        self.save(repo, &config)?;

        let mut cmd = CommandLine::new("gitaggregate")
            .arg("-c")
            .arg(repo.merges_path().to_string_lossy())
            .arg("-d")
            .arg(repo.checkout_path().to_string_lossy());
        if push {
            cmd = cmd.arg("-p");
        }
        println!("🔀 aggregating {} onto {}", repo.name, branch);
        self.runner.run(&cmd)
    }

    /// Names of all repositories with a descriptor file.
    pub fn tracked_repos(&self) -> Result<Vec<String>> {
        let dir = self.project.pending_merge_path();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// All tracked pull requests with their lifecycle state, grouped per
    /// repository. Forge lookups that fail are reported as `None` state
    /// rather than aborting the listing.
    pub fn collect_pull_requests(
        &self,
        forge: &ForgeClient,
    ) -> Result<Vec<(String, PullRequestRef, Option<Lifecycle>)>> {
        let mut result = Vec::new();
        for name in self.tracked_repos()? {
            let repo = self.descriptor(&name);
            let config = self.load_required(&repo)?;
            for pr in config.pull_requests() {
                let lifecycle = match forge.pull_request(&pr) {
                    Ok(info) => Some(info.lifecycle()),
                    Err(e) => {
                        warn!("cannot fetch {}/{}#{}: {}", pr.upstream, pr.repo, pr.number, e);
                        None
                    }
                };
                result.push((name.clone(), pr, lifecycle));
            }
        }
        Ok(result)
    }

    /// Remove every tracked pull request in the given lifecycle bucket.
    ///
    /// Best-effort: a failure removing one entry is logged and skipped,
    /// never fatal to the batch. Returns the number of removed entries.
    pub fn purge(&self, forge: &ForgeClient, bucket: Lifecycle) -> Result<usize> {
        let mut removed = 0;
        for (name, pr, lifecycle) in self.collect_pull_requests(forge)? {
            if lifecycle != Some(bucket) {
                continue;
            }
            let repo = self.descriptor(&name);
            match self.remove_pull_request(&repo, &pr) {
                Ok(()) => {
                    println!("➖ removed {}/{}#{} from {}", pr.upstream, pr.repo, pr.number, name);
                    removed += 1;
                }
                Err(e) => warn!("cannot purge {}#{}: {}", pr.repo, pr.number, e),
            }
        }
        Ok(removed)
    }
}
