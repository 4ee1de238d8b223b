//! # Local Git Helpers
//!
//! Queries and operations against the project's working tree, all shelled
//! out to the system `git` binary so SSH keys, credential helpers and
//! `~/.gitconfig` settings keep working exactly as they do for the
//! operator.

use std::path::{Path, PathBuf};

use ini::Ini;

use crate::error::{Error, Result};
use crate::process::{CommandLine, Runner};

/// One `[submodule "..."]` entry of `.gitmodules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submodule {
    pub name: String,
    pub path: PathBuf,
    pub url: String,
}

fn git_in(repo: &Path) -> CommandLine {
    CommandLine::new("git").current_dir(repo)
}

/// Fail when `repo` carries no git metadata.
pub fn ensure_repository(repo: &Path) -> Result<()> {
    if repo.join(".git").exists() {
        return Ok(());
    }
    Err(Error::Precondition {
        message: format!("{} is not a git repository", repo.display()),
        hint: Some("run 'odoo-toolbox submodule init' first".to_string()),
    })
}

/// Name of the currently checked-out branch.
pub fn current_branch(runner: &dyn Runner, repo: &Path) -> Result<String> {
    let out = runner.run_captured(&git_in(repo).args(["rev-parse", "--abbrev-ref", "HEAD"]))?;
    Ok(out.stdout.trim().to_string())
}

/// Abbreviated hash of the current commit.
pub fn short_hash(runner: &dyn Runner, repo: &Path) -> Result<String> {
    let out = runner.run_captured(&git_in(repo).args(["rev-parse", "--short", "HEAD"]))?;
    Ok(out.stdout.trim().to_string())
}

/// Remote names configured in `repo`.
pub fn remotes(runner: &dyn Runner, repo: &Path) -> Result<Vec<String>> {
    let out = runner.run_captured(&git_in(repo).arg("remote"))?;
    Ok(out.stdout.lines().map(|l| l.trim().to_string()).collect())
}

/// Shallow-clone `url` at `ref_name` into `target_dir`.
///
/// Used by `project checkout-local-odoo` to materialize the core Odoo
/// source at the tracked series branch.
pub fn clone_shallow(runner: &dyn Runner, url: &str, ref_name: &str, target_dir: &Path) -> Result<()> {
    if target_dir.join(".git").exists() {
        return Err(Error::precondition(format!(
            "{} is already a git checkout",
            target_dir.display()
        )));
    }
    if let Some(parent) = target_dir.parent() {
        std::fs::create_dir_all(parent)?;
    }
    runner.run(
        &CommandLine::new("git")
            .args(["clone", "--depth=1", "--branch", ref_name, url])
            .arg(target_dir.to_string_lossy()),
    )
}

/// Parse `.gitmodules` at the project root.
pub fn submodules(root: &Path) -> Result<Vec<Submodule>> {
    let gitmodules = root.join(".gitmodules");
    if !gitmodules.is_file() {
        return Ok(Vec::new());
    }
    let ini = Ini::load_from_file(&gitmodules)?;
    let mut result = Vec::new();
    for (section, properties) in ini.iter() {
        let Some(section) = section else { continue };
        let Some(name) = section
            .strip_prefix("submodule \"")
            .and_then(|s| s.strip_suffix('"'))
        else {
            continue;
        };
        let (Some(path), Some(url)) = (properties.get("path"), properties.get("url")) else {
            continue;
        };
        result.push(Submodule {
            name: name.to_string(),
            path: PathBuf::from(path),
            url: url.to_string(),
        });
    }
    Ok(result)
}

/// `git submodule update --init [--recursive] [path]`.
pub fn submodule_update(
    runner: &dyn Runner,
    root: &Path,
    path: Option<&Path>,
    recursive: bool,
) -> Result<()> {
    let mut cmd = git_in(root).args(["submodule", "update", "--init"]);
    if recursive {
        cmd = cmd.arg("--recursive");
    }
    if let Some(path) = path {
        cmd = cmd.arg(path.to_string_lossy());
    }
    runner.run(&cmd)
}

/// `git submodule sync` so remote URL edits in `.gitmodules` take effect.
pub fn submodule_sync(runner: &dyn Runner, root: &Path) -> Result<()> {
    runner.run(&git_in(root).args(["submodule", "sync"]))
}

/// Register `name` → `url` as a remote of `repo`, replacing a stale URL.
pub fn ensure_remote(runner: &dyn Runner, repo: &Path, name: &str, url: &str) -> Result<()> {
    let existing = remotes(runner, repo)?;
    if existing.iter().any(|r| r == name) {
        runner.run(&git_in(repo).args(["remote", "set-url", name, url]))
    } else {
        runner.run(&git_in(repo).args(["remote", "add", name, url]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_submodules_parse_gitmodules() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".gitmodules"),
            "[submodule \"odoo/src\"]\n\
             \tpath = odoo/src\n\
             \turl = git@github.com:odoo/odoo.git\n\
             [submodule \"odoo/external-src/edi\"]\n\
             \tpath = odoo/external-src/edi\n\
             \turl = git@github.com:OCA/edi.git\n",
        )
        .unwrap();

        let subs = submodules(temp.path()).unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].name, "odoo/src");
        assert_eq!(subs[0].path, PathBuf::from("odoo/src"));
        assert_eq!(subs[1].url, "git@github.com:OCA/edi.git");
    }

    #[test]
    fn test_submodules_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(submodules(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_ensure_repository() {
        let temp = TempDir::new().unwrap();
        assert!(ensure_repository(temp.path()).is_err());
        fs::create_dir(temp.path().join(".git")).unwrap();
        assert!(ensure_repository(temp.path()).is_ok());
    }
}
