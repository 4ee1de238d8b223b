//! # Project Version Management
//!
//! The project version is the single source of truth for releases. It
//! lives in the `VERSION` file named by the project configuration, with
//! `.bumpversion.cfg`'s `current_version` key kept in sync when that file
//! exists.
//!
//! Odoo project versions are series-prefixed, five-component strings:
//! `14.0.1.2.3` is series `14.0`, release `1.2.3`. Bumping never touches
//! the series: switching series is a migration, not a release.

use std::fmt;
use std::fs;
use std::path::Path;

use ini::{Ini, WriteOption};

use crate::error::{Error, Result};
use crate::project::Project;

/// A parsed project version: `<series>.<major>.<minor>.<patch>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectVersion {
    /// The Odoo series, e.g. `"14.0"`.
    pub series: String,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Which release component to bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl std::str::FromStr for BumpKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "major" => Ok(BumpKind::Major),
            "minor" => Ok(BumpKind::Minor),
            "patch" => Ok(BumpKind::Patch),
            other => Err(Error::Precondition {
                message: format!("unknown bump type {:?}", other),
                hint: Some("expected major, minor or patch".to_string()),
            }),
        }
    }
}

impl ProjectVersion {
    /// Parse a five-component version string.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.trim().split('.').collect();
        let invalid = || {
            Error::config(format!(
                "invalid project version {:?} (expected <series>.<major>.<minor>.<patch>)",
                raw.trim()
            ))
        };
        if parts.len() != 5 {
            return Err(invalid());
        }
        let numbers: Vec<u32> = parts[2..]
            .iter()
            .map(|p| p.parse().map_err(|_| invalid()))
            .collect::<Result<_>>()?;
        if parts[0].parse::<u32>().is_err() || parts[1].parse::<u32>().is_err() {
            return Err(invalid());
        }
        Ok(ProjectVersion {
            series: format!("{}.{}", parts[0], parts[1]),
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
        })
    }

    /// The next version for a release of the given kind.
    pub fn bump(&self, kind: BumpKind) -> ProjectVersion {
        let mut next = self.clone();
        match kind {
            BumpKind::Major => {
                next.major += 1;
                next.minor = 0;
                next.patch = 0;
            }
            BumpKind::Minor => {
                next.minor += 1;
                next.patch = 0;
            }
            BumpKind::Patch => next.patch += 1,
        }
        next
    }
}

impl fmt::Display for ProjectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.series, self.major, self.minor, self.patch)
    }
}

/// Read the current project version.
///
/// The `VERSION` file wins; when absent, `.bumpversion.cfg`'s
/// `current_version` is consulted.
pub fn current_version(project: &Project) -> Result<ProjectVersion> {
    let version_file = project.version_file_path();
    if version_file.is_file() {
        return ProjectVersion::parse(&fs::read_to_string(&version_file)?);
    }
    let bumpversion = project.root.join(".bumpversion.cfg");
    if bumpversion.is_file() {
        let ini = Ini::load_from_file(&bumpversion)?;
        if let Some(raw) = ini.get_from(Some("bumpversion"), "current_version") {
            return ProjectVersion::parse(raw);
        }
    }
    Err(Error::Precondition {
        message: format!("no project version found ({} is missing)", version_file.display()),
        hint: Some("run 'odoo-toolbox project init' to scaffold the version files".to_string()),
    })
}

/// Write the new version to the `VERSION` file and keep
/// `.bumpversion.cfg` in sync when present.
pub fn write_version(project: &Project, version: &ProjectVersion) -> Result<()> {
    let version_file = project.version_file_path();
    if let Some(parent) = version_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&version_file, format!("{}\n", version))?;

    let bumpversion = project.root.join(".bumpversion.cfg");
    if bumpversion.is_file() {
        let mut ini = Ini::load_from_file(&bumpversion)?;
        ini.with_section(Some("bumpversion"))
            .set("current_version", version.to_string());
        ini.write_to_file_opt(
            &bumpversion,
            WriteOption {
                kv_separator: " = ",
                ..WriteOption::default()
            },
        )?;
    }
    Ok(())
}

/// Append a release heading stub to the changelog, newest first.
pub fn append_changelog_stub(root: &Path, version: &ProjectVersion) -> Result<()> {
    let history = root.join("HISTORY.rst");
    if !history.is_file() {
        return Ok(());
    }
    let content = fs::read_to_string(&history)?;
    let marker = ".. towncrier release notes start";
    let heading = format!(
        "{}\n\n{}\n{}\n\n* TODO: describe this release\n",
        marker,
        version,
        "-".repeat(version.to_string().len())
    );
    let updated = if content.contains(marker) {
        content.replacen(marker, &heading, 1)
    } else {
        format!("{}\n{}", content, heading)
    };
    fs::write(&history, updated)?;
    Ok(())
}
