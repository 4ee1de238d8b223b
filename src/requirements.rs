//! # Requirements File Management
//!
//! Line-oriented parsing and editing of the project's pip-style
//! `requirements.txt`, plus the addon-to-package naming rules.
//!
//! ## Naming
//!
//! Odoo addons are published to the package index under series-dependent
//! names: `odoo<series>-addon-<name>` up to series 14, plain
//! `odoo-addon-<name>` from series 15 on. [`resolve_package_name`] applies
//! that rule and passes already-resolved names through unchanged.
//!
//! ## Comparison semantics
//!
//! [`version_allowed`] deliberately does **not** use semantic versioning.
//! Versions are compared component-wise as strings (so `"1.10"` sorts
//! before `"1.9"`), matching the comparison semantics of the requirement
//! files already in the wild.
//!
//! ## Replacement semantics
//!
//! [`replace_requirement`] substitutes any line *containing* the package
//! name as a substring. This is what lets a plain pin replace a VCS URI
//! line with the name embedded mid-line, and it is also a sharp edge for
//! names that are prefixes of other names. The behavior is pinned by a
//! regression test; do not "fix" it silently.

use std::fmt;
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};

/// Series from which the package index drops the series prefix in addon
/// package names.
const UNPREFIXED_SERIES: u32 = 15;

/// Map an addon name to its package-index name for the given series.
///
/// Idempotent: names already in package form pass through unchanged.
pub fn resolve_package_name(addon: &str, series: u32) -> String {
    let package_form = Regex::new(r"^odoo\d*-addon-").unwrap();
    if package_form.is_match(addon) {
        return addon.to_string();
    }
    if series < UNPREFIXED_SERIES {
        format!("odoo{}-addon-{}", series, addon)
    } else {
        format!("odoo-addon-{}", addon)
    }
}

/// Assemble the full Odoo package version from the tracked series and the
/// version reported by the package index.
///
/// Addon releases carry the series as a prefix (`14.0.1.9.0`); when the
/// index (or a fixture) hands back only the addon tail (`1.9.0`), the
/// series is prepended.
pub fn full_version(odoo_version: &str, latest: &str) -> String {
    if latest.starts_with(&format!("{}.", odoo_version)) {
        latest.to_string()
    } else {
        format!("{}.{}", odoo_version, latest)
    }
}

/// One line of a requirements file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementEntry {
    /// Package name as written.
    pub name: String,
    /// Version constraints, in file order.
    pub specs: Vec<(String, String)>,
    /// VCS URI for PR-sourced installs (`name @ git+https://...`).
    pub uri: Option<String>,
    /// Whether the line carried the `-e` editable flag.
    pub editable: bool,
}

impl RequirementEntry {
    /// Build a pinned entry (`name == version`).
    pub fn pinned(name: impl Into<String>, version: impl Into<String>) -> Self {
        RequirementEntry {
            name: name.into(),
            specs: vec![("==".to_string(), version.into())],
            uri: None,
            editable: false,
        }
    }

    /// Build a VCS entry (`name @ uri`).
    pub fn vcs(name: impl Into<String>, uri: impl Into<String>) -> Self {
        RequirementEntry {
            name: name.into(),
            specs: Vec::new(),
            uri: Some(uri.into()),
            editable: false,
        }
    }

    /// Parse a single requirement line.
    pub fn parse(line: &str) -> Result<Self> {
        let raw = line.trim();
        let (editable, raw) = match raw.strip_prefix("-e ") {
            Some(rest) => (true, rest.trim()),
            None => (false, raw),
        };
        if raw.is_empty() {
            return Err(Error::Requirement {
                line: line.to_string(),
                message: "empty requirement".to_string(),
            });
        }

        if let Some((name, uri)) = raw.split_once(" @ ") {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::Requirement {
                    line: line.to_string(),
                    message: "missing package name before '@'".to_string(),
                });
            }
            return Ok(RequirementEntry {
                name: name.to_string(),
                specs: Vec::new(),
                uri: Some(uri.trim().to_string()),
                editable,
            });
        }

        let name_re = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*").unwrap();
        let name_match = name_re.find(raw).ok_or_else(|| Error::Requirement {
            line: line.to_string(),
            message: "cannot find package name".to_string(),
        })?;
        let name = name_match.as_str().to_string();
        let rest = raw[name_match.end()..].trim();

        let mut specs = Vec::new();
        if !rest.is_empty() {
            let spec_re = Regex::new(r"^(==|>=|<=|!=|~=|>|<)\s*([^\s,]+)$").unwrap();
            for part in rest.split(',') {
                let part = part.trim();
                let caps = spec_re.captures(part).ok_or_else(|| Error::Requirement {
                    line: line.to_string(),
                    message: format!("invalid version specifier {:?}", part),
                })?;
                specs.push((caps[1].to_string(), caps[2].to_string()));
            }
        }

        Ok(RequirementEntry {
            name,
            specs,
            uri: None,
            editable,
        })
    }
}

impl fmt::Display for RequirementEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.editable {
            write!(f, "-e ")?;
        }
        if let Some(uri) = &self.uri {
            return write!(f, "{} @ {}", self.name, uri);
        }
        write!(f, "{}", self.name)?;
        for (i, (op, version)) in self.specs.iter().enumerate() {
            if i == 0 {
                write!(f, " {} {}", op, version)?;
            } else {
                write!(f, ", {} {}", op, version)?;
            }
        }
        Ok(())
    }
}

/// Compare two version strings component-wise as strings.
///
/// Split on `.` and compare the components lexicographically. This is the
/// literal comparison inherited from the original requirement parser, not
/// semver: `"1.10"` is less than `"1.9"`.
fn literal_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    let av: Vec<&str> = a.split('.').collect();
    let bv: Vec<&str> = b.split('.').collect();
    av.cmp(&bv)
}

/// Check a candidate version against every constraint of a requirement.
///
/// `~=` is evaluated as `>=` under the same literal comparison; unknown
/// operators never match.
pub fn version_allowed(entry: &RequirementEntry, candidate: &str) -> bool {
    use std::cmp::Ordering::*;
    entry.specs.iter().all(|(op, version)| {
        let ord = literal_cmp(candidate, version);
        match op.as_str() {
            "==" => ord == Equal,
            "!=" => ord != Equal,
            ">" => ord == Greater,
            ">=" | "~=" => ord != Less,
            "<" => ord == Less,
            "<=" => ord != Greater,
            _ => false,
        }
    })
}

/// Find the requirement for `name` in `file`, if present.
///
/// Lookup parses each non-comment line and compares the parsed package
/// name exactly; lines that fail to parse are skipped.
pub fn read_requirement(file: &Path, name: &str) -> Result<Option<RequirementEntry>> {
    let content = fs::read_to_string(file)?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Ok(entry) = RequirementEntry::parse(trimmed) {
            if entry.name == name {
                return Ok(Some(entry));
            }
        }
    }
    Ok(None)
}

/// Append a requirement line to the file, creating it when absent.
pub fn append_requirement(file: &Path, entry: &RequirementEntry) -> Result<()> {
    let mut content = if file.exists() {
        fs::read_to_string(file)?
    } else {
        String::new()
    };
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&entry.to_string());
    content.push('\n');
    fs::write(file, content)?;
    Ok(())
}

/// Replace every line containing `name` with the rendered `entry`.
///
/// The match is a textual substring check, not a structural one. Returns
/// the number of lines replaced.
pub fn replace_requirement(file: &Path, name: &str, entry: &RequirementEntry) -> Result<usize> {
    let content = fs::read_to_string(file)?;
    let mut replaced = 0;
    let lines: Vec<String> = content
        .lines()
        .map(|line| {
            if line.contains(name) {
                replaced += 1;
                entry.to_string()
            } else {
                line.to_string()
            }
        })
        .collect();
    let mut output = lines.join("\n");
    if content.ends_with('\n') || !output.is_empty() {
        output.push('\n');
    }
    fs::write(file, output)?;
    Ok(replaced)
}

/// Write `entry` into the file: replace the existing line(s) for its
/// package when present, append otherwise.
pub fn upsert_requirement(file: &Path, entry: &RequirementEntry) -> Result<()> {
    if file.exists() && read_requirement(file, &entry.name)?.is_some() {
        replace_requirement(file, &entry.name, entry)?;
    } else if file.exists() && fs::read_to_string(file)?.contains(&entry.name) {
        // VCS URI lines embed the name mid-line and do not parse back to
        // the same package name; the substring replace still targets them.
        replace_requirement(file, &entry.name, entry)?;
    } else {
        append_requirement(file, entry)?;
    }
    Ok(())
}
