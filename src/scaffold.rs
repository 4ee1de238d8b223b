//! # Project Scaffolding
//!
//! Renders the fixed set of project-template files into a new or existing
//! project tree. Each entry carries its own write predicate (by default
//! "destination absent") and, for files worth keeping, a
//! backup-before-overwrite behavior. No business logic beyond predicate
//! evaluation and `${var}` substitution.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{Error, Result};

/// One templated file of the project scaffold.
pub struct ScaffoldEntry {
    /// Destination, relative to the project root.
    pub dest: &'static str,
    /// Template content; `${var}` placeholders are substituted.
    pub template: &'static str,
    /// Back the destination up to `<dest>.bak` before overwriting.
    pub backup: bool,
}

/// What happened to one entry during rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaffoldOutcome {
    Written(PathBuf),
    Kept(PathBuf),
}

const PROJ_CFG_TEMPLATE: &str = "\
[paths]
odoo_src = odoo/src
ext_src = odoo/external-src
local_src = odoo/local-src
pending_merge = pending-merge.d
version_file = odoo/VERSION

[remotes]
company = ${company_remote}
";

const MARKER_TEMPLATE: &str = "\
project_id: ${project_id}
odoo_version: \"${odoo_version}\"
";

const COMPOSE_OVERRIDE_TEMPLATE: &str = "\
services:
  odoo:
    environment:
      DB_NAME: ${project_id}
    ports:
      - 8069:8069
  db:
    environment:
      POSTGRES_USER: odoo
      POSTGRES_PASSWORD: odoo
";

const BUMPVERSION_TEMPLATE: &str = "\
[bumpversion]
current_version = ${odoo_version}.1.0.0

[bumpversion:file:odoo/VERSION]
";

const TOWNCRIER_TEMPLATE: &str = "\
[tool.towncrier]
package = \"${project_id}\"
filename = \"HISTORY.rst\"
directory = \"changes.d\"
";

const HISTORY_TEMPLATE: &str = "\
Release history
===============

.. towncrier release notes start
";

const VERSION_TEMPLATE: &str = "${odoo_version}.1.0.0\n";

/// The fixed scaffold, in write order.
pub fn entries() -> Vec<ScaffoldEntry> {
    vec![
        ScaffoldEntry {
            dest: ".odoo-project.yaml",
            template: MARKER_TEMPLATE,
            backup: false,
        },
        ScaffoldEntry {
            dest: ".proj.cfg",
            template: PROJ_CFG_TEMPLATE,
            backup: true,
        },
        ScaffoldEntry {
            dest: "docker-compose.override.yml",
            template: COMPOSE_OVERRIDE_TEMPLATE,
            backup: true,
        },
        ScaffoldEntry {
            dest: ".bumpversion.cfg",
            template: BUMPVERSION_TEMPLATE,
            backup: false,
        },
        ScaffoldEntry {
            dest: "towncrier.toml",
            template: TOWNCRIER_TEMPLATE,
            backup: false,
        },
        ScaffoldEntry {
            dest: "HISTORY.rst",
            template: HISTORY_TEMPLATE,
            backup: false,
        },
        ScaffoldEntry {
            dest: "odoo/VERSION",
            template: VERSION_TEMPLATE,
            backup: false,
        },
    ]
}

/// Substitute `${var}` placeholders; unknown variables are an error.
pub fn render(template: &str, vars: &HashMap<String, String>) -> Result<String> {
    let placeholder = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
    let mut missing = None;
    let rendered = placeholder.replace_all(template, |caps: &regex::Captures| {
        match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| caps[1].to_string());
                String::new()
            }
        }
    });
    if let Some(variable) = missing {
        return Err(Error::Template {
            message: "no value provided".to_string(),
            variable: Some(variable),
        });
    }
    Ok(rendered.into_owned())
}

/// Write the scaffold into `root`.
///
/// Existing destinations are kept unless `force` is set; forced
/// overwrites of backup-worthy entries move the old content to
/// `<dest>.bak` first.
pub fn init(root: &Path, vars: &HashMap<String, String>, force: bool) -> Result<Vec<ScaffoldOutcome>> {
    let mut outcomes = Vec::new();
    for entry in entries() {
        let dest = root.join(entry.dest);
        if dest.exists() && !force {
            outcomes.push(ScaffoldOutcome::Kept(dest));
            continue;
        }
        if dest.exists() && entry.backup {
            let backup = dest.with_extension(match dest.extension() {
                Some(ext) => format!("{}.bak", ext.to_string_lossy()),
                None => "bak".to_string(),
            });
            fs::copy(&dest, &backup)?;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, render(entry.template, vars)?)?;
        outcomes.push(ScaffoldOutcome::Written(dest));
    }
    Ok(outcomes)
}

/// The template variables derived from a project identity.
pub fn project_vars(project_id: &str, odoo_version: &str, company_remote: &str) -> HashMap<String, String> {
    HashMap::from([
        ("project_id".to_string(), project_id.to_string()),
        ("odoo_version".to_string(), odoo_version.to_string()),
        ("company_remote".to_string(), company_remote.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars() -> HashMap<String, String> {
        project_vars("acme_corp", "14.0", "camptocamp")
    }

    #[test]
    fn test_render_substitutes_variables() {
        let rendered = render(MARKER_TEMPLATE, &vars()).unwrap();
        assert_eq!(rendered, "project_id: acme_corp\nodoo_version: \"14.0\"\n");
    }

    #[test]
    fn test_render_missing_variable_is_error() {
        let err = render("hello ${nobody}", &vars()).unwrap_err();
        assert!(format!("{}", err).contains("(variable: nobody)"));
    }

    #[test]
    fn test_init_writes_all_entries() {
        let temp = TempDir::new().unwrap();
        let outcomes = init(temp.path(), &vars(), false).unwrap();
        assert_eq!(outcomes.len(), entries().len());
        assert!(temp.path().join(".proj.cfg").is_file());
        assert!(temp.path().join("odoo/VERSION").is_file());
        assert_eq!(
            fs::read_to_string(temp.path().join("odoo/VERSION")).unwrap(),
            "14.0.1.0.0\n"
        );
    }

    #[test]
    fn test_init_keeps_existing_without_force() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("HISTORY.rst"), "hand-written").unwrap();

        let outcomes = init(temp.path(), &vars(), false).unwrap();
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, ScaffoldOutcome::Kept(p) if p.ends_with("HISTORY.rst"))));
        assert_eq!(
            fs::read_to_string(temp.path().join("HISTORY.rst")).unwrap(),
            "hand-written"
        );
    }

    #[test]
    fn test_force_backs_up_compose_override() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("docker-compose.override.yml"),
            "old content",
        )
        .unwrap();

        init(temp.path(), &vars(), true).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("docker-compose.override.yml.bak")).unwrap(),
            "old content"
        );
        assert!(fs::read_to_string(temp.path().join("docker-compose.override.yml"))
            .unwrap()
            .contains("POSTGRES_USER: odoo"));
    }
}
