//! # Project Discovery and Configuration
//!
//! This module locates the project root and loads the project's
//! configuration into typed, read-only structures.
//!
//! A project is identified by a YAML *marker file* at its root
//! (`.odoo-project.yaml` by default, overridable through the
//! `ODOO_PROJECT_MARKER` environment variable). The marker carries the
//! project identity: the project id used for generated branch names and the
//! tracked Odoo series (e.g. `14.0`).
//!
//! Path conventions live in `.proj.cfg`, a small INI file:
//!
//! ```ini
//! [paths]
//! odoo_src = odoo/src
//! ext_src = odoo/external-src
//! local_src = odoo/local-src
//! pending_merge = pending-merge.d
//! version_file = odoo/VERSION
//! migration_file = odoo/migration.yml
//!
//! [remotes]
//! company = camptocamp
//! ```
//!
//! Both files are read once per process and treated as frozen afterwards;
//! tests build fixture trees on disk and call [`Project::load`] again for
//! isolation.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ini::Ini;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Default name of the project marker file.
pub const DEFAULT_MARKER: &str = ".odoo-project.yaml";

/// Name of the INI configuration file at the project root.
pub const CONFIG_FILE: &str = ".proj.cfg";

/// Maximum number of parent directories inspected when looking for the
/// marker file.
const MAX_ROOT_DEPTH: usize = 16;

/// Resolve the marker file name, honoring the environment override.
pub fn marker_file_name() -> String {
    env::var("ODOO_PROJECT_MARKER").unwrap_or_else(|_| DEFAULT_MARKER.to_string())
}

/// Walk upward from `start` looking for the marker file.
///
/// The walk is bounded to [`MAX_ROOT_DEPTH`] levels; if no marker is found
/// the search fails with a "project root not found" error.
pub fn root_path(start: &Path) -> Result<PathBuf> {
    let marker = marker_file_name();
    let mut dir = start.to_path_buf();
    for _ in 0..MAX_ROOT_DEPTH {
        if dir.join(&marker).is_file() {
            return Ok(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    Err(Error::ProjectRootNotFound {
        start: start.to_path_buf(),
    })
}

/// Content of the project marker file.
#[derive(Debug, Clone, Deserialize)]
pub struct Marker {
    /// Project identifier, used in generated aggregation branch names.
    pub project_id: String,
    /// Tracked Odoo series, e.g. `"14.0"`.
    pub odoo_version: String,
}

impl Marker {
    fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read marker file {}: {}", path.display(), e),
            hint: None,
        })?;
        serde_yaml::from_str(&content).map_err(|e| Error::Config {
            message: format!("malformed marker file {}: {}", path.display(), e),
            hint: Some("the marker must define 'project_id' and 'odoo_version'".to_string()),
        })
    }
}

/// Path conventions and remote naming, loaded from `.proj.cfg`.
///
/// All paths are relative to the project root. The struct is read-only
/// after load.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Checkout of core Odoo.
    pub odoo_src: PathBuf,
    /// Directory holding external addon repositories (one per submodule).
    pub ext_src: PathBuf,
    /// Directory holding project-local addons.
    pub local_src: PathBuf,
    /// Directory holding pending-merge descriptor files.
    pub pending_merge: PathBuf,
    /// The project `VERSION` file.
    pub version_file: PathBuf,
    /// Optional migration definition file.
    pub migration_file: Option<PathBuf>,
    /// Git remote name of the team's fork.
    pub company_remote: String,
}

impl ProjectConfig {
    /// Load the configuration from an INI file.
    ///
    /// Every missing required key is collected so the error enumerates all
    /// offending fields at once instead of failing one key at a time.
    pub fn load(path: &Path) -> Result<Self> {
        let ini = Ini::load_from_file(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            hint: None,
        })?;

        let mut missing = Vec::new();
        let mut path_key = |key: &str| -> Option<PathBuf> {
            match ini.get_from(Some("paths"), key) {
                Some(value) if !value.trim().is_empty() => Some(PathBuf::from(value.trim())),
                _ => {
                    missing.push(format!("paths.{}", key));
                    None
                }
            }
        };

        let odoo_src = path_key("odoo_src");
        let ext_src = path_key("ext_src");
        let local_src = path_key("local_src");
        let pending_merge = path_key("pending_merge");
        let version_file = path_key("version_file");
        let migration_file = ini
            .get_from(Some("paths"), "migration_file")
            .map(|v| PathBuf::from(v.trim()));

        let company_remote = match ini.get_from(Some("remotes"), "company") {
            Some(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
            _ => {
                missing.push("remotes.company".to_string());
                None
            }
        };

        if !missing.is_empty() {
            return Err(Error::Config {
                message: format!(
                    "{} is missing required keys: {}",
                    path.display(),
                    missing.join(", ")
                ),
                hint: Some("see the project template for a complete .proj.cfg".to_string()),
            });
        }

        Ok(ProjectConfig {
            odoo_src: odoo_src.unwrap(),
            ext_src: ext_src.unwrap(),
            local_src: local_src.unwrap(),
            pending_merge: pending_merge.unwrap(),
            version_file: version_file.unwrap(),
            migration_file,
            company_remote: company_remote.unwrap(),
        })
    }
}

/// A loaded project: root path, marker identity, path configuration.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub marker: Marker,
    pub config: ProjectConfig,
}

impl Project {
    /// Load the project that contains `start`.
    pub fn load(start: &Path) -> Result<Self> {
        let root = root_path(start)?;
        let marker = Marker::load(&root.join(marker_file_name()))?;
        let config = ProjectConfig::load(&root.join(CONFIG_FILE))?;
        Ok(Project {
            root,
            marker,
            config,
        })
    }

    /// Load the project containing the current working directory.
    pub fn discover() -> Result<Self> {
        let cwd = env::current_dir()?;
        Self::load(&cwd)
    }

    /// The numeric Odoo series (`"14.0"` → `14`).
    pub fn series(&self) -> Result<u32> {
        let major = self
            .marker
            .odoo_version
            .split('.')
            .next()
            .unwrap_or_default();
        major.parse().map_err(|_| {
            Error::config(format!(
                "odoo_version {:?} does not start with a numeric series",
                self.marker.odoo_version
            ))
        })
    }

    pub fn odoo_src_path(&self) -> PathBuf {
        self.root.join(&self.config.odoo_src)
    }

    pub fn ext_src_path(&self) -> PathBuf {
        self.root.join(&self.config.ext_src)
    }

    pub fn local_src_path(&self) -> PathBuf {
        self.root.join(&self.config.local_src)
    }

    pub fn pending_merge_path(&self) -> PathBuf {
        self.root.join(&self.config.pending_merge)
    }

    pub fn version_file_path(&self) -> PathBuf {
        self.root.join(&self.config.version_file)
    }

    pub fn requirements_path(&self) -> PathBuf {
        self.root.join("requirements.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_marker(dir: &Path) {
        fs::write(
            dir.join(DEFAULT_MARKER),
            "project_id: acme_corp\nodoo_version: \"14.0\"\n",
        )
        .unwrap();
    }

    fn write_config(dir: &Path) {
        fs::write(
            dir.join(CONFIG_FILE),
            "[paths]\n\
             odoo_src = odoo/src\n\
             ext_src = odoo/external-src\n\
             local_src = odoo/local-src\n\
             pending_merge = pending-merge.d\n\
             version_file = odoo/VERSION\n\
             \n\
             [remotes]\n\
             company = camptocamp\n",
        )
        .unwrap();
    }

    #[test]
    fn test_root_path_finds_marker_in_parent() {
        let temp = TempDir::new().unwrap();
        write_marker(temp.path());
        let nested = temp.path().join("odoo/local-src/my_addon");
        fs::create_dir_all(&nested).unwrap();

        let root = root_path(&nested).unwrap();
        assert_eq!(root, temp.path());
    }

    #[test]
    fn test_root_path_not_found() {
        let temp = TempDir::new().unwrap();
        let err = root_path(temp.path()).unwrap_err();
        assert!(format!("{}", err).contains("project root not found"));
    }

    #[test]
    fn test_load_project() {
        let temp = TempDir::new().unwrap();
        write_marker(temp.path());
        write_config(temp.path());

        let project = Project::load(temp.path()).unwrap();
        assert_eq!(project.marker.project_id, "acme_corp");
        assert_eq!(project.marker.odoo_version, "14.0");
        assert_eq!(project.series().unwrap(), 14);
        assert_eq!(project.odoo_src_path(), temp.path().join("odoo/src"));
        assert_eq!(
            project.pending_merge_path(),
            temp.path().join("pending-merge.d")
        );
        assert!(project.config.migration_file.is_none());
    }

    #[test]
    fn test_config_missing_keys_all_enumerated() {
        let temp = TempDir::new().unwrap();
        write_marker(temp.path());
        fs::write(
            temp.path().join(CONFIG_FILE),
            "[paths]\nodoo_src = odoo/src\n",
        )
        .unwrap();

        let err = Project::load(temp.path()).unwrap_err();
        let display = format!("{}", err);
        assert!(display.contains("paths.ext_src"));
        assert!(display.contains("paths.local_src"));
        assert!(display.contains("paths.pending_merge"));
        assert!(display.contains("paths.version_file"));
        assert!(display.contains("remotes.company"));
    }

    #[test]
    fn test_malformed_marker() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(DEFAULT_MARKER), "project_id: only\n").unwrap();
        write_config(temp.path());

        let err = Project::load(temp.path()).unwrap_err();
        assert!(format!("{}", err).contains("malformed marker file"));
    }
}
