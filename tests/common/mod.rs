//! Shared test utilities for the CLI end-to-end tests.
//!
//! Provides a project fixture builder so each test starts from a valid
//! project tree (marker file, `.proj.cfg`, optionally a requirements
//! file) without repeating the boilerplate.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = ProjectFixture::new();
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use assert_fs::TempDir;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    pub use super::ProjectFixture;
}

/// The marker file content every fixture project carries.
#[allow(dead_code)]
pub const MARKER: &str = "project_id: acme_corp\nodoo_version: \"14.0\"\n";

/// The path configuration every fixture project carries.
#[allow(dead_code)]
pub const PROJ_CFG: &str = "\
[paths]
odoo_src = odoo/src
ext_src = odoo/external-src
local_src = odoo/local-src
pending_merge = pending-merge.d
version_file = odoo/VERSION

[remotes]
company = camptocamp
";

/// A temporary directory laid out as a valid project root.
#[allow(dead_code)]
pub struct ProjectFixture {
    pub temp: TempDir,
}

#[allow(dead_code)]
impl ProjectFixture {
    /// A fresh project with the marker and configuration files only.
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        temp.child(".odoo-project.yaml").write_str(MARKER).unwrap();
        temp.child(".proj.cfg").write_str(PROJ_CFG).unwrap();
        ProjectFixture { temp }
    }

    /// Add a requirements.txt with the given content.
    pub fn with_requirements(self, content: &str) -> Self {
        self.temp.child("requirements.txt").write_str(content).unwrap();
        self
    }

    /// Add the version files (`odoo/VERSION` and `.bumpversion.cfg`).
    pub fn with_version(self, version: &str) -> Self {
        self.temp
            .child("odoo/VERSION")
            .write_str(&format!("{}\n", version))
            .unwrap();
        self.temp
            .child(".bumpversion.cfg")
            .write_str(&format!(
                "[bumpversion]\ncurrent_version = {}\n",
                version
            ))
            .unwrap();
        self
    }
}
