//! End-to-end tests for `addon add`.
//!
//! These tests always pass `--version` or `--pr` so no package-index
//! lookup happens; the network path is covered by unit tests against a
//! seeded version cache.

mod common;
use common::prelude::*;

/// A plain addon name is resolved to the series package name and pinned.
#[test]
fn test_addon_add_pins_exact_version() {
    let fixture = ProjectFixture::new();

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args(["addon", "add", "edi_oca", "--version", "1.9.0"])
        .assert()
        .code(0);

    fixture
        .temp
        .child("requirements.txt")
        .assert("odoo14-addon-edi_oca == 14.0.1.9.0\n");
}

/// A second add for the same addon replaces the pin in place.
#[test]
fn test_addon_add_replaces_existing_pin() {
    let fixture = ProjectFixture::new()
        .with_requirements("odoo14-addon-edi_oca == 14.0.1.8.0\nother-package == 1.0\n");

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args(["addon", "add", "edi_oca", "--version", "1.9.0"])
        .assert()
        .code(0);

    fixture
        .temp
        .child("requirements.txt")
        .assert("odoo14-addon-edi_oca == 14.0.1.9.0\nother-package == 1.0\n");
}

/// --pr pins the addon to the pull request head via a VCS line.
#[test]
fn test_addon_add_pr_writes_vcs_line() {
    let fixture = ProjectFixture::new();

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args([
            "addon",
            "add",
            "edi_oca",
            "--pr",
            "https://github.com/OCA/edi/pull/778",
        ])
        .assert()
        .code(0);

    fixture.temp.child("requirements.txt").assert(
        "odoo14-addon-edi_oca @ \
         git+https://github.com/OCA/edi@refs/pull/778/head#subdirectory=setup/edi_oca\n",
    );
}

/// A VCS line is replaced by a later exact pin.
#[test]
fn test_addon_add_pin_replaces_vcs_line() {
    let fixture = ProjectFixture::new().with_requirements(
        "odoo14-addon-edi_oca @ git+https://github.com/OCA/edi@refs/pull/778/head#subdirectory=setup/edi_oca\n",
    );

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args(["addon", "add", "edi_oca", "--version", "1.9.0"])
        .assert()
        .code(0);

    fixture
        .temp
        .child("requirements.txt")
        .assert("odoo14-addon-edi_oca == 14.0.1.9.0\n");
}

/// --version and --pr are mutually exclusive.
#[test]
fn test_addon_add_version_and_pr_conflict() {
    let fixture = ProjectFixture::new();

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args([
            "addon",
            "add",
            "edi_oca",
            "--version",
            "1.9.0",
            "--pr",
            "https://github.com/OCA/edi/pull/778",
        ])
        .assert()
        .code(2);
}
