//! End-to-end tests for `release bump`.

mod common;
use common::prelude::*;

/// Bumping patch rewrites VERSION and syncs .bumpversion.cfg.
#[test]
fn test_release_bump_patch() {
    let fixture = ProjectFixture::new().with_version("14.0.1.2.3");

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args(["release", "bump", "--type", "patch"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("14.0.1.2.3 → 14.0.1.2.4"));

    fixture.temp.child("odoo/VERSION").assert("14.0.1.2.4\n");
    fixture
        .temp
        .child(".bumpversion.cfg")
        .assert(predicate::str::contains("current_version = 14.0.1.2.4"));
}

/// Bumping major resets minor and patch, never the series.
#[test]
fn test_release_bump_major_keeps_series() {
    let fixture = ProjectFixture::new().with_version("14.0.1.2.3");

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args(["release", "bump", "--type", "major"])
        .assert()
        .code(0);

    fixture.temp.child("odoo/VERSION").assert("14.0.2.0.0\n");
}

/// Bumping inserts a changelog stub newest-first.
#[test]
fn test_release_bump_inserts_changelog_stub() {
    let fixture = ProjectFixture::new().with_version("14.0.1.0.0");
    fixture
        .temp
        .child("HISTORY.rst")
        .write_str("Release history\n===============\n\n.. towncrier release notes start\n")
        .unwrap();

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args(["release", "bump", "--type", "minor"])
        .assert()
        .code(0);

    fixture
        .temp
        .child("HISTORY.rst")
        .assert(predicate::str::contains("14.0.1.1.0"));
}

/// Without any version source the command fails with a hint.
#[test]
fn test_release_bump_without_version_fails() {
    let fixture = ProjectFixture::new();

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args(["release", "bump", "--type", "patch"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no project version found"));
}
