//! End-to-end tests for the `db` command group.
//!
//! Tests that actually talk to PostgreSQL through docker compose are
//! ignored by default; run them with `--features integration-tests` in an
//! environment with a running compose stack. The argv construction itself
//! is covered by unit tests against a recording runner.

mod common;
use common::prelude::*;

/// Dropping asks for confirmation; without a terminal the command points
/// at --yes instead of proceeding.
#[test]
fn test_db_drop_headless_requires_yes() {
    let fixture = ProjectFixture::new();

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args(["db", "drop", "acme_corp_prod"])
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--yes"));
}

/// Restoring from a missing dump file fails before touching the stack.
#[test]
fn test_db_restore_missing_dump_fails() {
    let fixture = ProjectFixture::new();

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args(["db", "restore", "acme_corp_test", "missing.pg"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

/// Round-trip against a live compose stack.
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_db_create_list_drop_roundtrip() {
    let fixture = ProjectFixture::new();

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args(["db", "create", "odoo_toolbox_e2e"])
        .assert()
        .code(0);

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args(["db", "list"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("odoo_toolbox_e2e"));

    let mut cmd = cargo_bin_cmd!("odoo-toolbox");
    cmd.current_dir(fixture.temp.path())
        .args(["db", "drop", "odoo_toolbox_e2e", "--yes"])
        .assert()
        .code(0);
}
