//! End-to-end tests for the `completions` command.

mod common;
use common::prelude::*;

/// Bash completions mention the binary name.
#[test]
fn test_completions_bash() {
    let mut cmd = cargo_bin_cmd!("odoo-toolbox");

    cmd.args(["completions", "bash"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("odoo-toolbox"));
}

/// Zsh completions generate without error.
#[test]
fn test_completions_zsh() {
    let mut cmd = cargo_bin_cmd!("odoo-toolbox");

    cmd.args(["completions", "zsh"])
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty().not());
}

/// An unsupported shell is a usage error.
#[test]
fn test_completions_unknown_shell() {
    let mut cmd = cargo_bin_cmd!("odoo-toolbox");

    cmd.args(["completions", "tcsh"]).assert().code(2);
}
