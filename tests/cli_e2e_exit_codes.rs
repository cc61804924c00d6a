//! End-to-end tests for CLI exit codes.
//!
//! - Exit code 0: Success, including runs where tidy/vendor steps failed
//! - Exit code 1: Fatal error (bad source root, config, manifest or archive)
//! - Exit code 2: Invalid command-line usage (handled by clap)

#[allow(dead_code)]
mod common;
use common::prelude::*;

/// Exit code 0 is returned for a successful pack.
#[test]
fn test_exit_code_success() {
    let fixture = TestFixture::new().with_simple_workspace();

    fixture
        .command()
        .args(["pack", "ws", "--skip-vendor"])
        .assert()
        .code(0);
}

/// Exit code 0 is returned for --help.
#[test]
fn test_exit_code_help() {
    let mut cmd = cargo_bin_cmd!("gowork-bundle");

    cmd.arg("--help").assert().code(0);
}

/// Exit code 0 is returned for --version.
#[test]
fn test_exit_code_version() {
    let mut cmd = cargo_bin_cmd!("gowork-bundle");

    cmd.arg("--version")
        .assert()
        .code(0)
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Exit code 1 is returned when the directory does not exist.
#[test]
fn test_exit_code_error_missing_dir() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["pack", "nonexistent"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid source root"));
}

/// Exit code 1 is returned when the source root is a file.
#[test]
fn test_exit_code_error_file_as_dir() {
    let fixture = TestFixture::new().with_file("go.work", "go 1.22\n");

    fixture
        .command()
        .args(["pack", "go.work"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid source root"));
}

/// Exit code 1 is returned for a missing config file.
#[test]
fn test_exit_code_error_config_not_found() {
    let fixture = TestFixture::new().with_simple_workspace();

    fixture
        .command()
        .args(["pack", "ws", "--config", "nonexistent.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nonexistent.yaml"));
}

/// Exit code 1 is returned for a nested external directory in the config.
#[test]
fn test_exit_code_error_nested_external_dir() {
    let fixture = TestFixture::new()
        .with_simple_workspace()
        .with_file("bundle.yaml", configs::NESTED_EXTERNAL);

    fixture
        .command()
        .args(["pack", "ws", "--config", "bundle.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("hint"));
}

/// Exit code 1 is returned for an invalid log level.
#[test]
fn test_exit_code_error_invalid_log_level() {
    let fixture = TestFixture::new().with_simple_workspace();

    fixture
        .command()
        .args(["--log-level", "loud", "pack", "ws"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid log level"));
}

/// Exit code 2 is returned when no subcommand is given.
#[test]
fn test_exit_code_usage_no_subcommand() {
    let mut cmd = cargo_bin_cmd!("gowork-bundle");

    cmd.assert().code(2);
}

/// Exit code 2 is returned when `pack` has no directory.
#[test]
fn test_exit_code_usage_missing_dir() {
    let mut cmd = cargo_bin_cmd!("gowork-bundle");

    cmd.arg("pack")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<DIR>"));
}

/// Exit code 2 is returned for an unknown flag.
#[test]
fn test_exit_code_usage_unknown_flag() {
    let mut cmd = cargo_bin_cmd!("gowork-bundle");

    cmd.args(["pack", "ws", "--vendor-everything"]).assert().code(2);
}
