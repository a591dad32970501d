//! Command-line surface: exit codes and plain-text commands.

use std::process::{Command, Output};

use tempfile::TempDir;

fn run(args: &[&str]) -> (Output, TempDir) {
    // Point the config at a file that does not exist so defaults apply.
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_krypton-boundary-orchestrator"))
        .args(args)
        .env("BOUNDARY_ORCHESTRATOR_CONFIG", dir.path().join("absent.toml"))
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    (output, dir)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_no_arguments_prints_usage_and_succeeds() {
    let (output, _dir) = run(&[]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("USAGE:"));
}

#[test]
fn test_help_succeeds() {
    let (output, _dir) = run(&["help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("COMMANDS:"));
}

#[test]
fn test_unknown_command_fails() {
    let (output, _dir) = run(&["frobnicate"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown command: frobnicate"));
}

#[test]
fn test_version_reports_package_version() {
    let (output, _dir) = run(&["version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(concat!("v", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_jobs_lists_builtins() {
    let (output, _dir) = run(&["jobs"]);
    assert!(output.status.success());
    let ids: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert_eq!(ids, ["dummy", "submit"]);
}
