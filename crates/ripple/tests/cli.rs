//! Tests for the `ripple` binary's configuration and exit behaviour.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use ripple::{CACHE_FILE_NAME, ENV_BASE_REF, ENV_MODULE_NAME, ENV_PROJECT_ROOT};

/// Run the ripple binary in `dir` with the ripple environment cleared.
fn run_ripple(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ripple"))
        .args(args)
        .current_dir(dir)
        .env_remove(ENV_MODULE_NAME)
        .env_remove(ENV_PROJECT_ROOT)
        .env_remove(ENV_BASE_REF)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute ripple binary")
}

#[test]
fn env_source_without_variables_fails_before_work() {
    let dir = tempfile::tempdir().expect("create temp dir");

    let output = run_ripple(dir.path(), &["--source", "env", "affected"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(ENV_MODULE_NAME), "stderr was: {stderr}");
    assert!(!dir.path().join(CACHE_FILE_NAME).exists());
}

#[test]
fn explicit_root_without_go_mod_fails() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let root = dir.path().display().to_string();

    let output = run_ripple(dir.path(), &["--root", &root, "affected"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("go.mod"), "stderr was: {stderr}");
}

#[test]
fn command_failure_under_env_source_is_not_a_config_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let root = dir.path().display().to_string();

    // A failing diff command under the env source is a command error, not a config error
    let output = Command::new(env!("CARGO_BIN_EXE_ripple"))
        .args(["--source", "env", "affected"])
        .current_dir(dir.path())
        .env(ENV_MODULE_NAME, "example.com/none")
        .env(ENV_PROJECT_ROOT, &root)
        .env(ENV_BASE_REF, "HEAD^")
        .env("PATH", "")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute ripple binary");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn affected_writes_cache_even_when_nothing_is_found() {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(dir.path().join("go.mod"), "module example.com/empty\n\ngo 1.22\n").expect("write go.mod");
    let root = dir.path().display().to_string();

    // Outside a git repository the diff fails, which discovery treats as no changes
    let output = run_ripple(dir.path(), &["--root", &root, "affected"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).trim().is_empty());
    let cache = fs::read_to_string(dir.path().join(CACHE_FILE_NAME)).expect("cache written");
    assert!(cache.contains("\"BottomUp\""));
    assert!(cache.contains("\"TopDown\""));
}
