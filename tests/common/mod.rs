//! Shared test helpers for integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::path::Path;
use tempfile::TempDir;

/// Instant used as "now" when filing test cases
pub const FILED_AT: &str = "2024-01-15T10:30:00Z";

/// Helper to get a jpc command isolated from the caller's environment
///
/// The user config directory points inside `root` so host config never leaks in.
pub fn jpc_in(root: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("jpc"));
    cmd.current_dir(root)
        .env("JPC_CONFIG_HOME", root.join(".user-config"))
        .env_remove("JPC_ACTOR")
        .env_remove("JPC_NOW")
        .env_remove("JPC_LOG");
    cmd
}

/// Helper to create a test project in a temp directory
pub fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    jpc_in(tmp.path()).arg("init").assert().success();
    tmp
}

/// Helper to file a case and return its case number
pub fn file_test_case(tmp: &TempDir, judge: &str, now: &str) -> String {
    let output = jpc_in(tmp.path())
        .args([
            "--now", now, "--format", "id", "file", "--conflict", "vecinal", "--block", "20",
            "--judge", judge,
        ])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "file failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
