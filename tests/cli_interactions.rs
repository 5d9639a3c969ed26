//! CLI interaction tests
//!
//! Every run here fails before any network activity, so the tests work
//! offline. Each one runs in its own temporary directory with the cache and
//! log locations pointed into it.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Helper function to create an isolated test command
fn create_test_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bosprobe").unwrap();
    cmd.current_dir(dir)
        .env_remove("BCE_ACCESS_KEY_ID")
        .env_remove("BCE_SECRET_ACCESS_KEY")
        .env_remove("BOSPROBE_REGION_DOMAINS")
        .env_remove("BOSPROBE_ENDPOINT_TTL")
        .env_remove("BOSPROBE_REFERENCE_HOST")
        .env_remove("BOSPROBE_DEFAULT_ENDPOINT")
        .env_remove("BOSPROBE_HTTPS")
        .env_remove("ENABLE_COLOR")
        .env("BOSPROBE_CACHE_PATH", dir.join("endpoint_cache"))
        .env("BOSPROBE_LOG_DIR", dir)
        .env("BOSPROBE_LANG", "en")
        .env("NO_COLOR", "1");
    cmd
}

fn log_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("bosprobe") && name.ends_with(".log"))
        .collect()
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("BOSPROBE_ENDPOINT_TTL"));

    create_test_cmd(dir.path())
        .args(["download", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--url"))
        .stdout(predicate::str::contains("--refresh-endpoint"));
}

#[test]
fn test_missing_subcommand_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path()).assert().failure().code(2);
}

#[test]
fn test_missing_credentials_exit_code() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .args(["upload", "--bucket", "b"])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("BCE_ACCESS_KEY_ID"));

    // No probe ran, so no run log was written
    assert!(log_files(dir.path()).is_empty());
}

#[test]
fn test_unsupported_language() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .args(["--lang", "fr", "upload", "--ak", "AK", "--sk", "SK", "--bucket", "b"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_url_bucket_conflict_reaches_the_report() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .args([
            "download",
            "--ak",
            "AKID-VISIBLE",
            "--sk=SECRET-VISIBLE",
            "--url",
            "https://b.bj.bcebos.com/report.csv",
            "--bucket",
            "b",
        ])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Request check: FAILED"))
        .stdout(predicate::str::contains("probe.url_bucket_conflict"))
        .stdout(predicate::str::contains("Run log saved to"));

    let logs = log_files(dir.path());
    assert_eq!(logs.len(), 1);
    let text = fs::read_to_string(dir.path().join(&logs[0])).unwrap();
    assert!(text.contains("--ak ******"));
    assert!(text.contains("--sk=******"));
    assert!(!text.contains("AKID-VISIBLE"));
    assert!(!text.contains("SECRET-VISIBLE"));
    assert!(text.contains("probe.url_bucket_conflict"));
}

#[test]
fn test_missing_local_file() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .env("BCE_ACCESS_KEY_ID", "env-ak")
        .env("BCE_SECRET_ACCESS_KEY", "env-sk")
        .args(["upload", "--bucket", "b", "--local-path", "missing.bin"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("probe.local_file_not_found"))
        .stdout(predicate::str::contains("Request check: FAILED"));
}

#[test]
fn test_chinese_report() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .args(["--lang", "zh", "download", "--ak", "AK", "--sk", "SK", "--object", "k"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("请求检查: 未通过"))
        .stdout(predicate::str::contains("probe.missing_target"));
}

#[test]
fn test_unwritable_log_dir_falls_back_to_stdout() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .env("BOSPROBE_LOG_DIR", dir.path().join("no").join("such").join("dir"))
        .args(["upload", "--ak", "AK", "--sk", "SK"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("probe.missing_bucket"))
        .stdout(predicate::str::contains("No run log was persisted"));
}
