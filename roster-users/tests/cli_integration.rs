//! Integration tests for the roster-users command

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

/// Create a throwaway config + database location and return their paths
fn setup_test_env() -> (TempDir, String, String) {
    let temp_dir = TempDir::new().unwrap();

    let config_dir = temp_dir.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let config_path = config_dir.join("config.toml");
    let db_path = data_dir.join("users.db");

    let config_content = format!(
        "[database]\npath = \"{}\"\n",
        escape_path_for_toml(&db_path.to_string_lossy())
    );
    fs::write(&config_path, config_content).unwrap();

    (
        temp_dir,
        config_path.to_string_lossy().to_string(),
        db_path.to_string_lossy().to_string(),
    )
}

fn roster_users(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("roster-users").unwrap();
    cmd.env("ROSTER_CONFIG", config_path);
    cmd
}

#[test]
fn test_list_empty_directory() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    roster_users(&config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_add_then_list() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    roster_users(&config_path)
        .args(["add", "Alice", "a@x.com", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added Alice"));

    roster_users(&config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice"))
        .stdout(predicate::str::contains("a@x.com"));
}

#[test]
fn test_list_json_format() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    roster_users(&config_path)
        .args(["add", "Alice", "a@x.com", "30"])
        .assert()
        .success();

    let output = roster_users(&config_path)
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let users: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(users[0]["name"], "Alice");
    assert_eq!(users[0]["id"], 1);
}

#[test]
fn test_add_rejects_malformed_email() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    roster_users(&config_path)
        .args(["add", "Alice", "not-an-email", "30"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("not a valid email"));
}

#[test]
fn test_get_missing_user_is_not_an_error() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    roster_users(&config_path)
        .args(["get", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No user with id 42"));
}

#[test]
fn test_delete_then_list_empty() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    roster_users(&config_path)
        .args(["add", "Alice", "a@x.com", "30"])
        .assert()
        .success();

    roster_users(&config_path)
        .args(["delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted user 1"));

    roster_users(&config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_clear_requires_force() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    roster_users(&config_path)
        .args(["add", "Alice", "a@x.com", "30"])
        .assert()
        .success();

    // Without --force nothing is removed
    roster_users(&config_path)
        .arg("clear")
        .assert()
        .success()
        .stderr(predicate::str::contains("--force"));

    roster_users(&config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice"));

    roster_users(&config_path)
        .args(["clear", "--force"])
        .assert()
        .success();

    roster_users(&config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_update_missing_user_is_a_noop() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    roster_users(&config_path)
        .args(["update", "7", "Ghost", "g@x.com", "99"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing updated"));
}

#[test]
fn test_prefs_set_show_clear() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    roster_users(&config_path)
        .args(["prefs", "set", "user.name", "alice"])
        .assert()
        .success();

    roster_users(&config_path)
        .args(["prefs", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user.name:  alice"));

    roster_users(&config_path)
        .args(["prefs", "clear"])
        .assert()
        .success();

    roster_users(&config_path)
        .args(["prefs", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user.name:  -"));
}

#[test]
fn test_watch_prints_seeded_snapshot_and_exits_at_limit() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    roster_users(&config_path)
        .args(["add", "Alice", "a@x.com", "30"])
        .assert()
        .success();

    roster_users(&config_path)
        .args(["watch", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 users"))
        .stdout(predicate::str::contains("Alice"));
}
