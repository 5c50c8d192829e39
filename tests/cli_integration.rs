//! Integration tests for the keyshard CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Every test points `--config-dir` at a temp dir and feeds secrets on
//! stdin, so nothing prompts.

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Helper: get a Command pointing at the keyshard binary.
fn keyshard() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("keyshard").expect("binary should exist");
    cmd.env_remove("KEYSHARD_VAULT")
        .env_remove("KEYSHARD_ENCRYPTION_KEY")
        .env_remove("KEYSHARD_NEW_ENCRYPTION_KEY")
        .env_remove("KEYSHARD_LOG");
    cmd
}

/// Helper: a keyshard command bound to a temp config dir.
fn in_dir(tmp: &TempDir) -> Command {
    let mut cmd = keyshard();
    cmd.arg("--config-dir").arg(tmp.path());
    cmd
}

fn init(tmp: &TempDir) {
    in_dir(tmp)
        .args(["init", "--encryption-key", "correct horse battery"])
        .assert()
        .success();
}

fn insert(tmp: &TempDir, name: &str, value: &str) {
    in_dir(tmp)
        .args(["insert", name])
        .write_stdin(format!("{value}\n"))
        .assert()
        .success();
}

#[test]
fn help_flag_shows_usage() {
    keyshard()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("insert"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("find"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("move"))
        .stdout(predicate::str::contains("copy"))
        .stdout(predicate::str::contains("rotate"));
}

#[test]
fn version_flag_shows_version() {
    keyshard()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("keyshard"));
}

#[test]
fn no_args_shows_help() {
    keyshard()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn init_creates_config_and_storage_root() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);

    assert!(tmp.path().join("default.json").is_file());
    assert!(tmp.path().join("default").join(".test_key").is_file());
}

#[test]
fn init_twice_fails() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    in_dir(&tmp)
        .args(["init", "--encryption-key", "another passphrase"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_rejects_short_passphrase() {
    let tmp = TempDir::new().unwrap();
    in_dir(&tmp)
        .args(["init", "--encryption-key", "12345678"])
        .assert()
        .failure();
    assert!(!tmp.path().join("default.json").exists());
}

#[test]
fn init_asymmetric_stores_keypair() {
    let tmp = TempDir::new().unwrap();
    in_dir(&tmp)
        .args(["--vault", "work", "init", "--asymmetric"])
        .assert()
        .success();

    let raw = std::fs::read_to_string(tmp.path().join("work.json")).unwrap();
    assert!(raw.contains("\"pub\""));
    assert!(raw.contains("\"priv\""));

    in_dir(&tmp)
        .args(["--vault", "work", "insert", "/services/github"])
        .write_stdin("hunter2\n")
        .assert()
        .success();
    in_dir(&tmp)
        .args(["--vault", "work", "get", "/services/github"])
        .assert()
        .success()
        .stdout("hunter2\n");
}

#[test]
fn get_on_missing_vault_fails() {
    let tmp = TempDir::new().unwrap();
    in_dir(&tmp)
        .args(["get", "/services/github"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn insert_then_get() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    insert(&tmp, "/services/github", "hunter2");

    in_dir(&tmp)
        .args(["get", "/services/github"])
        .assert()
        .success()
        .stdout("hunter2\n");
}

#[test]
fn insert_existing_requires_force() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    insert(&tmp, "/services/github", "hunter2");

    in_dir(&tmp)
        .args(["insert", "/services/github"])
        .write_stdin("other\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    in_dir(&tmp)
        .args(["insert", "--force", "/services/github"])
        .write_stdin("other\n")
        .assert()
        .success();
    in_dir(&tmp)
        .args(["get", "/services/github"])
        .assert()
        .stdout("other\n");
}

#[test]
fn insert_multiline_keeps_inner_newlines() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    in_dir(&tmp)
        .args(["insert", "--multiline", "/certs/key"])
        .write_stdin("line one\nline two\n")
        .assert()
        .success();

    in_dir(&tmp)
        .args(["get", "/certs/key"])
        .assert()
        .success()
        .stdout("line one\nline two\n");
}

#[test]
fn insert_rejects_invalid_names_and_empty_values() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    in_dir(&tmp)
        .args(["insert", "no-leading-slash"])
        .write_stdin("x\n")
        .assert()
        .failure();
    in_dir(&tmp)
        .args(["insert", "/empty/value"])
        .write_stdin("\n")
        .assert()
        .failure();
}

#[test]
fn list_and_find() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    insert(&tmp, "/web/github", "a");
    insert(&tmp, "/web/gitlab", "b");
    insert(&tmp, "/mail/work", "c");

    in_dir(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout("/mail/work\n/web/github\n/web/gitlab\n");

    in_dir(&tmp)
        .args(["ls", "--prefix", "/web"])
        .assert()
        .success()
        .stdout("/web/github\n/web/gitlab\n");

    in_dir(&tmp)
        .args(["find", "LAB"])
        .assert()
        .success()
        .stdout("/web/gitlab\n");
}

#[test]
fn move_copy_delete() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    insert(&tmp, "/old/name", "secret");

    in_dir(&tmp)
        .args(["move", "/old/name", "/new/name"])
        .assert()
        .success();
    in_dir(&tmp).args(["get", "/old/name"]).assert().failure();

    in_dir(&tmp)
        .args(["copy", "/new/name", "/copied/name"])
        .assert()
        .success();
    in_dir(&tmp)
        .args(["get", "/copied/name"])
        .assert()
        .success()
        .stdout("secret\n");

    in_dir(&tmp)
        .args(["delete", "--force", "/new/name"])
        .assert()
        .success();
    in_dir(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout("/copied/name\n");

    in_dir(&tmp)
        .args(["delete", "--force", "/new/name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn rotate_keeps_secrets_readable() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    insert(&tmp, "/services/github", "hunter2");
    let before = std::fs::read_to_string(tmp.path().join("default.json")).unwrap();

    in_dir(&tmp)
        .args(["rotate", "--force", "--encryption-key", "brand new passphrase"])
        .assert()
        .success();

    let after = std::fs::read_to_string(tmp.path().join("default.json")).unwrap();
    assert_ne!(before, after);
    assert!(after.contains("brand new passphrase"));

    in_dir(&tmp)
        .args(["get", "/services/github"])
        .assert()
        .success()
        .stdout("hunter2\n");
}

#[test]
fn rotate_to_same_passphrase_fails() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    in_dir(&tmp)
        .args(["rotate", "--force", "--encryption-key", "correct horse battery"])
        .assert()
        .failure();
}

#[test]
fn edit_replaces_existing_and_refuses_missing() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);

    in_dir(&tmp)
        .args(["edit", "/services/github"])
        .write_stdin("anything\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    insert(&tmp, "/services/github", "hunter2");
    in_dir(&tmp)
        .args(["edit", "/services/github"])
        .write_stdin("hunter3\n")
        .assert()
        .success();
    in_dir(&tmp)
        .args(["get", "/services/github"])
        .assert()
        .success()
        .stdout("hunter3\n");
}

#[test]
fn generate_stores_a_password() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);

    in_dir(&tmp)
        .args(["generate", "/web/shop"])
        .assert()
        .success();
    let out = in_dir(&tmp)
        .args(["get", "/web/shop"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(String::from_utf8(out).unwrap().trim_end().len(), 15);

    in_dir(&tmp)
        .args(["generate", "/web/shop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    in_dir(&tmp)
        .args(["generate", "--force", "--length", "24", "/web/shop"])
        .assert()
        .success();
    let out = in_dir(&tmp)
        .args(["get", "/web/shop"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(String::from_utf8(out).unwrap().trim_end().len(), 24);
}

#[test]
fn pwgen_prints_passwords_without_a_vault() {
    let tmp = TempDir::new().unwrap();
    let out = in_dir(&tmp)
        .args(["pwgen", "-n", "3", "--length", "12"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|line| line.len() == 12));

    in_dir(&tmp)
        .args(["pwgen", "--length", "4", "--symbols", "3", "--digits", "3"])
        .assert()
        .failure();
}

#[test]
fn grep_searches_values() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    insert(&tmp, "/web/github", "Token-ABC");
    insert(&tmp, "/web/abc", "other");

    in_dir(&tmp)
        .args(["grep", "abc"])
        .assert()
        .success()
        .stdout("/web/github: Token-ABC\n");
}
