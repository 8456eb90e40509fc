#![cfg(not(target_arch = "wasm32"))]

use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn top_level_help_lists_subcommands() {
    Command::cargo_bin("neotools")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("mode"))
        .stdout(contains("applets"))
        .stdout(contains("files"));
}

#[test]
fn applets_help_lists_subcommands() {
    Command::cargo_bin("neotools")
        .unwrap()
        .args(["applets", "--help"])
        .assert()
        .success()
        .stdout(contains("list"))
        .stdout(contains("fetch"))
        .stdout(contains("install"));
}

#[test]
fn files_help_lists_subcommands() {
    Command::cargo_bin("neotools")
        .unwrap()
        .args(["files", "--help"])
        .assert()
        .success()
        .stdout(contains("read"))
        .stdout(contains("write"))
        .stdout(contains("clear"));
}

#[test]
fn missing_required_argument_fails() {
    Command::cargo_bin("neotools")
        .unwrap()
        .args(["files", "write", "only_one_arg"])
        .assert()
        .failure();
}
