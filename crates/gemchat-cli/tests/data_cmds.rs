use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_data_list_seeds_built_ins_on_first_run() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("gemchat")
        .env("GEMCHAT_HOME", dir.path())
        .args(["data", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("What is a large language model?"))
        .stdout(predicate::str::contains("[seed]"));
}

#[test]
fn test_data_add_then_list_shows_user_sample() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("gemchat")
        .env("GEMCHAT_HOME", dir.path())
        .args(["data", "add", "What is GemChat?", "A terminal chatbot."])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added sample #"));

    cargo_bin_cmd!("gemchat")
        .env("GEMCHAT_HOME", dir.path())
        .args(["data", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[user] What is GemChat?"));
}

#[test]
fn test_data_add_duplicate_fails() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("gemchat")
        .env("GEMCHAT_HOME", dir.path())
        .args(["data", "add", "same question", "same answer"])
        .assert()
        .success();

    cargo_bin_cmd!("gemchat")
        .env("GEMCHAT_HOME", dir.path())
        .args(["data", "add", "same question", "same answer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate"));
}

#[test]
fn test_data_remove_missing_sample_fails() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("gemchat")
        .env("GEMCHAT_HOME", dir.path())
        .args(["data", "remove", "9999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No sample with id 9999"));
}

#[test]
fn test_data_reset_restores_built_ins() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("gemchat")
        .env("GEMCHAT_HOME", dir.path())
        .args(["data", "add", "extra q", "extra a"])
        .assert()
        .success();

    cargo_bin_cmd!("gemchat")
        .env("GEMCHAT_HOME", dir.path())
        .args(["data", "reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored"));

    cargo_bin_cmd!("gemchat")
        .env("GEMCHAT_HOME", dir.path())
        .args(["data", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("What is a prompt?"))
        .stdout(predicate::str::contains("extra q").not());
}
