//! Smoke tests -- verify the binary runs and key modules load.

use assert_cmd::Command;

#[test]
fn test_cli_help() {
    Command::cargo_bin("bridgewatch")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "Cross-chain bridge health monitoring",
        ));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("bridgewatch")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("bridgewatch"));
}

#[test]
fn test_check_subcommand_exists() {
    Command::cargo_bin("bridgewatch")
        .unwrap()
        .args(["check", "--help"])
        .assert()
        .success();
}

#[test]
fn test_incidents_subcommand_exists() {
    Command::cargo_bin("bridgewatch")
        .unwrap()
        .args(["incidents", "--help"])
        .assert()
        .success();
}

#[test]
fn test_seed_and_bridges_list() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("smoke.db");

    Command::cargo_bin("bridgewatch")
        .unwrap()
        .env("BRIDGEWATCH_DB_PATH", db_path.to_str().unwrap())
        .arg("seed")
        .assert()
        .success()
        .stdout(predicates::str::contains("Seeded 5 bridges."));

    Command::cargo_bin("bridgewatch")
        .unwrap()
        .env("BRIDGEWATCH_DB_PATH", db_path.to_str().unwrap())
        .arg("bridges")
        .assert()
        .success()
        .stdout(predicates::str::contains("Stargate"))
        .stdout(predicates::str::contains("Hop Protocol"));
}
