use assert_cmd::Command;
use predicates::prelude::*;

const ENV_VARS: [&str; 13] = [
    "CLIENT_ID",
    "CLIENT_SECRET",
    "ACCESS_TOKEN",
    "REFRESH_TOKEN",
    "CHANNELS",
    "WORK_TRACKER_URL",
    "WORK_TRACKER_TOKEN",
    "HELIX_API_URL",
    "ID_API_URL",
    "REFRESH_INTERVAL_SECS",
    "REFRESH_THRESHOLD_SECS",
    "STARTUP_MIN_REMAINING_SECS",
    "REQUEST_TIMEOUT_SECS",
];

fn workbot() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("workbot"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn version_flag_prints_version() {
    workbot()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_lists_environment_variables() {
    workbot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("CLIENT_ID"))
        .stdout(predicate::str::contains("CHANNELS"))
        .stdout(predicate::str::contains("WORK_TRACKER_URL"));
}

#[test]
fn missing_credentials_fail_before_startup() {
    workbot()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--client-id"));
}

#[test]
fn secrets_are_not_echoed_in_help() {
    workbot()
        .env("CLIENT_SECRET", "super-secret-value")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("super-secret-value").not());
}
