use assert_cmd::prelude::*;
use rstest::rstest;
use std::process::Command;
use tempfile::tempdir;

fn json_line(stdout: &[u8], key: &str) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(stdout);
    let line = stdout
        .lines()
        .find(|l| l.contains(&format!("\"{key}\"")))
        .unwrap_or_else(|| panic!("no JSON line with {key}; stdout was: {stdout}"));
    serde_json::from_str(line).expect("valid JSON")
}

/// Validate the JSON summary of a successful simulated run.
#[rstest]
fn json_summary_schema() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("run.csv");

    let mut cmd = Command::cargo_bin("toaster_cli").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .args(["toast", "--sim", "--no-prompt", "--target", "190", "--record"])
        .arg(&log);

    let out = cmd.assert().success().get_output().stdout.clone();
    let v = json_line(&out, "outcome");

    assert_eq!(v["outcome"], "target_reached");
    assert_eq!(v["target"], 190);
    assert_eq!(v["hits"], 5);
    assert_eq!(v["skipped"], 0);
    assert!(v["elapsed_s"].as_f64().unwrap() > 285.0);
    assert!(v["effective_s"].as_f64().is_some());
    assert!(v["transition_s"].as_f64().unwrap() > 285.0);
    assert!(v["cycles"].as_u64().unwrap() > 280);
    assert!(v["last_r"].as_u64().unwrap() <= 190);
    assert_eq!(v["record"], log.display().to_string());
}

/// Errors become a single JSON object on stdout with a stable reason.
#[rstest]
fn json_error_schema() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("run.csv");

    let mut cmd = Command::cargo_bin("toaster_cli").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("TOASTER_TEST_SIM_FAIL", "3")
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .args(["toast", "--sim", "--no-prompt", "--record"])
        .arg(&log);

    let out = cmd.assert().code(4).get_output().stdout.clone();
    let v = json_line(&out, "reason");

    assert_eq!(v["reason"], "Hardware");
    assert_eq!(v["exit_code"], 4);
    assert!(v["error"].as_str().is_some());
    assert!(
        v["message"]
            .as_str()
            .unwrap()
            .starts_with("What happened: Hardware problem")
    );
}

#[rstest]
fn json_self_check() {
    let mut cmd = Command::cargo_bin("toaster_cli").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--json")
        .args(["self-check", "--sim"]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let v = json_line(&out, "ok");
    assert_eq!(v["ok"], true);
    assert!(v["r"].as_u64().is_some());
    assert_eq!(v["lab"].as_array().map(Vec::len), Some(3));
}
