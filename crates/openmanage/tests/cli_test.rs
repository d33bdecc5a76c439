//! Integration tests for the `openmanage` binary.
//!
//! Argument parsing, configuration errors, and the result document on an
//! unreachable device. No live device is needed.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command with env isolation.
///
/// Clears every `OPENMANAGE_*` variable the CLI reads and points the
/// config directory at a nonexistent path.
fn openmanage_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("openmanage");
    cmd.env("HOME", "/tmp/openmanage-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/openmanage-cli-test-nonexistent")
        .env_remove("OPENMANAGE_PROFILE")
        .env_remove("OPENMANAGE_HOSTNAME")
        .env_remove("OPENMANAGE_PORT")
        .env_remove("OPENMANAGE_USERNAME")
        .env_remove("OPENMANAGE_PASSWORD")
        .env_remove("OPENMANAGE_AUTH_TOKEN")
        .env_remove("OPENMANAGE_CA_PATH")
        .env_remove("OPENMANAGE_TIMEOUT")
        .env_remove("OPENMANAGE_OUTPUT")
        .env_remove("OPENMANAGE_VCENTER_UUID")
        .env_remove("OPENMANAGE_LOG")
        .env_remove("REQUESTS_CA_BUNDLE")
        .env_remove("CURL_CA_BUNDLE")
        .env_remove("OMAM_CA_BUNDLE");
    cmd
}

/// Connection flags for a port nothing listens on.
const CLOSED_PORT: [&str; 8] = [
    "--hostname",
    "127.0.0.1",
    "--port",
    "1",
    "--username",
    "root",
    "--timeout",
    "5",
];

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not a JSON document ({e}):\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn args_file(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = openmanage_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    openmanage_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("lc-job")
            .and(predicate::str::contains("power"))
            .and(predicate::str::contains("ome-job-info"))
            .and(predicate::str::contains("module")),
    );
}

#[test]
fn test_version_flag() {
    openmanage_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("openmanage"));
}

#[test]
fn test_completions_bash() {
    openmanage_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_reset_type_is_a_usage_error() {
    openmanage_cmd()
        .args(["power", "--reset-type", "Explode"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ForceOff"));
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_missing_hostname_reports_config_error() {
    openmanage_cmd()
        .args(["lc-job", "status", "--job-id", "JID_1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No target device configured"));
}

#[test]
fn test_unknown_profile_reports_config_error() {
    openmanage_cmd()
        .args(["--profile", "lab", "lc-job-queue", "delete"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("lab"));
}

#[test]
fn test_conflicting_credentials_rejected_before_connecting() {
    openmanage_cmd()
        .args(["--hostname", "127.0.0.1", "--username", "root"])
        .args(["--password", "calvin", "--auth-token", "tok"])
        .args(["lc-job", "status", "--job-id", "JID_1"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("mutually exclusive"));
}

#[test]
fn test_omevv_runs_without_vcenter_uuid() {
    let output = openmanage_cmd()
        .args(CLOSED_PORT)
        .args(["--password", "x", "--output", "json-compact"])
        .arg("omevv-vcenter-info")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["unreachable"], true);
    assert!(!result["msg"].as_str().unwrap().contains("vcenter_uuid"));
}

// ── Result document ─────────────────────────────────────────────────

#[test]
fn test_unreachable_device_prints_unreachable_result() {
    let output = openmanage_cmd()
        .args(CLOSED_PORT)
        .args(["--password", "calvin", "--output", "json-compact"])
        .args(["lc-job", "status", "--job-id", "JID_1"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["failed"], true);
    assert_eq!(result["unreachable"], true);
    assert_eq!(result["changed"], false);
}

#[test]
fn test_password_never_reaches_output() {
    let output = openmanage_cmd()
        .args(CLOSED_PORT)
        .args(["--password", "s3cr3t-value", "-vvv"])
        .args(["lc-job-queue", "delete"])
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stdout.contains("s3cr3t-value"));
    assert!(!stderr.contains("s3cr3t-value"));
}

// ── Ansible module entry point ──────────────────────────────────────

#[test]
fn test_module_unreachable_device() {
    let file = args_file(
        r#"{"ANSIBLE_MODULE_ARGS": {
            "idrac_ip": "127.0.0.1",
            "idrac_port": 1,
            "idrac_user": "root",
            "idrac_password": "calvin",
            "validate_certs": false,
            "timeout": 5,
            "job_id": "JID_1",
            "_ansible_check_mode": true
        }}"#,
    );

    let output = openmanage_cmd()
        .arg("module")
        .arg("idrac_lifecycle_controller_jobs")
        .arg(file.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["failed"], true);
    assert_eq!(result["unreachable"], true);
}

#[test]
fn test_module_bad_args_report_failed_document() {
    let file = args_file(r#"{"hostname": "127.0.0.1"}"#);

    let output = openmanage_cmd()
        .args(["module", "ome_job_info"])
        .arg(file.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["failed"], true);
    assert!(
        result["msg"]
            .as_str()
            .unwrap()
            .contains("ANSIBLE_MODULE_ARGS")
    );
}

#[test]
fn test_module_missing_operation_option() {
    let file = args_file(
        r#"{"ANSIBLE_MODULE_ARGS": {"hostname": "127.0.0.1", "username": "root", "password": "x"}}"#,
    );

    let output = openmanage_cmd()
        .args(["module", "redfish_powerstate"])
        .arg(file.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["changed"], false);
    assert!(result["msg"].as_str().unwrap().contains("reset_type"));
}

#[test]
fn test_module_omevv_accepts_vcenter_credentials_without_uuid() {
    let file = args_file(
        r#"{"ANSIBLE_MODULE_ARGS": {
            "hostname": "127.0.0.1",
            "port": 1,
            "vcenter_username": "administrator@vsphere.local",
            "vcenter_password": "pw",
            "timeout": 5
        }}"#,
    );

    let output = openmanage_cmd()
        .args(["module", "omevv_vcenter_info"])
        .arg(file.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["unreachable"], true);
}

#[test]
fn test_unknown_module_is_a_usage_error() {
    let file = args_file(r#"{"ANSIBLE_MODULE_ARGS": {"hostname": "127.0.0.1"}}"#);

    openmanage_cmd()
        .args(["module", "ome_firmware"])
        .arg(file.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown module"));
}
