//! Integration tests for the `apexctl` binary.
//!
//! Argument parsing, help output, completions, and error exit codes run
//! without a controller; the end-to-end cases drive the binary against a
//! wiremock controller.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `apexctl` binary with env isolation.
///
/// Clears all `APEX_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn apex_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("apexctl");
    cmd.env("HOME", "/tmp/apexctl-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/apexctl-test-nonexistent")
        .env_remove("APEX_PROFILE")
        .env_remove("APEX_HOST")
        .env_remove("APEX_USERNAME")
        .env_remove("APEX_PASSWORD")
        .env_remove("APEX_OUTPUT")
        .env_remove("APEX_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary against `server` off the async runtime.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let mut cmd = apex_cmd();
    cmd.args(["--host", &server.uri()])
        .env("APEX_PASSWORD", "pw")
        .args(args);
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

async fn modern_controller() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "connect.sid": "abc" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "system": { "hostname": "reef", "software": "5.08_7A18L", "hardware": "1.0", "serial": "AC5:1", "type": "AC5" },
            "inputs": [{ "did": "base_Temp", "type": "Temp", "name": "Tmp", "value": 25.4 }],
            "outputs": [
                { "status": ["AON", "", "OK", ""], "name": "Return", "type": "outlet", "ID": 1, "did": "2_1" },
                { "status": ["OFF", "", "OK", ""], "name": "Heater", "type": "outlet", "ID": 2, "did": "2_2" }
            ],
            "feed": { "name": 0, "active": 0 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "oconf": [{ "did": "2_2", "name": "Heater", "ctype": "Heater", "prog": "" }],
            "mconf": [{ "abaddr": 5, "hwtype": "DOS", "extra": {} }],
            "pconf": [{ "ID": 1, "name": "P1", "type": "dose", "data": {} }],
            "iconf": [],
            "nconf": { "latestFirmware": "5.10_1B25" }
        })))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = apex_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    apex_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("aquarium")
            .and(predicate::str::contains("outputs"))
            .and(predicate::str::contains("dose"))
            .and(predicate::str::contains("firmware")),
    );
}

#[test]
fn test_version_flag() {
    apex_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("apexctl"));
}

#[test]
fn test_completions_bash() {
    apex_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("apexctl"));
}

#[test]
fn test_invalid_output_state_is_a_usage_error() {
    apex_cmd()
        .args(["outputs", "set", "2_1", "toggle"])
        .assert()
        .code(2);
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_status_without_config_reports_missing_config() {
    let output = apex_cmd().arg("status").output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    let text = combined_output(&output);
    assert!(text.contains("No controller configured"), "got:\n{text}");
}

#[test]
fn test_unknown_profile() {
    let output = apex_cmd()
        .args(["--profile", "garage", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("garage"));
}

// ── Against a controller ────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json() {
    let server = modern_controller().await;

    let output = run_against(&server, &["status", "-o", "json"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["generation"], "modern");
    assert_eq!(body["system"]["hostname"], "reef");
    assert_eq!(body["outputs"][1]["did"], "2_2");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_outputs_plain() {
    let server = modern_controller().await;

    let output = run_against(&server, &["outputs", "list", "-o", "plain"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "2_1\tAON\n2_2\tOFF\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_firmware_show() {
    let server = modern_controller().await;

    let output = run_against(&server, &["firmware", "show", "-o", "json-compact"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        r#"{"installed":"5.08_7A18","latest":"5.10_1B25"}"#
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bad_pump_id_is_a_usage_error() {
    let server = modern_controller().await;

    let output = run_against(&server, &["dose", "set", "5_3", "--slot", "1", "1.0"]).await;

    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_password_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let output = run_against(&server, &["status"]).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_legacy_controller() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/status.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "istat": {
                "hostname": "classic", "software": "4.53_1A17", "hardware": "1.0",
                "inputs": { "did": "base_Temp", "name": "Temp", "type": "Temp", "value": 77.1 },
                "outputs": [{ "did": "base_Var1", "name": "Heater", "status": ["AOF"], "ID": 0 }]
            }
        })))
        .mount(&server)
        .await;

    let output = run_against(&server, &["inputs", "-o", "plain"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Temp\t77.1\n");

    let output = run_against(&server, &["firmware", "update", "-y"]).await;
    assert_eq!(output.status.code(), Some(5), "{}", combined_output(&output));
}
