//! Integration tests for the `netsight` binary.
//!
//! Argument parsing, config editing, and error exits run without a backend.
//! The data commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `netsight` binary with env isolation.
///
/// Clears all `NETSIGHT_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn netsight_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netsight");
    cmd.env("HOME", "/tmp/netsight-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/netsight-cli-test-nonexistent")
        .env_remove("NETSIGHT_CONFIG")
        .env_remove("NETSIGHT_API_URL")
        .env_remove("NETSIGHT_WS_URL")
        .env_remove("NETSIGHT_OUTPUT")
        .env_remove("NETSIGHT_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// A config file that polls only and never retries, so failures are fast.
fn write_config(dir: &Path, base_url: &str) -> std::path::PathBuf {
    let file = dir.join("config.toml");
    std::fs::write(
        &file,
        format!(
            "[api]\nbase_url = \"{base_url}\"\ntimeout_secs = 2\nretry_attempts = 0\n\n\
             [websocket]\nenabled = false\n"
        ),
    )
    .unwrap();
    file
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = netsight_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_flag() {
    netsight_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("network monitoring backend")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("alerts")),
    );
}

#[test]
fn test_version_flag() {
    netsight_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netsight"));
}

#[test]
fn test_invalid_subcommand() {
    let output = netsight_cmd().arg("frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_ping_requires_a_device() {
    let output = netsight_cmd().arg("ping").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    netsight_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("netsight"));
}

#[test]
fn test_completions_zsh() {
    netsight_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("custom.toml");
    netsight_cmd()
        .args(["config", "path", "--config"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_set_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");

    netsight_cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "set", "polling.traffic_ms", "2500"])
        .assert()
        .success();

    netsight_cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "set", "api.token", "hunter2"])
        .assert()
        .success();

    netsight_cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("traffic_ms = 2500")
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    let output = netsight_cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "set", "polling.nope", "1"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("polling.nope"));
    assert!(!file.exists());
}

#[test]
fn test_config_set_rejects_zero_interval() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    let output = netsight_cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "set", "polling.events_ms", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!file.exists());
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");

    netsight_cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(file.exists());

    let output = netsight_cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "init"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    netsight_cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_validate_reports_bad_url() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_config(dir.path(), "ftp://example.test/api");
    let output = netsight_cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "validate"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("base_url"));
}

// ── Backend commands ────────────────────────────────────────────────

#[test]
fn test_unreachable_backend_exits_with_connection_code() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_config(dir.path(), "http://127.0.0.1:9/api/v1");
    let output = netsight_cmd()
        .arg("--config")
        .arg(&file)
        .args(["devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(combined_output(&output).contains("127.0.0.1:9"));
}

async fn mount(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1{route}")))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_json_against_backend() {
    let server = MockServer::start().await;
    mount(&server, "/health", json!({ "status": "ok" })).await;
    mount(
        &server,
        "/devices",
        json!({ "devices": [
            { "id": "d1", "ip": "192.168.1.10", "name": "core-switch", "status": "online" },
            { "id": "d2", "ip": "192.168.1.20", "status": "offline" }
        ] }),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_config(dir.path(), &format!("{}/api/v1", server.uri()));

    let mut cmd = netsight_cmd();
    cmd.env("NETSIGHT_TOKEN", "s3cret")
        .arg("--config")
        .arg(&file)
        .args(["devices", "list", "--status", "online", "-o", "json"]);
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let devices: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let devices = devices.as_array().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["address"], "192.168.1.10");
    assert_eq!(devices[0]["name"], "core-switch");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_device_exits_not_found() {
    let server = MockServer::start().await;
    mount(&server, "/health", json!({ "status": "ok" })).await;
    mount(&server, "/devices", json!({ "devices": [] })).await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_config(dir.path(), &format!("{}/api/v1", server.uri()));

    let mut cmd = netsight_cmd();
    cmd.env("NETSIGHT_TOKEN", "s3cret")
        .arg("--config")
        .arg(&file)
        .args(["devices", "get", "10.9.9.9"]);
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("10.9.9.9"));
}
