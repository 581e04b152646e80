//! CLI integration tests for every subcommand.
//!
//! Uses `assert_cmd` to spawn the `admit` binary and checks exit codes,
//! stdout and stderr. Records come from the eval crate's fixtures or from
//! temp files derived from them.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TODAY: &str = "2026-03-01";

const ENV_OVERRIDES: [&str; 6] = [
    "ADMIT_LOOKUP_BASE_URL",
    "ADMIT_LOOKUP_AUTH_TOKEN",
    "ADMIT_SUBMIT_URL",
    "ADMIT_SUBMIT_AUTH_TOKEN",
    "ADMIT_DEBOUNCE_MS",
    "ADMIT_LOOKUP_TIMEOUT_MS",
];

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn fixture() -> PathBuf {
    workspace_root().join("crates/eval/tests/fixtures/complete_record.json")
}

fn fixture_json() -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(fixture()).unwrap()).unwrap()
}

/// Helper: the `admit` binary, rooted at the workspace with no
/// configuration leaking in from the environment.
fn admit() -> Command {
    let mut cmd = cargo_bin_cmd!("admit");
    cmd.current_dir(workspace_root());
    for var in ENV_OVERRIDES {
        cmd.env_remove(var);
    }
    cmd
}

fn write_json(dir: &TempDir, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("admit.toml");
    fs::write(&path, content).unwrap();
    path
}

/// Config whose lookup service is a local table holding India 110001.
fn table_config(dir: &TempDir) -> PathBuf {
    let table = write_json(
        dir,
        "postal.json",
        &serde_json::json!({
            "IN": {
                "110001": {
                    "state": "Delhi",
                    "acceptedCities": ["Delhi", "New Delhi"],
                    "defaultcity": "New Delhi"
                }
            }
        }),
    );
    write_config(
        dir,
        &format!("[lookup]\ntable = \"{}\"\n", table.display()),
    )
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    admit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Admissions record toolchain"));
}

#[test]
fn version_exits_0() {
    admit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("admit"));
}

// ──────────────────────────────────────────────
// 2. validate
// ──────────────────────────────────────────────

#[test]
fn validate_complete_record_succeeds() {
    admit()
        .args(["validate", "--today", TODAY])
        .arg(fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("valid: 0 error(s)"));
}

#[test]
fn validate_json_output_reports_valid() {
    let out = admit()
        .args(["--output", "json", "validate", "--today", TODAY])
        .arg(fixture())
        .output()
        .unwrap();
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["valid"], true);
    assert_eq!(report["errors"], 0);
}

#[test]
fn validate_missing_other_gender_fails() {
    let dir = TempDir::new().unwrap();
    let mut record = fixture_json();
    record["gender"] = "Other".into();
    let path = write_json(&dir, "record.json", &record);

    admit()
        .args(["validate", "--today", TODAY])
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("error: other_gender:"))
        .stdout(predicate::str::contains("invalid: 1 error(s)"));
}

#[test]
fn validate_two_fathers_reports_consistency_issue() {
    let dir = TempDir::new().unwrap();
    let mut record = fixture_json();
    let father = record["parents"][0].clone();
    record["parents"].as_array_mut().unwrap().push(father);
    let path = write_json(&dir, "record.json", &record);

    let out = admit()
        .args(["--output", "json", "validate", "--today", TODAY])
        .arg(&path)
        .output()
        .unwrap();
    assert!(!out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let consistency: Vec<_> = report["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|i| i["kind"] == "consistency")
        .collect();
    assert_eq!(consistency.len(), 1);
    assert_eq!(consistency[0]["path"], "parents[1].relation");
}

#[test]
fn validate_missing_file_fails() {
    admit()
        .args(["validate", "no/such/record.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading file"));
}

#[test]
fn validate_unknown_field_fails() {
    let dir = TempDir::new().unwrap();
    let mut record = fixture_json();
    record["nickname"] = "Ash".into();
    let path = write_json(&dir, "record.json", &record);

    admit()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nickname"));
}

#[test]
fn invalid_today_is_rejected() {
    admit()
        .args(["validate", "--today", "01/03/2026"])
        .arg(fixture())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --today"));
}

#[test]
fn quiet_suppresses_error_text() {
    admit()
        .args(["--quiet", "validate", "no/such/record.json"])
        .assert()
        .failure()
        .stderr(predicate::str::is_empty());
}

// ──────────────────────────────────────────────
// 3. evaluate
// ──────────────────────────────────────────────

#[test]
fn evaluate_reports_active_rules() {
    let out = admit()
        .args(["--output", "json", "evaluate"])
        .arg(fixture())
        .output()
        .unwrap();
    assert!(out.status.success());
    let update: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let required = update["active"]["required"].as_array().unwrap();
    assert!(required.iter().any(|f| f == "aadhaar_number"));
    assert!(update["active"]["hidden"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "passport_number"));
}

#[test]
fn evaluate_text_lists_cleared_fields() {
    let dir = TempDir::new().unwrap();
    let mut record = fixture_json();
    record["passport_number"] = "K1234567".into();
    let path = write_json(&dir, "record.json", &record);

    admit()
        .arg("evaluate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("cleared:  passport_number"));
}

// ──────────────────────────────────────────────
// 4. payload
// ──────────────────────────────────────────────

#[test]
fn payload_carries_attachment_and_filename() {
    let out = admit()
        .args(["payload", "--today", TODAY])
        .arg(fixture())
        .output()
        .unwrap();
    assert!(out.status.success());
    let payload: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(payload["recent_photograph_filename"], "photo.png");
    assert_eq!(payload["recent_photograph"], "iVBORw0KGgo=");
    assert_eq!(payload["middle_name"], "");
    assert_eq!(payload["siblings"], serde_json::json!([]));
}

#[test]
fn payload_refuses_invalid_record() {
    let dir = TempDir::new().unwrap();
    let mut record = fixture_json();
    record["declaration_accepted"] = false.into();
    let path = write_json(&dir, "record.json", &record);

    admit()
        .args(["payload", "--today", TODAY])
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("record has 1 error(s)"))
        .stderr(predicate::str::contains("declaration_accepted"));
}

// ──────────────────────────────────────────────
// 5. lookup
// ──────────────────────────────────────────────

#[test]
fn lookup_from_table_uses_default_city() {
    let dir = TempDir::new().unwrap();
    let config = table_config(&dir);

    admit()
        .arg("--config")
        .arg(&config)
        .args(["lookup", "--country", "India", "--postal-code", "110001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("region: Delhi"))
        .stdout(predicate::str::contains("city:   New Delhi"));
}

#[test]
fn lookup_json_output() {
    let dir = TempDir::new().unwrap();
    let config = table_config(&dir);

    let out = admit()
        .arg("--config")
        .arg(&config)
        .args(["--output", "json", "lookup", "--country", "IN", "--postal-code", "110001"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let found: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(found["chosen_region"], "Delhi");
    assert_eq!(found["city_options"], serde_json::json!(["Delhi", "New Delhi"]));
}

#[test]
fn lookup_rejects_unknown_country() {
    let dir = TempDir::new().unwrap();
    let config = table_config(&dir);

    admit()
        .arg("--config")
        .arg(&config)
        .args(["lookup", "--country", "Atlantis", "--postal-code", "110001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid country"));
}

#[test]
fn lookup_rejects_short_postal_code() {
    let dir = TempDir::new().unwrap();
    let config = table_config(&dir);

    admit()
        .arg("--config")
        .arg(&config)
        .args(["lookup", "--country", "India", "--postal-code", "11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("too short"));
}

#[test]
fn lookup_without_service_fails() {
    admit()
        .args(["lookup", "--country", "India", "--postal-code", "110001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no address lookup configured"));
}

#[test]
fn malformed_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "[lookup]\nbase_url = 42\n");

    admit()
        .arg("--config")
        .arg(&config)
        .args(["lookup", "--country", "India", "--postal-code", "110001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("admit.toml"));
}

// ──────────────────────────────────────────────
// 6. submit
// ──────────────────────────────────────────────

#[test]
fn submit_without_endpoint_fails() {
    admit()
        .args(["submit", "--today", TODAY])
        .arg(fixture())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no submission endpoint configured"));
}

#[test]
fn submit_without_login_is_refused() {
    admit()
        .env("ADMIT_SUBMIT_URL", "http://127.0.0.1:9/applications")
        .args(["--output", "json", "submit", "--today", TODAY])
        .arg(fixture())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not logged in"));
}
