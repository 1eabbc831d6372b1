//! CLI integration tests for all implemented subcommands.
//!
//! Uses `assert_cmd` to spawn the `formlift` binary and verify
//! exit codes, stdout content, and stderr content.
//!
//! All tests set `current_dir` to the workspace root so that relative
//! paths to the fixtures resolve correctly.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/cli -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

/// Helper: create a Command for the `formlift` binary, rooted at workspace.
fn formlift() -> Command {
    let mut cmd = cargo_bin_cmd!("formlift");
    cmd.current_dir(workspace_root());
    cmd.env_remove("FORMLIFT_LOG");
    cmd
}

/// Convert the basic fixture into `dir`, returning the schema path.
fn convert_basic(dir: &TempDir, file_name: &str, format: &str) -> PathBuf {
    let out = dir.path().join(file_name);
    formlift()
        .args([
            "convert",
            "--rows",
            "fixtures/basic/rows.csv",
            "--lookups",
            "fixtures/basic/lookups.csv",
            "--config",
            "fixtures/basic/mapping.toml",
            "--format",
            format,
            "--out",
        ])
        .arg(&out)
        .assert()
        .success();
    out
}

fn field<'a>(schema: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    schema["fields"]
        .as_array()
        .and_then(|fields| fields.iter().find(|f| f["key"] == key))
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    formlift()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Convert legacy spreadsheet form definitions",
        ));
}

#[test]
fn version_exits_0() {
    formlift()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("formlift"));
}

#[test]
fn convert_help_lists_flags() {
    formlift()
        .args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--rows"))
        .stdout(predicate::str::contains("--summary"));
}

// ──────────────────────────────────────────────
// 2. Convert subcommand
// ──────────────────────────────────────────────

#[test]
fn convert_writes_canonical_json_schema() {
    let tmp = TempDir::new().unwrap();
    let out = convert_basic(&tmp, "schema.json", "json");

    let schema: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(schema["key"], "entity-onboarding");

    let tax = field(&schema, "GENtaxId").expect("GENtaxId emitted");
    let values: Vec<&str> = tax["visibility"]
        .as_array()
        .unwrap()
        .iter()
        .map(|rule| rule["conditions"][0]["value"].as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["LU", "FR"]);

    let regulator = field(&schema, "GENregulator").unwrap();
    assert_eq!(regulator["visibility"][0]["conditions"][0]["value"], "Yes");

    assert!(field(&schema, "GENinternalNote").is_none());
    assert!(field(&schema, "GENsystemId").is_none());
    assert!(field(&schema, "GENaddress").is_some());
}

#[test]
fn convert_reports_in_text_mode() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("schema.yaml");
    formlift()
        .args([
            "convert",
            "--rows",
            "fixtures/basic/rows.csv",
            "--lookups",
            "fixtures/basic/lookups.csv",
            "--config",
            "fixtures/basic/mapping.toml",
            "--out",
        ])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote"))
        .stdout(predicate::str::contains("2 excluded"));
    assert!(out.exists());
}

#[test]
fn convert_without_out_prints_yaml() {
    formlift()
        .args([
            "convert",
            "--rows",
            "fixtures/basic/rows.csv",
            "--lookups",
            "fixtures/basic/lookups.csv",
            "--config",
            "fixtures/basic/mapping.toml",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("key: entity-onboarding"))
        .stdout(predicate::str::contains("sourceKey: GENcountry"));
}

#[test]
fn convert_writes_run_summary() {
    let tmp = TempDir::new().unwrap();
    let summary_path = tmp.path().join("summary.json");
    formlift()
        .args([
            "convert",
            "--rows",
            "fixtures/basic/rows.csv",
            "--lookups",
            "fixtures/basic/lookups.csv",
            "--config",
            "fixtures/basic/mapping.toml",
            "--format",
            "json",
            "--out",
        ])
        .arg(tmp.path().join("schema.json"))
        .arg("--summary")
        .arg(&summary_path)
        .assert()
        .success();

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(summary["rows_seen"], 12);
    assert_eq!(summary["excluded"], 2);
    assert_eq!(summary["unsupported_expressions"][0]["key"], "GENamount");
}

#[test]
fn convert_json_output_reports_summary() {
    let tmp = TempDir::new().unwrap();
    let output = formlift()
        .args([
            "--output",
            "json",
            "convert",
            "--rows",
            "fixtures/basic/rows.csv",
            "--lookups",
            "fixtures/basic/lookups.csv",
            "--config",
            "fixtures/basic/mapping.toml",
            "--out",
        ])
        .arg(tmp.path().join("schema.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["excluded"], 2);
}

#[test]
fn duplicate_keys_fail_without_writing() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("schema.yaml");
    formlift()
        .args([
            "convert",
            "--rows",
            "fixtures/duplicate/rows.csv",
            "--config",
            "fixtures/duplicate/mapping.json",
            "--out",
        ])
        .arg(&out)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("duplicate field key 'GENname'"));
    assert!(!out.exists());
}

#[test]
fn duplicate_keys_json_error_is_structured() {
    let output = formlift()
        .args([
            "--output",
            "json",
            "convert",
            "--rows",
            "fixtures/duplicate/rows.csv",
            "--config",
            "fixtures/duplicate/mapping.json",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let err: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["pass"], 2);
    assert_eq!(err["field_key"], "GENname");
    assert_eq!(err["row"], 4);
}

#[test]
fn missing_rows_file_exits_1() {
    formlift()
        .args([
            "convert",
            "--rows",
            "fixtures/nope.csv",
            "--config",
            "fixtures/basic/mapping.toml",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("fixtures/nope.csv"));
}

// ──────────────────────────────────────────────
// 3. Compile subcommand
// ──────────────────────────────────────────────

#[test]
fn compile_expands_bare_values() {
    formlift()
        .args(["compile", "A = 'x' OR 'y'"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sourceKey\": \"A\""))
        .stdout(predicate::str::contains("\"value\": \"y\""))
        .stdout(predicate::str::contains("\"operator\": \"eq\""));
}

#[test]
fn compile_json_lists_dropped_fragments() {
    let output = formlift()
        .args(["--output", "json", "compile", "A == 1 AND B == 2 OR 'z'"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["rules"].as_array().unwrap().len(), 1);
    assert_eq!(json["dropped"][0]["reason"], "bare_value_unattached");
}

#[test]
fn compile_rejects_parentheses() {
    formlift()
        .args(["compile", "(A == 1) OR B == 2"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "parenthesized grouping is not supported",
        ));
}

// ──────────────────────────────────────────────
// 4. Lint subcommand
// ──────────────────────────────────────────────

#[test]
fn lint_converted_fixture_is_clean() {
    let tmp = TempDir::new().unwrap();
    let out = convert_basic(&tmp, "schema.yaml", "yaml");
    formlift()
        .arg("lint")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("References: 0 unresolved"))
        .stdout(predicate::str::contains("Cycles: 0"));
}

#[test]
fn lint_fails_on_cycles_and_unresolved_keys() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("schema.json");
    let doc = serde_json::json!({
        "key": "cyclic",
        "name": "Cyclic",
        "version": "1",
        "fields": [
            {"key": "A", "label": "A", "type": "string",
             "visibility": [{"allConditionsMustMatch": true,
                             "conditions": [{"sourceKey": "B", "operator": "eq", "value": "x"}]}]},
            {"key": "B", "label": "B", "type": "string",
             "visibility": [{"allConditionsMustMatch": true,
                             "conditions": [{"sourceKey": "A", "operator": "eq", "value": "y"}]}]},
            {"key": "C", "label": "C", "type": "string",
             "visibility": [{"allConditionsMustMatch": true,
                             "conditions": [{"sourceKey": "Ghost", "operator": "neq", "value": "z"}]}]}
        ]
    });
    fs::write(&path, doc.to_string()).unwrap();

    let output = formlift()
        .args(["--output", "json", "lint"])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["totals"]["cycles"], 1);
    let kinds: Vec<&str> = report["findings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"unresolved_key"));
    assert!(kinds.contains(&"cycle"));
}

// ──────────────────────────────────────────────
// 5. Eval subcommand
// ──────────────────────────────────────────────

#[test]
fn eval_lists_visible_fields() {
    let tmp = TempDir::new().unwrap();
    let schema = convert_basic(&tmp, "schema.json", "json");
    let answers = tmp.path().join("answers.json");
    fs::write(&answers, r#"{"GENisRegulated": "Yes", "GENcountry": "LU"}"#).unwrap();

    formlift()
        .arg("eval")
        .arg(&schema)
        .arg("--answers")
        .arg(&answers)
        .assert()
        .success()
        .stdout(predicate::str::contains("GENregulator"))
        .stdout(predicate::str::contains("GENtaxId"))
        .stdout(predicate::str::contains("GENshares"));
}

#[test]
fn eval_hides_fields_behind_unanswered_controllers() {
    let tmp = TempDir::new().unwrap();
    let schema = convert_basic(&tmp, "schema.yaml", "yaml");
    let answers = tmp.path().join("answers.json");
    fs::write(&answers, "{}").unwrap();

    let output = formlift()
        .args(["--output", "json", "eval"])
        .arg(&schema)
        .arg("--answers")
        .arg(&answers)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let visible: Vec<&str> = json["visible"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(visible.contains(&"GENshares"));
    assert!(visible.contains(&"GENentityName"));
    assert!(!visible.contains(&"GENregulator"));
    assert!(!visible.contains(&"GENtaxId"));
}

#[test]
fn eval_rejects_non_object_answers() {
    let tmp = TempDir::new().unwrap();
    let schema = convert_basic(&tmp, "schema.json", "json");
    let answers = tmp.path().join("answers.json");
    fs::write(&answers, "[1, 2]").unwrap();

    formlift()
        .arg("eval")
        .arg(&schema)
        .arg("--answers")
        .arg(&answers)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("answers must be a JSON object"));
}
