use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const STATEMENT: &str = r#"{
    "page_1": [
        { "text": "Bank Statement", "confidence": 0.99 },
        { "text": "Account Number 12345", "confidence": 0.97 },
        { "text": "Opening Balance 1000.00", "confidence": 0.98 },
        { "text": "01/01/2024 opening deposit 500.00 0.00 1400.00", "confidence": 0.95 }
    ],
    "page_2": [
        { "text": "Pay to the order of John Smith", "confidence": 0.9 },
        { "text": "Memo: rent", "confidence": 0.9 }
    ]
}"#;

fn finscan() -> Command {
    Command::cargo_bin("finscan").unwrap()
}

fn write_input(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn process_reports_discrepancy() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "statement.json", STATEMENT);
    let output = dir.path().join("result.json");
    let discrepancies = dir.path().join("discrepancies.json");

    finscan()
        .args(["process", &input, "--strategy", "line-tokens", "-o"])
        .arg(&output)
        .arg("--discrepancies")
        .arg(&discrepancies)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let result = read_json(&output);
    assert_eq!(result["pages"][0]["category"], "bank_statement");
    assert_eq!(result["pages"][0]["validation"]["status"], "validated");
    assert_eq!(result["pages"][0]["validation"]["success"], false);
    assert_eq!(result["pages"][1]["category"], "check");

    let report = read_json(&discrepancies);
    assert_eq!(report["page_1"][0]["row"], 1);
    assert_eq!(report["page_1"][0]["calculated_balance"], "1500.00");
    assert!(report.get("page_2").is_none());
}

#[test]
fn process_json_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "statement.json", STATEMENT);

    finscan()
        .args(["process", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"page\": \"page_1\""))
        .stdout(predicate::str::contains("\"opening_balance\": \"1000.00\""));
}

#[test]
fn process_stdout_stays_json_with_discrepancies_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "statement.json", STATEMENT);
    let discrepancies = dir.path().join("discrepancies.json");

    let output = finscan()
        .args(["process", &input, "--strategy", "line-tokens", "--discrepancies"])
        .arg(&discrepancies)
        .output()
        .unwrap();

    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["pages"][0]["validation"]["success"], false);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Discrepancies written to"));
    assert!(discrepancies.exists());
}

#[test]
fn rust_log_enables_info_logs() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "statement.json", STATEMENT);

    finscan()
        .env("RUST_LOG", "info")
        .args(["process", &input])
        .assert()
        .success()
        .stderr(predicate::str::contains("Processing file"));
}

#[test]
fn process_csv_has_one_line_per_page() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "statement.json", STATEMENT);

    finscan()
        .args(["process", &input, "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("page,category,confidence"))
        .stdout(predicate::str::contains("page_2,check"));
}

#[test]
fn process_forced_category() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "statement.json", STATEMENT);

    finscan()
        .args(["process", &input, "--category", "salary_slip", "-f", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("page_1: salary_slip"))
        .stdout(predicate::str::contains("page_2: salary_slip"));
}

#[test]
fn process_rejects_unknown_category() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "statement.json", STATEMENT);

    finscan()
        .args(["process", &input, "--category", "invoice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown document category"));
}

#[test]
fn process_missing_input() {
    finscan()
        .args(["process", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn process_malformed_input() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "broken.json", "[1, 2, 3]");

    finscan().args(["process", &input]).assert().failure();
}

#[test]
fn classify_pages() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "statement.json", STATEMENT);

    finscan()
        .args(["classify", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"category\": \"bank_statement\""))
        .stdout(predicate::str::contains("\"category\": \"check\""));
}

#[test]
fn config_file_changes_strategy_and_tolerance() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "statement.json", STATEMENT);
    let config = write_input(
        &dir,
        "config.json",
        r#"{ "extraction": { "table_strategy": "line_tokens" }, "validation": { "tolerance": "100.00" } }"#,
    );

    finscan()
        .args(["-c", &config, "process", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"));
}

#[test]
fn config_init_and_set() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("finscan.json");
    let config_arg = config.to_string_lossy().into_owned();

    finscan()
        .args(["-c", &config_arg, "config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    finscan()
        .args(["-c", &config_arg, "config", "set", "extraction.table_strategy", "line_tokens"])
        .assert()
        .success();

    finscan()
        .args(["-c", &config_arg, "config", "get", "extraction.table_strategy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("line_tokens"));

    finscan()
        .args(["-c", &config_arg, "config", "set", "extraction.no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn batch_writes_results_and_summary() {
    let dir = TempDir::new().unwrap();
    write_input(&dir, "a.json", STATEMENT);
    write_input(&dir, "b.json", "not json");
    let out = dir.path().join("out");
    let pattern = dir.path().join("*.json").to_string_lossy().into_owned();

    finscan()
        .args(["batch", &pattern, "--summary", "--continue-on-error", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful, 1 failed"));

    assert!(out.join("a_result.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,pages"));
    assert!(summary.contains("a.json,success,2,1,1,0,0"));
    assert!(summary.contains("b.json,error"));
}

#[test]
fn batch_stops_on_error_by_default() {
    let dir = TempDir::new().unwrap();
    write_input(&dir, "broken.json", "not json");
    let pattern = dir.path().join("*.json").to_string_lossy().into_owned();

    finscan()
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}
