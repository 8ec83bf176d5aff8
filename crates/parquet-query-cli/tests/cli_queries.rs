#![allow(missing_docs)]

mod common;

use std::process::Command;

use assert_cmd::prelude::*;
use common::write_customers;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const CUSTOMERS: &str = "Customer List.parquet";

fn cli_bin() -> &'static str {
    env!("CARGO_BIN_EXE_pqquery")
}

/// A `pqquery` invocation against `store`, isolated from the caller's
/// environment.
fn pqquery(store: &TempDir) -> Command {
    let mut cmd = Command::new(cli_bin());
    for var in [
        "PQ_STORE",
        "GCS_BUCKET_NAME",
        "PQ_CREDENTIALS",
        "GCP_PROJECT_ID",
        "PQ_TIMEOUT_SECS",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.arg("--store").arg(store.path());
    cmd
}

fn fixture() -> Result<TempDir, Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    write_customers(&tmp.path().join(CUSTOMERS))?;
    Ok(tmp)
}

fn stdout_json(output: &std::process::Output) -> Result<Value, serde_json::Error> {
    serde_json::from_slice(&output.stdout)
}

#[test]
fn schema_prints_types_and_row_count() -> TestResult {
    let tmp = fixture()?;
    let output = pqquery(&tmp).arg("schema").output()?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output)?;
    assert_eq!(json["row_count"], 3);
    assert_eq!(json["columns"]["score"], "Float64");
    let keys: Vec<&String> = json["columns"]
        .as_object()
        .map(|m| m.keys().collect())
        .unwrap_or_default();
    assert_eq!(keys, ["id", "name", "score"]);
    Ok(())
}

#[test]
fn rows_page_as_json() -> TestResult {
    let tmp = fixture()?;
    let output = pqquery(&tmp)
        .args(["rows", "--limit", "2", "--offset", "1"])
        .output()?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output)?;
    assert_eq!(json["count"], 2);
    assert_eq!(json["offset"], 1);
    assert_eq!(json["limit"], 2);
    assert_eq!(json["data"][0]["id"], 2);
    assert_eq!(json["data"][0]["score"], Value::Null);
    assert_eq!(json["data"][1]["id"], 3);
    Ok(())
}

#[test]
fn rows_filter_and_projection() -> TestResult {
    let tmp = fixture()?;
    let output = pqquery(&tmp)
        .args([
            "rows",
            "--columns",
            "id",
            "--filter-column",
            "name",
            "--filter-value",
            "b",
        ])
        .output()?;
    assert!(output.status.success());

    let json = stdout_json(&output)?;
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0], serde_json::json!({"id": 2}));
    Ok(())
}

#[test]
fn rows_as_table() -> TestResult {
    let tmp = fixture()?;
    pqquery(&tmp)
        .args(["rows", "--format", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name").and(predicate::str::contains("30")));
    Ok(())
}

#[test]
fn explain_prints_a_plan() -> TestResult {
    let tmp = fixture()?;
    pqquery(&tmp)
        .args(["rows", "--filter-column", "name", "--filter-value", "b", "--explain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name"));
    Ok(())
}

#[test]
fn invalid_columns_exit_with_client_status() -> TestResult {
    let tmp = fixture()?;
    let output = pqquery(&tmp)
        .args(["rows", "--columns", "id,missing"])
        .output()?;

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let body: Value = serde_json::from_slice(&output.stderr)?;
    assert_eq!(body["error"], "invalid_columns");
    assert_eq!(body["provided"], serde_json::json!(["missing"]));
    assert_eq!(body["available"], serde_json::json!(["id", "name", "score"]));
    Ok(())
}

#[test]
fn out_of_range_limit_is_a_client_error() -> TestResult {
    let tmp = fixture()?;
    pqquery(&tmp)
        .args(["rows", "--limit", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("out_of_range_parameter"));

    pqquery(&tmp)
        .args(["rows", "--offset", "-1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("\"invalid_field\": \"offset\""));
    Ok(())
}

#[test]
fn missing_file_exits_with_server_status() -> TestResult {
    let tmp = fixture()?;
    pqquery(&tmp)
        .args(["stats", "--file", "absent.parquet"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("storage_unavailable"));
    Ok(())
}

#[test]
fn stats_prints_numeric_summary() -> TestResult {
    let tmp = fixture()?;
    let output = pqquery(&tmp).arg("stats").output()?;
    assert!(output.status.success());

    let json = stdout_json(&output)?;
    assert_eq!(json["total_rows"], 3);
    assert_eq!(json["total_columns"], 3);
    assert_eq!(json["numeric_columns"]["score"]["mean"], 20.0);
    assert!(json["numeric_columns"].get("name").is_none());
    Ok(())
}

#[test]
fn health_reports_the_store() -> TestResult {
    let tmp = TempDir::new()?;
    let output = pqquery(&tmp).arg("health").output()?;
    assert!(output.status.success());

    let json = stdout_json(&output)?;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["store"], tmp.path().display().to_string());
    Ok(())
}

#[test]
fn unsupported_store_scheme_is_rejected() -> TestResult {
    let mut cmd = Command::new(cli_bin());
    cmd.env_remove("PQ_STORE")
        .env_remove("GCS_BUCKET_NAME")
        .args(["--store", "s3://bucket", "health"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid_store"));
    Ok(())
}
