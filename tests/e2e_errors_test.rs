//! E2E tests for costcalc error reporting and exit codes.

use predicates::prelude::*;
use serde_json::Value;

mod common;

use common::logger::TestLogger;
use common::sandbox::Sandbox;

/// The structured error object printed on stderr in JSON mode.
fn error_json(stderr: &[u8]) -> Value {
    let text = String::from_utf8_lossy(stderr);
    let start = text.find("{\"success\"").expect("error object on stderr");
    let end = text[start..].find('\n').map_or(text.len(), |i| start + i);
    serde_json::from_str(&text[start..end]).expect("valid error JSON")
}

#[test]
fn forecast_horizon_out_of_range_is_invalid_input() {
    let log = TestLogger::new("forecast_horizon_out_of_range_is_invalid_input");
    let sandbox = Sandbox::new();

    for months in ["0", "25", "-3"] {
        log.info(&format!("months = {months}"));
        let output = sandbox
            .cmd()
            .args(["forecast", "--months", months, "--json"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(2));
        let error = error_json(&output.stderr);
        assert_eq!(error["success"], false);
        assert_eq!(error["error_code"], "COST-V001");
        assert!(error["message"].as_str().unwrap().contains("months"));
    }

    log.finish_ok();
}

#[test]
fn unknown_product_is_not_found() {
    let sandbox = Sandbox::new();

    let output = sandbox
        .cmd()
        .args(["calculate", "999", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let error = error_json(&output.stderr);
    assert_eq!(error["error_code"], "COST-D002");
    assert_eq!(error["category"], "Data error");
    assert!(error["hint"].as_str().unwrap().contains("costcalc product list"));
}

#[test]
fn non_positive_user_count_is_rejected() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["calculate", "1", "--user-count", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("user_count"));
}

#[test]
fn unknown_period_is_rejected() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["item", "add", "Thing", "--price", "5", "--period", "weekly"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("weekly"));
}

#[test]
fn empty_update_is_rejected() {
    let sandbox = Sandbox::new();
    let item = sandbox.add_item("Thing", "5", &[]).to_string();

    sandbox
        .cmd()
        .args(["item", "update", &item])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error [COST-V001]"));
}

#[test]
fn allocation_to_missing_item_is_not_found() {
    let sandbox = Sandbox::new();
    let product = sandbox.add_product("Api", "per_user").to_string();

    sandbox
        .cmd()
        .args([
            "allocation", "add", "--product", &product, "--item", "77", "--type", "fixed",
            "--value", "1",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("cost item 77 not found"));
}

#[test]
fn corrupt_config_is_a_config_error() {
    let log = TestLogger::new("corrupt_config_is_a_config_error");
    let sandbox = Sandbox::new();
    sandbox.write_config("[forecast\ndefault_months = ");

    log.phase("execute");
    let output = sandbox.cmd().args(["summary", "--json"]).output().unwrap();

    log.phase("verify");
    assert_eq!(output.status.code(), Some(4));
    let error = error_json(&output.stderr);
    assert_eq!(error["error_code"], "COST-C002");

    log.finish_ok();
}

#[test]
fn out_of_range_config_value_is_a_config_error() {
    let sandbox = Sandbox::new();
    sandbox.write_config("[forecast]\ndefault_months = 48\n");

    sandbox
        .cmd()
        .arg("summary")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("default_months"));
}

#[test]
fn invalid_command_is_rejected() {
    Sandbox::new()
        .cmd()
        .arg("notacommand")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized").or(predicate::str::contains("error")));
}
