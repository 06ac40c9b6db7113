//! Smoke tests of the `heartpredict` binary.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("heartpredict").unwrap()
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("train-classification"))
        .stdout(predicate::str::contains("kmplot"));
}

#[test]
fn version_command() {
    cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[test]
fn missing_csv_reports_path() {
    cmd()
        .args(["bstat", "--bool-col", "smoking", "--csv", "/nonexistent/records.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("/nonexistent/records.csv"));
}

#[test]
fn bstat_prints_fractions() {
    let dir = tempfile::tempdir().unwrap();
    let csv = common::write_records(dir.path(), 30);
    cmd()
        .args(["bstat", "--bool-col", "smoking", "--csv"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("smoking"))
        .stdout(predicate::str::contains("0: 0.6667"))
        .stdout(predicate::str::contains("1: 0.3333"));
}

#[test]
fn bstat_rejects_unknown_column() {
    let dir = tempfile::tempdir().unwrap();
    let csv = common::write_records(dir.path(), 30);
    cmd()
        .args(["bstat", "--bool-col", "weight", "--csv"])
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("column not found"));
}

#[test]
fn cm_prints_unit_diagonal() {
    let dir = tempfile::tempdir().unwrap();
    let csv = common::write_records(dir.path(), 40);
    cmd()
        .args(["cm", "--method", "spearman", "--csv"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("DEATH_EVENT"))
        .stdout(predicate::str::contains("1.00"));
}

#[test]
fn dist_with_filter_and_plot() {
    let dir = tempfile::tempdir().unwrap();
    let csv = common::write_records(dir.path(), 30);
    let plot = dir.path().join("smoking.html");
    cmd()
        .args(["dist", "--column", "smoking", "--where", "age", ">=", "0", "--plot"])
        .arg(&plot)
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Not smoking: 20"))
        .stdout(predicate::str::contains("Is smoking: 10"));
    assert!(plot.exists());
}

#[test]
fn dist_rejects_unknown_relation() {
    let dir = tempfile::tempdir().unwrap();
    let csv = common::write_records(dir.path(), 30);
    cmd()
        .args(["dist", "--column", "smoking", "--where", "age", "!=", "60", "--csv"])
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported relation"));
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[test]
fn predict_with_missing_model_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let patients = common::write_patients(dir.path());
    cmd()
        .args(["predict-death-event", "--model", "/nonexistent/model.json", "--input"])
        .arg(&patients)
        .assert()
        .failure()
        .stderr(predicate::str::contains("/nonexistent/model.json"));
}

#[test]
fn train_then_predict() {
    let dir = tempfile::tempdir().unwrap();
    let csv = common::write_records(dir.path(), 120);
    let config = common::write_config(dir.path());
    let output = dir.path().join("results");

    cmd()
        .args(["train-classification", "--seed", "3", "--csv"])
        .arg(&csv)
        .arg("--config")
        .arg(&config)
        .arg("--output-dir")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("DecisionTreeClassifier (max_depth = "))
        .stdout(predicate::str::contains("Best classifier:"));

    let model = output
        .join("trained_models")
        .join("classifier")
        .join("LinearDiscriminantAnalysis_model_3.json");
    assert!(model.exists());

    let patients = common::write_patients(dir.path());
    cmd()
        .arg("predict-death-event")
        .arg("--input")
        .arg(&patients)
        .arg("--model")
        .arg(&model)
        .arg("--output-dir")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("0\t"))
        .stdout(predicate::str::contains("1\t"));

    // the training table still carries DEATH_EVENT
    cmd()
        .arg("predict-death-event")
        .arg("--input")
        .arg(&csv)
        .arg("--model")
        .arg(&model)
        .arg("--output-dir")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("label column"));
}

#[test]
fn kmplot_by_covariate_writes_plot() {
    let dir = tempfile::tempdir().unwrap();
    let csv = common::write_records(dir.path(), 120);
    let output = dir.path().join("results");
    cmd()
        .args(["kmplot", "--seed", "4", "--stratify", "sex", "--csv"])
        .arg(&csv)
        .arg("--output-dir")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Female"))
        .stdout(predicate::str::contains("Male"));
    assert!(output.join("plots").join("kaplan_meier_4.html").exists());
}
