//! Configuration loading and helper functions of the CLI crate.

use std::path::PathBuf;

use clap::{Arg, Command};
use heartpredict::descriptive::Relation;
use heartpredict_cli::config::RunConfig;
use heartpredict_cli::util::{death_event_label, parse_log_level, parse_where, validate_csv_file};
use log::LevelFilter;

fn command() -> Command {
    Command::new("test")
        .arg(Arg::new("csv").long("csv").value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("config").long("config").value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("output_dir").long("output-dir").value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("seed").long("seed").value_parser(clap::value_parser!(u64)))
}

#[test]
fn flags_override_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"seed": 1, "n_folds": 3, "output_dir": "from_file"}"#).unwrap();

    let matches = command().get_matches_from([
        "test",
        "--config",
        config.to_str().unwrap(),
        "--seed",
        "99",
    ]);
    let run = RunConfig::from_arguments(&matches).unwrap();
    assert_eq!(run.train.seed, 99);
    assert_eq!(run.train.n_folds, 3);
    assert_eq!(run.train.output_dir, PathBuf::from("from_file"));
    assert_eq!(run.csv, PathBuf::from("data/heart_failure_clinical_records.csv"));

    let matches = command().get_matches_from([
        "test",
        "--config",
        config.to_str().unwrap(),
        "--output-dir",
        "elsewhere",
    ]);
    let run = RunConfig::from_arguments(&matches).unwrap();
    assert_eq!(run.train.seed, 1);
    assert_eq!(run.train.output_dir, PathBuf::from("elsewhere"));
}

#[test]
fn missing_config_file_errors() {
    let matches = command().get_matches_from(["test", "--config", "/nonexistent/config.json"]);
    assert!(RunConfig::from_arguments(&matches).is_err());
}

#[test]
fn invalid_config_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"test_size": 0.0}"#).unwrap();
    let matches = command().get_matches_from(["test", "--config", config.to_str().unwrap()]);
    assert!(RunConfig::from_arguments(&matches).is_err());
}

#[test]
fn log_levels() {
    assert_eq!(parse_log_level("DEBUG").unwrap(), LevelFilter::Debug);
    assert_eq!(parse_log_level("warning").unwrap(), LevelFilter::Warn);
    assert_eq!(parse_log_level("CRITICAL").unwrap(), LevelFilter::Error);
    assert!(parse_log_level("verbose").is_err());
}

#[test]
fn where_clause_parsing() {
    let values = vec!["age".to_string(), "<=".to_string(), "60".to_string()];
    let (column, relation, threshold) = parse_where(&values).unwrap();
    assert_eq!(column, "age");
    assert_eq!(relation, Relation::LessEqual);
    assert_eq!(threshold, 60.0);

    let bad = vec!["age".to_string(), "<=".to_string(), "sixty".to_string()];
    assert!(parse_where(&bad).is_err());
}

#[test]
fn csv_validation() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("data.csv");
    std::fs::File::create(&csv).unwrap();
    assert!(validate_csv_file(&csv).is_ok());

    let txt = dir.path().join("data.txt");
    std::fs::File::create(&txt).unwrap();
    assert!(validate_csv_file(&txt).is_err());
    assert!(validate_csv_file(&dir.path().join("missing.csv")).is_err());
}

#[test]
fn prediction_labels() {
    assert_eq!(death_event_label(1.0), "Death event");
    assert_eq!(death_event_label(0.0), "No death event");
}
