use anyhow::Result;
use log::LevelFilter;
use std::path::Path;

use heartpredict::descriptive::Relation;

/// Map a `--log-level` value onto a log filter. `WARNING` and `CRITICAL`
/// are accepted as aliases of `warn` and `error`.
pub fn parse_log_level(level: &str) -> Result<LevelFilter> {
    match level.to_uppercase().as_str() {
        "DEBUG" => Ok(LevelFilter::Debug),
        "INFO" => Ok(LevelFilter::Info),
        "WARN" | "WARNING" => Ok(LevelFilter::Warn),
        "ERROR" | "CRITICAL" => Ok(LevelFilter::Error),
        "OFF" => Ok(LevelFilter::Off),
        _ => anyhow::bail!("Unknown log level: {}", level),
    }
}

pub fn validate_csv_file(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    if ext.as_deref() != Some("csv") {
        anyhow::bail!("File must have a .csv extension: {}", path.display());
    }
    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    Ok(())
}

/// Parse the three values of `--where COL REL VALUE`.
pub fn parse_where(values: &[String]) -> Result<(String, Relation, f64)> {
    match values {
        [column, relation, threshold] => {
            let relation: Relation = relation.parse()?;
            let threshold: f64 = threshold
                .parse()
                .map_err(|_| anyhow::anyhow!("Threshold must be numeric, got '{}'", threshold))?;
            Ok((column.clone(), relation, threshold))
        }
        _ => anyhow::bail!("--where expects COLUMN RELATION VALUE"),
    }
}

pub fn death_event_label(prediction: f64) -> &'static str {
    if prediction >= 0.5 {
        "Death event"
    } else {
        "No death event"
    }
}
