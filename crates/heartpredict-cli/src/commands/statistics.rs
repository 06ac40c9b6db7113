use anyhow::{Context, Result};
use std::path::Path;

use heartpredict::correlation::{CorrelationCache, CorrelationMatrix};
use heartpredict::descriptive::{
    filter_table, BooleanStatistics, DescriptiveBackend, DiscreteStatistics, Relation, ValueDistribution,
};
use heartpredict::report::plots::{plot_value_distribution, save_plot};
use heartpredict::{CorrelationMethod, ProjectData, Table};

fn load(csv: &Path) -> Result<Table> {
    let project = ProjectData::build(csv).with_context(|| format!("Failed to load dataset {:?}", csv))?;
    Ok(project.table)
}

pub fn correlation_to_label(csv: &Path, column: &str, method: CorrelationMethod) -> Result<f64> {
    let table = load(csv)?;
    let backend = CorrelationCache::new().build(&table);
    Ok(backend.correlation_to_label(column, method)?)
}

pub fn correlation_matrix(csv: &Path, method: CorrelationMethod) -> Result<CorrelationMatrix> {
    let table = load(csv)?;
    let backend = CorrelationCache::new().build(&table);
    Ok(backend.correlation_matrix(method).clone())
}

pub fn boolean_statistics(csv: &Path, column: &str) -> Result<BooleanStatistics> {
    Ok(DescriptiveBackend::new(load(csv)?).boolean_statistics(column)?)
}

pub fn discrete_statistics(csv: &Path, column: &str) -> Result<DiscreteStatistics> {
    Ok(DescriptiveBackend::new(load(csv)?).discrete_statistics(column)?)
}

/// Value counts of `column`, optionally restricted to the rows matching a
/// filter and rendered as a bar plot.
pub fn distribution(
    csv: &Path,
    column: &str,
    filter: Option<(String, Relation, f64)>,
    plot: Option<&Path>,
) -> Result<ValueDistribution> {
    let mut table = load(csv)?;
    if let Some((filter_column, relation, threshold)) = filter {
        table = filter_table(&table, &filter_column, threshold, relation)?;
    }
    let distribution = DescriptiveBackend::new(table).value_distribution(column)?;
    if let Some(path) = plot {
        save_plot(&plot_value_distribution(&distribution), path)?;
        log::info!("Saved distribution plot to {}", path.display());
    }
    Ok(distribution)
}
