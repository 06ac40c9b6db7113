use anyhow::{Context, Result};

use heartpredict::model_selection::{MlBackend, TrainingSummary};
use heartpredict::{ProjectData, Task};

use crate::config::RunConfig;

pub fn run_training(config: &RunConfig, task: Task) -> Result<TrainingSummary> {
    let project = ProjectData::build(&config.csv)
        .with_context(|| format!("Failed to load dataset {:?}", config.csv))?;
    let backend = MlBackend::new(&project, config.train.clone())?;
    let summary = match task {
        Task::Classification => backend.classification_for_different_classifiers()?,
        Task::Regression => backend.regression_for_different_regressors()?,
    };
    Ok(summary)
}

/// One line per family followed by the winner.
pub fn format_summary(summary: &TrainingSummary) -> String {
    let mut lines = Vec::with_capacity(summary.artifacts.len() + 1);
    for artifact in &summary.artifacts {
        let param = artifact
            .hyperparameter_label()
            .map(|label| format!(" ({})", label))
            .unwrap_or_default();
        lines.push(format!(
            "{}{}: {} = {:.4}",
            artifact.kind,
            param,
            artifact.metric.name(),
            artifact.score
        ));
    }
    let best = summary.best();
    let role = match summary.task {
        Task::Classification => "classifier",
        Task::Regression => "regressor",
    };
    lines.push(format!(
        "Best {}: {} with {} {:.4}, saved to {}",
        role,
        best.kind,
        best.metric.name(),
        best.score,
        best.path.display()
    ));
    lines.join("\n")
}
