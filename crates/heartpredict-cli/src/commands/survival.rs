use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use heartpredict::model_selection::MlBackend;
use heartpredict::report::plots::{plot_kaplan_meier, save_plot};
use heartpredict::survival::{Stratification, Stratum, SurvivalBackend};
use heartpredict::{Model, ProjectData};

use crate::config::RunConfig;

/// Fit Kaplan-Meier curves on the validation split and write the plot.
///
/// Without `regressor` the regressor families are trained first and the best
/// one is used.
pub fn run_kmplot(
    config: &RunConfig,
    regressor: Option<&Path>,
    stratification: &Stratification,
) -> Result<(PathBuf, Vec<Stratum>)> {
    let project = ProjectData::build(&config.csv)
        .with_context(|| format!("Failed to load dataset {:?}", config.csv))?;
    let backend = MlBackend::new(&project, config.train.clone())?;

    let model = match regressor {
        Some(path) => Model::load(path)?,
        None => {
            log::info!("No regressor given, training regressor families");
            backend.regression_for_different_regressors()?.into_best().model
        }
    };

    let survival = SurvivalBackend::from_split(&backend.data().valid)?;
    let strata = survival.strata(&model, stratification)?;

    let path = config
        .train
        .plot_dir()
        .join(format!("kaplan_meier_{}.html", config.train.seed));
    let title = format!("Kaplan-Meier survival by {} ({})", stratification, model.kind());
    save_plot(&plot_kaplan_meier(&strata, &title), &path)?;
    Ok((path, strata))
}
