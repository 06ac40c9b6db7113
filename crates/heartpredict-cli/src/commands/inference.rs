use anyhow::{Context, Result};
use std::path::Path;

use heartpredict::model_selection::predict_death_event;
use heartpredict::preprocessing::Scaler;
use heartpredict::{Model, Table};

use crate::util::validate_csv_file;

/// Predict the death event for every row of `input` with a stored model and
/// the scaler fitted at training time.
pub fn run_inference(input: &Path, model_path: &Path, scaler_path: &Path) -> Result<Vec<f64>> {
    validate_csv_file(input)?;
    let table = Table::from_csv(input).with_context(|| format!("Failed to read {:?}", input))?;
    let model = Model::load(model_path)?;
    let scaler = Scaler::load(scaler_path)?;
    log::info!(
        "Predicting {} rows with {} from {}",
        table.nrows(),
        model.kind(),
        model_path.display()
    );
    let predictions = predict_death_event(&table, &model, &scaler)?;
    Ok(predictions.to_vec())
}
