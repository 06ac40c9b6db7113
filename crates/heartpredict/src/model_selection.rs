//! Model selection: per-family hyperparameter sweep with k-fold
//! cross-validation on the training split, final fit, validation scoring,
//! persistence, and selection of the best family.
use std::collections::BTreeMap;
use std::path::PathBuf;

use ndarray::{Array1, Array2, Axis};

use crate::config::{Hyperparameter, Metric, ModelKind, Task, TrainConfig};
use crate::data_handling::{FeatureData, MlData, ProjectData, Table};
use crate::error::{HeartPredictError, Result};
use crate::models::estimator::Estimator;
use crate::models::factory::build_model;
use crate::models::Model;
use crate::preprocessing::Scaler;
use crate::stats::{accuracy, rmse};

/// Name and candidate values of the swept hyperparameter.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperparameterSweep {
    pub param: Hyperparameter,
    pub values: Vec<f64>,
}

/// A model family and its optional sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSpec {
    pub kind: ModelKind,
    pub sweep: Option<HyperparameterSweep>,
}

impl CandidateSpec {
    pub fn fixed(kind: ModelKind) -> Self {
        Self { kind, sweep: None }
    }

    pub fn swept(kind: ModelKind, param: Hyperparameter, values: Vec<f64>) -> Self {
        Self {
            kind,
            sweep: Some(HyperparameterSweep { param, values }),
        }
    }
}

/// Result of training one family.
#[derive(Debug)]
pub struct TrainedArtifact {
    pub model: Model,
    pub kind: ModelKind,
    pub hyperparameter: Option<Hyperparameter>,
    pub value: Option<f64>,
    pub score: f64,
    pub metric: Metric,
    pub path: PathBuf,
}

impl TrainedArtifact {
    /// `name = value` of the selected hyperparameter, if any.
    pub fn hyperparameter_label(&self) -> Option<String> {
        match (self.hyperparameter, self.value) {
            (Some(param), Some(value)) => Some(format!("{} = {}", param, param.format_value(value))),
            _ => None,
        }
    }
}

/// Every trained family of one task, in training order, plus the winner.
#[derive(Debug)]
pub struct TrainingSummary {
    pub task: Task,
    pub artifacts: Vec<TrainedArtifact>,
    best: usize,
}

impl TrainingSummary {
    pub fn best(&self) -> &TrainedArtifact {
        &self.artifacts[self.best]
    }

    pub fn into_best(mut self) -> TrainedArtifact {
        self.artifacts.swap_remove(self.best)
    }
}

/// Largest decision-tree depth tried: `floor(log2(n_features)) + 1`.
pub fn max_tree_depth(n_features: usize) -> usize {
    if n_features == 0 {
        return 0;
    }
    (usize::BITS - 1 - n_features.leading_zeros()) as usize + 1
}

/// Smallest neighbour count tried: `max(1, floor(sqrt(n_train)))`.
pub fn k_min(n_train: usize) -> usize {
    ((n_train as f64).sqrt().floor() as usize).max(1)
}

/// Ten log-spaced regularisation strengths in `[1e-4, 1e4]`.
pub fn alpha_grid() -> Vec<f64> {
    (0..10).map(|i| 10f64.powf(-4.0 + 8.0 * i as f64 / 9.0)).collect()
}

pub fn classification_candidates(n_train: usize, n_features: usize) -> Vec<CandidateSpec> {
    let depths: Vec<f64> = (1..=max_tree_depth(n_features)).map(|d| d as f64).collect();
    let k = k_min(n_train);
    let neighbours: Vec<f64> = (k..k + 10).map(|k| k as f64).collect();
    vec![
        CandidateSpec::swept(ModelKind::DecisionTree, Hyperparameter::MaxDepth, depths.clone()),
        CandidateSpec::swept(ModelKind::RandomForest, Hyperparameter::MaxDepth, depths),
        CandidateSpec::swept(ModelKind::KNearestNeighbors, Hyperparameter::NNeighbors, neighbours),
        CandidateSpec::fixed(ModelKind::LinearDiscriminantAnalysis),
        CandidateSpec::fixed(ModelKind::QuadraticDiscriminantAnalysis),
    ]
}

pub fn regression_candidates() -> Vec<CandidateSpec> {
    vec![
        CandidateSpec::fixed(ModelKind::LogisticRegression),
        CandidateSpec::swept(ModelKind::LogisticRegressionCV, Hyperparameter::Alpha, alpha_grid()),
        CandidateSpec::fixed(ModelKind::LinearRegression),
    ]
}

pub fn score(metric: Metric, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (t, p) = (y_true.to_vec(), y_pred.to_vec());
    match metric {
        Metric::Accuracy => accuracy(&t, &p),
        Metric::Rmse => rmse(&t, &p),
    }
}

/// Deterministic stratified k-fold partition of the sample indices.
///
/// Samples are grouped by target value and dealt round-robin to the folds,
/// group after group, so every fold holds a near-equal share of each class.
pub fn kfold_indices(y: &Array1<f64>, n_folds: usize) -> Result<Vec<Vec<usize>>> {
    if n_folds < 2 || n_folds > y.len() {
        return Err(HeartPredictError::InvalidInput(format!(
            "cannot split {} samples into {} folds",
            y.len(),
            n_folds
        )));
    }
    let mut groups: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (i, &v) in y.iter().enumerate() {
        groups.entry(v.to_bits()).or_default().push(i);
    }
    let mut folds = vec![Vec::new(); n_folds];
    for (slot, idx) in groups.into_values().flatten().enumerate() {
        folds[slot % n_folds].push(idx);
    }
    for fold in folds.iter_mut() {
        fold.sort_unstable();
    }
    Ok(folds)
}

/// Mean validation score over the folds. `make_model` builds a fresh,
/// unfitted model for every fold.
pub fn cross_validate<F>(
    make_model: F,
    x: &Array2<f64>,
    y: &Array1<f64>,
    n_folds: usize,
    metric: Metric,
) -> Result<f64>
where
    F: Fn() -> Result<Model>,
{
    let folds = kfold_indices(y, n_folds)?;
    let mut total = 0.0;
    for (k, held_out) in folds.iter().enumerate() {
        let train_rows: Vec<usize> = folds
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != k)
            .flat_map(|(_, fold)| fold.iter().copied())
            .collect();
        let mut model = make_model()?;
        model.fit(&x.select(Axis(0), &train_rows), &y.select(Axis(0), &train_rows))?;
        let predicted = model.predict(&x.select(Axis(0), held_out))?;
        total += score(metric, &y.select(Axis(0), held_out), &predicted);
    }
    Ok(total / folds.len() as f64)
}

/// Cross-validated score of every candidate value, in declared order.
pub fn sweep(
    kind: ModelKind,
    sweep: &HyperparameterSweep,
    config: &TrainConfig,
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<Vec<(f64, f64)>> {
    let metric = kind.task().metric();
    sweep
        .values
        .iter()
        .map(|&value| {
            let cv = cross_validate(
                || {
                    let mut model = build_model(kind, config);
                    model.set_hyperparameter(sweep.param, value)?;
                    Ok(model)
                },
                x,
                y,
                config.n_folds,
                metric,
            )?;
            log::debug!(
                "{} {} = {}: mean cv {} {:.4}",
                kind,
                sweep.param,
                sweep.param.format_value(value),
                metric.name(),
                cv
            );
            Ok((value, cv))
        })
        .collect()
}

/// First `(value, score)` pair with the best score. Later equal scores never
/// replace an earlier one.
pub fn select_best(scores: &[(f64, f64)], metric: Metric) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64)> = None;
    for &(value, s) in scores {
        match best {
            Some((_, incumbent)) if !metric.is_better(s, incumbent) => {}
            _ => best = Some((value, s)),
        }
    }
    best
}

/// Sweep, final fit, validation scoring and persistence of one family.
pub fn train_family(spec: &CandidateSpec, data: &MlData, config: &TrainConfig) -> Result<TrainedArtifact> {
    let task = spec.kind.task();
    let metric = task.metric();
    let mut model = build_model(spec.kind, config);

    let mut chosen = None;
    if let Some(sweep_spec) = &spec.sweep {
        if sweep_spec.values.is_empty() {
            log::warn!(
                "{}: empty {} range, fitting with the default value",
                spec.kind,
                sweep_spec.param
            );
        } else {
            let scores = sweep(spec.kind, sweep_spec, config, &data.train.x, &data.train.y)?;
            if let Some((value, cv)) = select_best(&scores, metric) {
                log::debug!(
                    "{}: selected {} = {} (mean cv {} {:.4})",
                    spec.kind,
                    sweep_spec.param,
                    sweep_spec.param.format_value(value),
                    metric.name(),
                    cv
                );
                model.set_hyperparameter(sweep_spec.param, value)?;
                chosen = Some(value);
            }
        }
    }

    model.fit(&data.train.x, &data.train.y)?;
    let predicted = model.predict(&data.valid.x)?;
    let validation_score = score(metric, &data.valid.y, &predicted);

    let path = config
        .model_dir(task)
        .join(format!("{}_model_{}.json", spec.kind.name(), config.seed));
    model.save(&path)?;

    let artifact = TrainedArtifact {
        model,
        kind: spec.kind,
        hyperparameter: chosen.and(spec.sweep.as_ref().map(|s| s.param)),
        value: chosen,
        score: validation_score,
        metric,
        path,
    };
    match artifact.hyperparameter_label() {
        Some(label) => log::info!(
            "{} ({}): validation {} {:.4}",
            artifact.kind,
            label,
            metric.name(),
            artifact.score
        ),
        None => log::info!(
            "{}: validation {} {:.4}",
            artifact.kind,
            metric.name(),
            artifact.score
        ),
    }
    Ok(artifact)
}

/// Train every candidate in order and pick the best by validation score.
pub fn train_candidates(
    task: Task,
    candidates: &[CandidateSpec],
    data: &MlData,
    config: &TrainConfig,
) -> Result<TrainingSummary> {
    if candidates.is_empty() {
        return Err(HeartPredictError::InvalidInput("no model families to train".to_string()));
    }
    let metric = task.metric();
    let mut artifacts: Vec<TrainedArtifact> = Vec::with_capacity(candidates.len());
    let mut best = 0;
    for spec in candidates {
        let artifact = train_family(spec, data, config)?;
        if !artifacts.is_empty() && metric.is_better(artifact.score, artifacts[best].score) {
            best = artifacts.len();
        }
        artifacts.push(artifact);
    }
    Ok(TrainingSummary { task, artifacts, best })
}

/// Training entry point over the project dataset.
pub struct MlBackend {
    data: MlData,
    config: TrainConfig,
}

impl MlBackend {
    /// Split and scale the dataset with `config.seed` and persist the fitted
    /// scaler next to the models.
    pub fn new(project_data: &ProjectData, config: TrainConfig) -> Result<Self> {
        config.validate()?;
        let data = MlData::build(project_data, config.test_size, config.seed)?;
        data.scaler.save(config.scaler_path())?;
        log::debug!("Saved scaler to {}", config.scaler_path().display());
        Ok(Self { data, config })
    }

    pub fn data(&self) -> &MlData {
        &self.data
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn classification_for_different_classifiers(&self) -> Result<TrainingSummary> {
        let candidates = classification_candidates(self.data.train.x.nrows(), self.data.n_features());
        train_candidates(Task::Classification, &candidates, &self.data, &self.config)
    }

    pub fn regression_for_different_regressors(&self) -> Result<TrainingSummary> {
        train_candidates(Task::Regression, &regression_candidates(), &self.data, &self.config)
    }
}

/// Predict the death event for every row of a label-free table.
pub fn predict_death_event(table: &Table, model: &Model, scaler: &Scaler) -> Result<Array1<f64>> {
    let features = FeatureData::build(table, scaler)?;
    model.predict(&features.feature_matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ranges() {
        assert_eq!(max_tree_depth(12), 4);
        assert_eq!(max_tree_depth(1), 1);
        assert_eq!(max_tree_depth(8), 4);
        assert_eq!(k_min(240), 15);
        assert_eq!(k_min(0), 1);

        let alphas = alpha_grid();
        assert_eq!(alphas.len(), 10);
        assert!((alphas[0] - 1e-4).abs() < 1e-16);
        assert!((alphas[9] - 1e4).abs() < 1e-8);
        assert!(alphas.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn classification_ranges_follow_data_shape() {
        let candidates = classification_candidates(100, 12);
        assert_eq!(candidates.len(), 5);
        let depths = candidates[0].sweep.as_ref().unwrap();
        assert_eq!(depths.values, vec![1.0, 2.0, 3.0, 4.0]);
        let knn = candidates[2].sweep.as_ref().unwrap();
        assert_eq!(knn.values.first(), Some(&10.0));
        assert_eq!(knn.values.len(), 10);
        assert!(candidates[3].sweep.is_none());
    }

    #[test]
    fn folds_are_stratified_and_cover_all_rows() {
        let y = Array1::from(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        let folds = kfold_indices(&y, 2).unwrap();
        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        for fold in &folds {
            let positives = fold.iter().filter(|&&i| y[i] == 1.0).count();
            assert_eq!(positives, 2);
        }
        assert!(kfold_indices(&y, 11).is_err());
    }

    #[test]
    fn ties_keep_first_candidate() {
        let scores = [(1.0, 0.7), (2.0, 0.9), (3.0, 0.9), (4.0, 0.2)];
        assert_eq!(select_best(&scores, Metric::Accuracy), Some((2.0, 0.9)));
        let errors = [(1.0, 0.5), (2.0, 0.3), (3.0, 0.3)];
        assert_eq!(select_best(&errors, Metric::Rmse), Some((2.0, 0.3)));
        assert_eq!(select_best(&[], Metric::Rmse), None);
    }
}
