mod common;

use heartpredict::config::{Hyperparameter, Metric, ModelKind, Task, TrainConfig};
use heartpredict::data_handling::{MlData, Table, LABEL_COLUMN};
use heartpredict::model_selection::{train_family, CandidateSpec, MlBackend};
use heartpredict::models::estimator::Estimator;
use heartpredict::models::Model;
use heartpredict::preprocessing::Scaler;

fn config_in(dir: &std::path::Path, seed: u64) -> TrainConfig {
    TrainConfig {
        n_estimators: 15,
        ..TrainConfig::default()
    }
    .with_seed(seed)
    .with_output_dir(dir)
}

#[test]
fn classification_trains_every_family_and_persists_models() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 7);
    let backend = MlBackend::new(&common::synthetic_project(150), config.clone()).unwrap();
    let summary = backend.classification_for_different_classifiers().unwrap();

    let kinds: Vec<ModelKind> = summary.artifacts.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ModelKind::DecisionTree,
            ModelKind::RandomForest,
            ModelKind::KNearestNeighbors,
            ModelKind::LinearDiscriminantAnalysis,
            ModelKind::QuadraticDiscriminantAnalysis,
        ]
    );
    for artifact in &summary.artifacts {
        assert_eq!(artifact.metric, Metric::Accuracy);
        assert!((0.0..=1.0).contains(&artifact.score));
        assert!(artifact.path.exists());
        assert_eq!(
            artifact.path,
            dir.path()
                .join("trained_models")
                .join("classifier")
                .join(format!("{}_model_7.json", artifact.kind.name()))
        );
    }
    let best = summary.best();
    assert!(summary.artifacts.iter().all(|a| a.score <= best.score));
    assert!(config.scaler_path().exists());
}

#[test]
fn regression_picks_lowest_error() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MlBackend::new(&common::synthetic_project(150), config_in(dir.path(), 3)).unwrap();
    let summary = backend.regression_for_different_regressors().unwrap();

    assert_eq!(summary.task, Task::Regression);
    assert_eq!(summary.artifacts.len(), 3);
    let best = summary.best();
    assert!(summary.artifacts.iter().all(|a| a.score >= best.score));
    let cv = &summary.artifacts[1];
    assert_eq!(cv.kind, ModelKind::LogisticRegressionCV);
    assert_eq!(cv.hyperparameter, Some(Hyperparameter::Alpha));
    assert!(summary.artifacts[0].value.is_none());
}

#[test]
fn persisted_models_reproduce_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MlBackend::new(&common::synthetic_project(150), config_in(dir.path(), 11)).unwrap();
    let summary = backend.classification_for_different_classifiers().unwrap();
    let x = &backend.data().valid.x;

    for artifact in &summary.artifacts {
        let restored = Model::load(&artifact.path).unwrap();
        assert_eq!(restored.kind(), artifact.kind);
        assert_eq!(restored.predict(x).unwrap(), artifact.model.predict(x).unwrap());
        assert_eq!(restored.predict_risk(x).unwrap(), artifact.model.predict_risk(x).unwrap());
    }

    let scaler = Scaler::load(backend.config().scaler_path()).unwrap();
    assert_eq!(&scaler, &backend.data().scaler);
}

#[test]
fn validation_split_does_not_influence_the_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 5);
    let data = MlData::build(&common::synthetic_project(150), config.test_size, config.seed).unwrap();

    let mut tampered = data.clone();
    tampered.valid.x.mapv_inplace(|v| -3.0 * v + 1.0);
    tampered.valid.y.mapv_inplace(|v| 1.0 - v);

    for spec in [
        CandidateSpec::swept(ModelKind::DecisionTree, Hyperparameter::MaxDepth, vec![1.0, 2.0, 3.0, 4.0]),
        CandidateSpec::swept(ModelKind::KNearestNeighbors, Hyperparameter::NNeighbors, vec![3.0, 5.0, 7.0, 9.0]),
    ] {
        let original = train_family(&spec, &data, &config).unwrap();
        let changed = train_family(&spec, &tampered, &config).unwrap();
        assert_eq!(original.value, changed.value, "{}", spec.kind);
    }
}

#[test]
fn equal_cross_validation_scores_keep_the_first_value() {
    let n = 40;
    let feature: Vec<f64> = (0..n).map(|i| if i < n / 2 { i as f64 } else { i as f64 + 100.0 }).collect();
    let noise: Vec<f64> = (0..n).map(|i| (i * 7 % 5) as f64).collect();
    let label: Vec<f64> = (0..n).map(|i| if i < n / 2 { 0.0 } else { 1.0 }).collect();
    let table = Table::from_columns(vec![("x", feature), ("z", noise), (LABEL_COLUMN, label)]).unwrap();
    let data = MlData::from_table(&table, LABEL_COLUMN, 0.25, 1).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 1);
    // every depth separates the classes perfectly
    let spec = CandidateSpec::swept(ModelKind::DecisionTree, Hyperparameter::MaxDepth, vec![3.0, 1.0, 2.0]);
    let artifact = train_family(&spec, &data, &config).unwrap();
    assert_eq!(artifact.value, Some(3.0));
    assert_eq!(artifact.score, 1.0);
}

#[test]
fn empty_range_falls_back_to_a_single_fit() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 2);
    let data = MlData::build(&common::synthetic_project(80), config.test_size, config.seed).unwrap();
    let spec = CandidateSpec::swept(ModelKind::DecisionTree, Hyperparameter::MaxDepth, vec![]);
    let artifact = train_family(&spec, &data, &config).unwrap();
    assert_eq!(artifact.value, None);
    assert!(artifact.path.exists());
}

#[test]
fn singleton_range_is_a_one_candidate_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 5);
    let data = MlData::build(&common::synthetic_project(80), config.test_size, config.seed).unwrap();
    let spec = CandidateSpec::swept(ModelKind::KNearestNeighbors, Hyperparameter::NNeighbors, vec![4.0]);
    let artifact = train_family(&spec, &data, &config).unwrap();
    assert_eq!(artifact.hyperparameter, Some(Hyperparameter::NNeighbors));
    assert_eq!(artifact.value, Some(4.0));
}

#[test]
fn retraining_overwrites_existing_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 9);
    let data = MlData::build(&common::synthetic_project(80), config.test_size, config.seed).unwrap();
    let spec = CandidateSpec::fixed(ModelKind::LinearDiscriminantAnalysis);

    let first = train_family(&spec, &data, &config).unwrap();
    std::fs::write(&first.path, "garbage").unwrap();
    assert!(Model::load(&first.path).is_err());

    let second = train_family(&spec, &data, &config).unwrap();
    assert_eq!(second.path, first.path);
    let restored = Model::load(&second.path).unwrap();
    assert_eq!(restored.kind(), ModelKind::LinearDiscriminantAnalysis);
}

#[test]
fn missing_model_path_is_reported() {
    let err = Model::load("no/such/dir/DecisionTreeClassifier_model_42.json")
        .err()
        .unwrap();
    assert!(err.is_not_found());
    assert!(err
        .to_string()
        .contains("no/such/dir/DecisionTreeClassifier_model_42.json"));
}
