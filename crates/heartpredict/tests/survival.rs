mod common;

use heartpredict::config::{ModelKind, TrainConfig};
use heartpredict::data_handling::MlData;
use heartpredict::model_selection::{train_family, CandidateSpec};
use heartpredict::report::plots::{plot_kaplan_meier, save_plot};
use heartpredict::survival::{Stratification, SurvivalBackend};

fn trained_setup(dir: &std::path::Path) -> (MlData, heartpredict::Model) {
    let config = TrainConfig::default().with_seed(9).with_output_dir(dir);
    let data = MlData::build(&common::synthetic_project(150), config.test_size, config.seed).unwrap();
    let artifact = train_family(&CandidateSpec::fixed(ModelKind::LogisticRegression), &data, &config).unwrap();
    (data, artifact.model)
}

#[test]
fn median_risk_strata_cover_validation_rows() {
    let dir = tempfile::tempdir().unwrap();
    let (data, model) = trained_setup(dir.path());
    let backend = SurvivalBackend::from_split(&data.valid).unwrap();
    let strata = backend.strata(&model, &Stratification::MedianRisk).unwrap();

    let total: usize = strata.iter().map(|s| s.rows.len()).sum();
    assert_eq!(total, data.valid.table.nrows());
    assert_eq!(strata[0].label, "High risk");

    let risk = backend.predicted_risk(&model).unwrap();
    let lowest_high = strata[0].rows.iter().map(|&i| risk[i]).fold(f64::INFINITY, f64::min);
    if let Some(low) = strata.iter().find(|s| s.label == "Low risk") {
        assert!(low.rows.iter().all(|&i| risk[i] < lowest_high));
    }

    for stratum in &strata {
        let probs = &stratum.curve.survival_prob;
        assert!(probs.windows(2).all(|w| w[1] <= w[0]));
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(stratum.curve.n_observations, stratum.rows.len());
    }
}

#[test]
fn covariate_strata_use_readable_labels() {
    let dir = tempfile::tempdir().unwrap();
    let (data, model) = trained_setup(dir.path());
    let backend = SurvivalBackend::from_split(&data.valid).unwrap();
    let strata = backend
        .strata(&model, &Stratification::Covariate("smoking".to_string()))
        .unwrap();
    let labels: Vec<&str> = strata.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Not smoking", "Is smoking"]);

    let path = dir.path().join("plots").join("kaplan_meier_9.html");
    save_plot(&plot_kaplan_meier(&strata, "Kaplan-Meier by smoking"), &path).unwrap();
    assert!(path.exists());
}
