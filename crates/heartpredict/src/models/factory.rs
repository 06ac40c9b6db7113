use crate::config::{ModelKind, TrainConfig};
use crate::models::discriminant::{LdaModel, QdaModel};
use crate::models::knn::KnnModel;
use crate::models::linear::{LinearModel, LogisticModel, DEFAULT_ALPHA};
use crate::models::tree::{DecisionTreeModel, RandomForestModel};
use crate::models::Model;

/// Build an unfitted model of the given family with its default
/// hyperparameters. Randomised families take their seed from `config`.
pub fn build_model(kind: ModelKind, config: &TrainConfig) -> Model {
    match kind {
        ModelKind::DecisionTree => Model::DecisionTree(DecisionTreeModel::new(None)),
        ModelKind::RandomForest => {
            Model::RandomForest(RandomForestModel::new(config.n_estimators, None, config.seed))
        }
        ModelKind::KNearestNeighbors => Model::KNearestNeighbors(KnnModel::new(5)),
        ModelKind::LinearDiscriminantAnalysis => Model::LinearDiscriminant(LdaModel::new()),
        ModelKind::QuadraticDiscriminantAnalysis => Model::QuadraticDiscriminant(QdaModel::new()),
        ModelKind::LogisticRegression => Model::LogisticRegression(LogisticModel::new(DEFAULT_ALPHA)),
        ModelKind::LogisticRegressionCV => Model::LogisticRegressionCV(LogisticModel::cross_validated()),
        ModelKind::LinearRegression => Model::LinearRegression(LinearModel::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_builds_requested_family() {
        let config = TrainConfig::default();
        for kind in [
            ModelKind::DecisionTree,
            ModelKind::RandomForest,
            ModelKind::KNearestNeighbors,
            ModelKind::LinearDiscriminantAnalysis,
            ModelKind::QuadraticDiscriminantAnalysis,
            ModelKind::LogisticRegression,
            ModelKind::LogisticRegressionCV,
            ModelKind::LinearRegression,
        ] {
            let model = build_model(kind, &config);
            assert_eq!(model.kind(), kind);
        }
    }
}
