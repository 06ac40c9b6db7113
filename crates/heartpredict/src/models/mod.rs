pub mod discriminant;
pub mod estimator;
pub mod factory;
pub mod knn;
pub mod linear;
pub mod tree;
pub mod utils;

use std::fmt;
use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::{Hyperparameter, ModelKind};
use crate::error::{HeartPredictError, Result};
use discriminant::{LdaModel, QdaModel};
use estimator::Estimator;
use knn::KnnModel;
use linear::{LinearModel, LogisticModel};
use tree::{DecisionTreeModel, RandomForestModel};

/// A model of any supported family. This is the unit that is persisted to and
/// restored from disk.
#[derive(Serialize, Deserialize)]
pub enum Model {
    DecisionTree(DecisionTreeModel),
    RandomForest(RandomForestModel),
    KNearestNeighbors(KnnModel),
    LinearDiscriminant(LdaModel),
    QuadraticDiscriminant(QdaModel),
    LogisticRegression(LogisticModel),
    LogisticRegressionCV(LogisticModel),
    LinearRegression(LinearModel),
}

macro_rules! delegate {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            Model::DecisionTree($inner) => $body,
            Model::RandomForest($inner) => $body,
            Model::KNearestNeighbors($inner) => $body,
            Model::LinearDiscriminant($inner) => $body,
            Model::QuadraticDiscriminant($inner) => $body,
            Model::LogisticRegression($inner) => $body,
            Model::LogisticRegressionCV($inner) => $body,
            Model::LinearRegression($inner) => $body,
        }
    };
}

impl Model {
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::DecisionTree(_) => ModelKind::DecisionTree,
            Model::RandomForest(_) => ModelKind::RandomForest,
            Model::KNearestNeighbors(_) => ModelKind::KNearestNeighbors,
            Model::LinearDiscriminant(_) => ModelKind::LinearDiscriminantAnalysis,
            Model::QuadraticDiscriminant(_) => ModelKind::QuadraticDiscriminantAnalysis,
            Model::LogisticRegression(_) => ModelKind::LogisticRegression,
            Model::LogisticRegressionCV(_) => ModelKind::LogisticRegressionCV,
            Model::LinearRegression(_) => ModelKind::LinearRegression,
        }
    }

    /// Serialize the model to `path` as JSON, creating parent directories and
    /// overwriting an existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)?;
        fs::write(path, json).map_err(|e| HeartPredictError::from_io(path, e))?;
        log::debug!("Saved {} to {}", self.kind(), path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| HeartPredictError::from_io(path, e))?;
        let model: Model = serde_json::from_str(&json)?;
        log::debug!("Loaded {} from {}", model.kind(), path.display());
        Ok(model)
    }
}

impl Estimator for Model {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        delegate!(self, m => m.fit(x, y))
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        delegate!(self, m => m.predict(x))
    }

    fn predict_risk(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        delegate!(self, m => m.predict_risk(x))
    }

    fn set_hyperparameter(&mut self, param: Hyperparameter, value: f64) -> Result<()> {
        delegate!(self, m => m.set_hyperparameter(param, value))
    }

    fn name(&self) -> &str {
        delegate!(self, m => m.name())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Model({})", self.kind())
    }
}
