use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{HeartPredictError, Result};

/// Central configuration for a training run.
///
/// Every function that needs randomness receives the seed through this struct,
/// so two runs with equal configurations produce identical splits and models.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    pub seed: u64,
    /// Fraction of the rows held out as validation split.
    pub test_size: f64,
    pub n_folds: usize,
    /// Number of trees grown by the random forest.
    pub n_estimators: usize,
    pub output_dir: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_size: 0.2,
            n_folds: 5,
            n_estimators: 100,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl TrainConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Load a configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| HeartPredictError::from_io(path.as_ref(), e))?;
        let config: TrainConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(HeartPredictError::InvalidInput(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.n_folds < 2 {
            return Err(HeartPredictError::InvalidInput(format!(
                "n_folds must be at least 2, got {}",
                self.n_folds
            )));
        }
        if self.n_estimators == 0 {
            return Err(HeartPredictError::InvalidInput(
                "n_estimators must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.output_dir.join("scalers").join("used_scaler.json")
    }

    pub fn model_dir(&self, task: Task) -> PathBuf {
        self.output_dir.join("trained_models").join(task.dir_name())
    }

    pub fn plot_dir(&self) -> PathBuf {
        self.output_dir.join("plots")
    }
}

/// Correlation coefficient used by the correlation backend.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    Pearson,
    Kendall,
    Spearman,
}

impl CorrelationMethod {
    pub const ALL: [CorrelationMethod; 3] = [
        CorrelationMethod::Pearson,
        CorrelationMethod::Kendall,
        CorrelationMethod::Spearman,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Kendall => "kendall",
            CorrelationMethod::Spearman => "spearman",
        }
    }
}

impl FromStr for CorrelationMethod {
    type Err = HeartPredictError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "kendall" => Ok(CorrelationMethod::Kendall),
            "spearman" => Ok(CorrelationMethod::Spearman),
            _ => Err(HeartPredictError::InvalidInput(format!(
                "Unknown correlation method: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Learning task a model family is trained for.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Classification,
    Regression,
}

impl Task {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Task::Classification => "classifier",
            Task::Regression => "regressor",
        }
    }

    pub fn metric(&self) -> Metric {
        match self {
            Task::Classification => Metric::Accuracy,
            Task::Regression => Metric::Rmse,
        }
    }
}

/// Validation metric together with its optimisation direction.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Accuracy,
    Rmse,
}

impl Metric {
    pub fn higher_is_better(&self) -> bool {
        matches!(self, Metric::Accuracy)
    }

    /// True when `candidate` strictly beats `incumbent`. Equal scores never
    /// replace the incumbent, so the first best value wins.
    pub fn is_better(&self, candidate: f64, incumbent: f64) -> bool {
        if candidate.is_nan() {
            return false;
        }
        if incumbent.is_nan() {
            return true;
        }
        if self.higher_is_better() {
            candidate > incumbent
        } else {
            candidate < incumbent
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Rmse => "root mean squared error",
        }
    }
}

/// Supported model families.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    DecisionTree,
    RandomForest,
    KNearestNeighbors,
    LinearDiscriminantAnalysis,
    QuadraticDiscriminantAnalysis,
    LogisticRegression,
    LogisticRegressionCV,
    LinearRegression,
}

impl ModelKind {
    /// Family name used in log output and artifact file names.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::DecisionTree => "DecisionTreeClassifier",
            ModelKind::RandomForest => "RandomForestClassifier",
            ModelKind::KNearestNeighbors => "KNeighborsClassifier",
            ModelKind::LinearDiscriminantAnalysis => "LinearDiscriminantAnalysis",
            ModelKind::QuadraticDiscriminantAnalysis => "QuadraticDiscriminantAnalysis",
            ModelKind::LogisticRegression => "LogisticRegression",
            ModelKind::LogisticRegressionCV => "LogisticRegressionCV",
            ModelKind::LinearRegression => "LinearRegression",
        }
    }

    pub fn task(&self) -> Task {
        match self {
            ModelKind::LogisticRegression
            | ModelKind::LogisticRegressionCV
            | ModelKind::LinearRegression => Task::Regression,
            _ => Task::Classification,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = HeartPredictError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "decisiontreeclassifier" | "decision_tree" => Ok(ModelKind::DecisionTree),
            "randomforestclassifier" | "random_forest" => Ok(ModelKind::RandomForest),
            "kneighborsclassifier" | "knn" => Ok(ModelKind::KNearestNeighbors),
            "lineardiscriminantanalysis" | "lda" => Ok(ModelKind::LinearDiscriminantAnalysis),
            "quadraticdiscriminantanalysis" | "qda" => {
                Ok(ModelKind::QuadraticDiscriminantAnalysis)
            }
            "logisticregression" | "logistic" => Ok(ModelKind::LogisticRegression),
            "logisticregressioncv" | "logistic_cv" => Ok(ModelKind::LogisticRegressionCV),
            "linearregression" | "linear" => Ok(ModelKind::LinearRegression),
            _ => Err(HeartPredictError::InvalidInput(format!(
                "Unknown model type: {}",
                s
            ))),
        }
    }
}

/// Hyperparameters that a sweep can vary.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Hyperparameter {
    MaxDepth,
    NNeighbors,
    Alpha,
}

impl Hyperparameter {
    pub fn name(&self) -> &'static str {
        match self {
            Hyperparameter::MaxDepth => "max_depth",
            Hyperparameter::NNeighbors => "n_neighbors",
            Hyperparameter::Alpha => "alpha",
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, Hyperparameter::Alpha)
    }

    /// Render a candidate value the way it was declared.
    pub fn format_value(&self, value: f64) -> String {
        if self.is_integer() {
            format!("{}", value as usize)
        } else {
            format!("{}", value)
        }
    }
}

impl fmt::Display for Hyperparameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
