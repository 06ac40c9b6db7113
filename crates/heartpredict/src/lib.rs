//! heartpredict: analysis and prediction toolkit for the heart-failure
//! clinical records dataset.
//!
//! The crate loads the tabular dataset, computes descriptive and correlation
//! statistics, trains classifier and regressor families with a per-family
//! cross-validated hyperparameter sweep, persists trained models and the
//! fitted feature scaler, and fits Kaplan-Meier survival curves stratified by
//! a model's predicted risk.
pub mod config;
pub mod correlation;
pub mod data_handling;
pub mod descriptive;
pub mod error;
pub mod model_selection;
pub mod models;
pub mod preprocessing;
pub mod report;
pub mod stats;
pub mod survival;

pub use config::{CorrelationMethod, Hyperparameter, Metric, ModelKind, Task, TrainConfig};
pub use data_handling::{FeatureData, MlData, ProjectData, Table};
pub use error::{HeartPredictError, Result};
pub use models::estimator::Estimator;
pub use models::Model;
