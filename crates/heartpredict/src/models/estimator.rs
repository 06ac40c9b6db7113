use ndarray::{Array1, Array2};

use crate::config::Hyperparameter;
use crate::error::Result;

/// Contract shared by every model family the training core can sweep.
///
/// Targets are `f64`: class indices (`0.0`, `1.0`) for classifiers and the
/// raw target for regressors.
pub trait Estimator {
    /// Fit on the given samples, replacing any previous fit.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predicted class (classifiers) or value (regressors) per row.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Continuous risk per row, higher meaning more likely to die.
    ///
    /// Models with class probabilities return the probability of class `1`;
    /// the default falls back to `predict`.
    fn predict_risk(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict(x)
    }

    /// Set a hyperparameter before the next `fit`.
    fn set_hyperparameter(&mut self, param: Hyperparameter, value: f64) -> Result<()>;

    fn name(&self) -> &str;
}
