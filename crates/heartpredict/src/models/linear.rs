use linfa::prelude::*;
use linfa_linear::{FittedLinearRegression, LinearRegression};
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::Hyperparameter;
use crate::error::{HeartPredictError, Result};
use crate::models::estimator::Estimator;
use crate::models::utils::{check_fit_input, not_fitted, to_class_labels, unsupported};

pub const DEFAULT_ALPHA: f64 = 1.0;
pub const DEFAULT_MAX_ITERATIONS: u64 = 100;

/// L2-regularised binary logistic regression backed by `linfa-logistic`.
///
/// `alpha` is the regularisation strength. The cross-validated variant is the
/// same model whose `alpha` is chosen by the training sweep.
#[derive(Serialize, Deserialize)]
pub struct LogisticModel {
    alpha: f64,
    max_iterations: u64,
    cross_validated: bool,
    model: Option<FittedLogisticRegression<f64, usize>>,
}

impl LogisticModel {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            cross_validated: false,
            model: None,
        }
    }

    pub fn cross_validated() -> Self {
        Self {
            cross_validated: true,
            ..Self::new(DEFAULT_ALPHA)
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    fn fitted(&self) -> Result<&FittedLogisticRegression<f64, usize>> {
        self.model.as_ref().ok_or_else(|| not_fitted(self.name()))
    }
}

impl Estimator for LogisticModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let dataset = Dataset::new(x.clone(), to_class_labels(y)?);
        let fitted = LogisticRegression::default()
            .alpha(self.alpha)
            .max_iterations(self.max_iterations)
            .fit(&dataset)
            .map_err(|e| HeartPredictError::Model(format!("{}: {}", self.name(), e)))?;
        self.model = Some(fitted);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let labels: Array1<usize> = self.fitted()?.predict(x);
        Ok(labels.mapv(|c| c as f64))
    }

    /// Probability of class `1`.
    fn predict_risk(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let model = self.fitted()?;
        let positive = model.predict_probabilities(x);
        if model.labels().pos.class == 1 {
            Ok(positive)
        } else {
            Ok(positive.mapv(|p| 1.0 - p))
        }
    }

    fn set_hyperparameter(&mut self, param: Hyperparameter, value: f64) -> Result<()> {
        match param {
            Hyperparameter::Alpha if value > 0.0 && value.is_finite() => {
                self.alpha = value;
                Ok(())
            }
            Hyperparameter::Alpha => Err(HeartPredictError::InvalidInput(format!(
                "alpha must be positive, got {}",
                value
            ))),
            _ => Err(unsupported(self.name(), param)),
        }
    }

    fn name(&self) -> &str {
        if self.cross_validated {
            "LogisticRegressionCV"
        } else {
            "LogisticRegression"
        }
    }
}

/// Ordinary least squares regression backed by `linfa-linear`.
#[derive(Default, Serialize, Deserialize)]
pub struct LinearModel {
    model: Option<FittedLinearRegression<f64>>,
}

impl LinearModel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Estimator for LinearModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let dataset = Dataset::new(x.clone(), y.clone());
        let fitted = LinearRegression::new()
            .fit(&dataset)
            .map_err(|e| HeartPredictError::Model(format!("{}: {}", self.name(), e)))?;
        self.model = Some(fitted);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let model = self.model.as_ref().ok_or_else(|| not_fitted(self.name()))?;
        Ok(model.predict(x))
    }

    fn set_hyperparameter(&mut self, param: Hyperparameter, _value: f64) -> Result<()> {
        Err(unsupported(self.name(), param))
    }

    fn name(&self) -> &str {
        "LinearRegression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn logistic_risk_follows_class_one() {
        let x = array![[-2.0], [-1.5], [-1.0], [-0.5], [0.5], [1.0], [1.5], [2.0]];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let mut model = LogisticModel::new(DEFAULT_ALPHA);
        model.fit(&x, &y).unwrap();

        let risk = model.predict_risk(&array![[-2.0], [2.0]]).unwrap();
        assert!(risk[0] < 0.5 && risk[1] > 0.5);
        assert_eq!(model.predict(&array![[-2.0], [2.0]]).unwrap().to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn logistic_alpha_must_be_positive() {
        let mut model = LogisticModel::cross_validated();
        assert_eq!(model.name(), "LogisticRegressionCV");
        assert!(model.set_hyperparameter(Hyperparameter::Alpha, 0.0).is_err());
        model.set_hyperparameter(Hyperparameter::Alpha, 0.01).unwrap();
        assert_eq!(model.alpha(), 0.01);
    }

    #[test]
    fn linear_regression_recovers_line() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let mut model = LinearModel::new();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&array![[4.0]]).unwrap();
        assert_abs_diff_eq!(pred[0], 9.0, epsilon = 1e-8);
    }
}
