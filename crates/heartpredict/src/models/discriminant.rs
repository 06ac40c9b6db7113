//! Gaussian discriminant classifiers.
//!
//! Both models estimate one mean per class and class priors from the label
//! frequencies. LDA shares a pooled covariance between classes, QDA keeps one
//! covariance per class. A small ridge keeps the covariance invertible when
//! features are collinear.
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::config::Hyperparameter;
use crate::error::{HeartPredictError, Result};
use crate::models::estimator::Estimator;
use crate::models::utils::{
    argmax_first, check_fit_input, distinct_classes, mahalanobis, not_fitted, softmax_rows,
    spd_inverse, to_class_labels, unsupported,
};

const RIDGE: f64 = 1e-6;

/// Per-class sample blocks, means and log priors.
struct ClassSummary {
    classes: Vec<usize>,
    means: Vec<Array1<f64>>,
    log_priors: Vec<f64>,
    centered: Vec<Array2<f64>>,
}

fn summarize(x: &Array2<f64>, y: &Array1<f64>) -> Result<ClassSummary> {
    check_fit_input(x, y)?;
    let labels = to_class_labels(y)?;
    let classes = distinct_classes(&labels);
    let n = x.nrows() as f64;

    let mut means = Vec::with_capacity(classes.len());
    let mut log_priors = Vec::with_capacity(classes.len());
    let mut centered = Vec::with_capacity(classes.len());
    for &class in &classes {
        let rows: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        let block = x.select(Axis(0), &rows);
        let mean = block.mean_axis(Axis(0)).ok_or_else(|| {
            HeartPredictError::Model(format!("class {} has no samples", class))
        })?;
        let diff = &block - &mean;
        log_priors.push((rows.len() as f64 / n).ln());
        means.push(mean);
        centered.push(diff);
    }
    Ok(ClassSummary {
        classes,
        means,
        log_priors,
        centered,
    })
}

fn regularize(mut cov: Array2<f64>) -> Array2<f64> {
    for i in 0..cov.nrows() {
        cov[(i, i)] += RIDGE;
    }
    cov
}

/// Pick the class with the highest score per row and the posterior of class `1`.
fn decide(classes: &[usize], scores: Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    let predicted = scores
        .rows()
        .into_iter()
        .map(|row| {
            let scores = row.to_vec();
            argmax_first(&scores).map_or(0.0, |i| classes[i] as f64)
        })
        .collect();

    let mut posterior = scores;
    softmax_rows(&mut posterior);
    let risk = match classes.iter().position(|&c| c == 1) {
        Some(idx) => posterior.column(idx).to_owned(),
        None => Array1::zeros(posterior.nrows()),
    };
    (predicted, risk)
}

#[derive(Debug, Serialize, Deserialize)]
struct LdaFit {
    classes: Vec<usize>,
    means: Vec<Array1<f64>>,
    log_priors: Vec<f64>,
    precision: Array2<f64>,
}

/// Linear discriminant analysis with a pooled covariance.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LdaModel {
    fit: Option<LdaFit>,
}

impl LdaModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn scores(&self, x: &Array2<f64>) -> Result<(Vec<usize>, Array2<f64>)> {
        let fit = self.fit.as_ref().ok_or_else(|| not_fitted(self.name()))?;
        let mut scores = Array2::zeros((x.nrows(), fit.classes.len()));
        for (k, mean) in fit.means.iter().enumerate() {
            let weights = fit.precision.dot(mean);
            let offset = -0.5 * mean.dot(&weights) + fit.log_priors[k];
            let column = x.dot(&weights) + offset;
            scores.column_mut(k).assign(&column);
        }
        Ok((fit.classes.clone(), scores))
    }
}

impl Estimator for LdaModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let summary = summarize(x, y)?;
        let p = x.ncols();
        let dof = x.nrows().saturating_sub(summary.classes.len()).max(1) as f64;

        let mut pooled = Array2::<f64>::zeros((p, p));
        for diff in &summary.centered {
            pooled = pooled + diff.t().dot(diff);
        }
        let (precision, _) = spd_inverse(&regularize(pooled / dof))?;

        self.fit = Some(LdaFit {
            classes: summary.classes,
            means: summary.means,
            log_priors: summary.log_priors,
            precision,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (classes, scores) = self.scores(x)?;
        Ok(decide(&classes, scores).0)
    }

    fn predict_risk(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (classes, scores) = self.scores(x)?;
        Ok(decide(&classes, scores).1)
    }

    fn set_hyperparameter(&mut self, param: Hyperparameter, _value: f64) -> Result<()> {
        Err(unsupported(self.name(), param))
    }

    fn name(&self) -> &str {
        "LinearDiscriminantAnalysis"
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct QdaClass {
    class: usize,
    mean: Array1<f64>,
    precision: Array2<f64>,
    log_det: f64,
    log_prior: f64,
}

/// Quadratic discriminant analysis with one covariance per class.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QdaModel {
    classes: Vec<QdaClass>,
}

impl QdaModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn scores(&self, x: &Array2<f64>) -> Result<(Vec<usize>, Array2<f64>)> {
        if self.classes.is_empty() {
            return Err(not_fitted(self.name()));
        }
        let mut scores = Array2::zeros((x.nrows(), self.classes.len()));
        for (k, c) in self.classes.iter().enumerate() {
            for (i, row) in x.rows().into_iter().enumerate() {
                scores[(i, k)] =
                    -0.5 * c.log_det - 0.5 * mahalanobis(row, &c.mean, &c.precision) + c.log_prior;
            }
        }
        Ok((self.classes.iter().map(|c| c.class).collect(), scores))
    }
}

impl Estimator for QdaModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let summary = summarize(x, y)?;
        let mut fitted = Vec::with_capacity(summary.classes.len());
        for (k, diff) in summary.centered.iter().enumerate() {
            let dof = diff.nrows().saturating_sub(1).max(1) as f64;
            let cov = regularize(diff.t().dot(diff) / dof);
            let (precision, log_det) = spd_inverse(&cov)?;
            fitted.push(QdaClass {
                class: summary.classes[k],
                mean: summary.means[k].clone(),
                precision,
                log_det,
                log_prior: summary.log_priors[k],
            });
        }
        self.classes = fitted;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (classes, scores) = self.scores(x)?;
        Ok(decide(&classes, scores).0)
    }

    fn predict_risk(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (classes, scores) = self.scores(x)?;
        Ok(decide(&classes, scores).1)
    }

    fn set_hyperparameter(&mut self, param: Hyperparameter, _value: f64) -> Result<()> {
        Err(unsupported(self.name(), param))
    }

    fn name(&self) -> &str {
        "QuadraticDiscriminantAnalysis"
    }
}
