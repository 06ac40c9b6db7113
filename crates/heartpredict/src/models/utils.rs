use linfa_linalg::cholesky::{Cholesky, InverseC};
use linfa_linalg::LinalgError;
use ndarray::{Array1, Array2, ArrayView1};

use crate::config::Hyperparameter;
use crate::error::{HeartPredictError, Result};

/// Convert `0, 1, 2, ...` encoded targets into class indices.
pub fn to_class_labels(y: &Array1<f64>) -> Result<Array1<usize>> {
    y.iter()
        .map(|&v| {
            if v >= 0.0 && v.fract() == 0.0 {
                Ok(v as usize)
            } else {
                Err(HeartPredictError::InvalidInput(format!(
                    "class labels must be non-negative integers, found {}",
                    v
                )))
            }
        })
        .collect()
}

pub fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(HeartPredictError::InvalidInput(
            "cannot fit a model on an empty feature matrix".to_string(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(HeartPredictError::InvalidInput(format!(
            "{} samples but {} targets",
            x.nrows(),
            y.len()
        )));
    }
    Ok(())
}

pub fn not_fitted(name: &str) -> HeartPredictError {
    HeartPredictError::Model(format!("{} has not been fitted", name))
}

pub fn unsupported(name: &str, param: Hyperparameter) -> HeartPredictError {
    HeartPredictError::InvalidInput(format!("{} has no hyperparameter '{}'", name, param))
}

pub fn positive_integer(param: Hyperparameter, value: f64) -> Result<usize> {
    if value >= 1.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(HeartPredictError::InvalidInput(format!(
            "{} must be a positive integer, got {}",
            param, value
        )))
    }
}

/// Index of the first maximum.
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            None => best = Some(i),
            Some(b) if v > values[b] => best = Some(i),
            _ => {}
        }
    }
    best
}

/// Sorted distinct class indices.
pub fn distinct_classes(y: &Array1<usize>) -> Vec<usize> {
    let mut classes: Vec<usize> = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Inverse of a symmetric positive definite matrix and `ln det A`, both from
/// its Cholesky factor.
pub fn spd_inverse(a: &Array2<f64>) -> Result<(Array2<f64>, f64)> {
    let lower = a.cholesky().map_err(linalg_error)?;
    let log_det = 2.0 * lower.diag().iter().map(|d| d.ln()).sum::<f64>();
    let inverse = a.invc().map_err(linalg_error)?;
    Ok((inverse, log_det))
}

fn linalg_error(e: LinalgError) -> HeartPredictError {
    HeartPredictError::Model(format!("covariance matrix is not invertible: {}", e))
}

/// Quadratic form `(x - mu)^T A (x - mu)`.
pub fn mahalanobis(x: ArrayView1<f64>, mu: &Array1<f64>, a: &Array2<f64>) -> f64 {
    let d = &x - mu;
    d.dot(&a.dot(&d))
}

/// Row-wise softmax of a score matrix, in place.
pub fn softmax_rows(scores: &mut Array2<f64>) {
    for mut row in scores.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let total = row.sum();
        row.mapv_inplace(|v| v / total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn spd_inverse_and_log_det() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let (inv, log_det) = spd_inverse(&a).unwrap();
        let identity = a.dot(&inv);
        for i in 0..2 {
            for j in 0..2 {
                assert_abs_diff_eq!(identity[(i, j)], if i == j { 1.0 } else { 0.0 }, epsilon = 1e-12);
            }
        }
        assert_abs_diff_eq!(log_det, 8f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn singular_covariance_is_rejected() {
        assert!(spd_inverse(&array![[1.0, 2.0], [2.0, 4.0]]).is_err());
    }

    #[test]
    fn argmax_prefers_first_occurrence() {
        assert_eq!(argmax_first(&[0.1, 0.7, 0.3, 0.7]), Some(1));
        assert_eq!(argmax_first(&[]), None);
    }

    #[test]
    fn class_labels_must_be_integral() {
        assert!(to_class_labels(&array![0.0, 1.0, 2.0]).is_ok());
        assert!(to_class_labels(&array![0.5]).is_err());
        assert!(to_class_labels(&array![-1.0]).is_err());
    }
}
