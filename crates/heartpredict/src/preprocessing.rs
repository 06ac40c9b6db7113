//! Feature standardization.
//!
//! Provides a `Scaler` for per-column mean/std standardization. It is fitted
//! on the training split only and persisted next to the trained models so new
//! data can be transformed with exactly the same statistics.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{HeartPredictError, Result};

/// Standard scaler (per-column mean / population std).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Columns with a smaller deviation are only centered.
    const MIN_STD: f64 = 1e-12;

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Transform all rows and return a new matrix.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(HeartPredictError::InvalidInput(format!(
                "scaler was fitted on {} features, got {}",
                self.n_features(),
                x.ncols()
            )));
        }
        let mut out = x.clone();
        for (c, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, std) = (self.mean[c], self.std[c]);
            column.mapv_inplace(|v| (v - mean) / std);
        }
        Ok(out)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        log::debug!("Saved fitted scaler to {}", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| HeartPredictError::from_io(path, e))?;
        let scaler = serde_json::from_reader(BufReader::new(file))?;
        Ok(scaler)
    }
}

/// Fit a `Scaler` from a matrix where rows are samples and columns are
/// features.
pub fn fit_scaler(x: &Array2<f64>, feature_names: &[String]) -> Result<Scaler> {
    let (nrows, ncols) = x.dim();
    if nrows == 0 || ncols == 0 {
        return Err(HeartPredictError::InvalidInput(
            "cannot fit a scaler on an empty matrix".to_string(),
        ));
    }
    if feature_names.len() != ncols {
        return Err(HeartPredictError::InvalidInput(format!(
            "{} feature names for {} columns",
            feature_names.len(),
            ncols
        )));
    }

    let mut mean = Vec::with_capacity(ncols);
    let mut std = Vec::with_capacity(ncols);
    for column in x.axis_iter(Axis(1)) {
        let m = column.sum() / nrows as f64;
        let var = column.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / nrows as f64;
        let s = var.sqrt();
        mean.push(m);
        std.push(if s < Scaler::MIN_STD { 1.0 } else { s });
    }

    Ok(Scaler {
        feature_names: feature_names.to_vec(),
        mean,
        std,
    })
}

/// Fit a scaler and return it together with the transformed matrix.
pub fn fit_transform(x: &Array2<f64>, feature_names: &[String]) -> Result<(Scaler, Array2<f64>)> {
    let scaler = fit_scaler(x, feature_names)?;
    let transformed = scaler.transform(x)?;
    Ok((scaler, transformed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    #[test]
    fn fit_transform_standardizes_columns() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let (scaler, scaled) = fit_transform(&x, &names(2)).unwrap();
        assert_abs_diff_eq!(scaler.mean[0], 2.5);
        assert_abs_diff_eq!(scaler.mean[1], 25.0);
        for column in scaled.axis_iter(Axis(1)) {
            let m = column.sum() / 4.0;
            let v = column.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / 4.0;
            assert_abs_diff_eq!(m, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(v, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn constant_column_is_only_centered() {
        let x = array![[5.0], [5.0], [5.0]];
        let (scaler, scaled) = fit_transform(&x, &names(1)).unwrap();
        assert_eq!(scaler.std[0], 1.0);
        assert!(scaled.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn transform_rejects_wrong_width() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let scaler = fit_scaler(&x, &names(2)).unwrap();
        assert!(scaler.transform(&array![[1.0, 2.0, 3.0]]).is_err());
    }
}
