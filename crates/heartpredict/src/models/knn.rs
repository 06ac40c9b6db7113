use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Hyperparameter;
use crate::error::Result;
use crate::models::estimator::Estimator;
use crate::models::utils::{check_fit_input, not_fitted, positive_integer, to_class_labels, unsupported};

/// Brute-force k-nearest-neighbours classifier (Euclidean distance, uniform
/// weights).
#[derive(Debug, Serialize, Deserialize)]
pub struct KnnModel {
    n_neighbors: usize,
    x: Option<Array2<f64>>,
    y: Vec<usize>,
    n_classes: usize,
}

impl KnnModel {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            x: None,
            y: Vec::new(),
            n_classes: 0,
        }
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Class counts among the `k` nearest training samples of every row.
    fn neighbour_votes(&self, x: &Array2<f64>) -> Result<Vec<Vec<usize>>> {
        let train = self.x.as_ref().ok_or_else(|| not_fitted(self.name()))?;
        let k = self.n_neighbors.min(train.nrows());
        if k < self.n_neighbors {
            log::warn!(
                "n_neighbors = {} exceeds the {} training samples, using {}",
                self.n_neighbors,
                train.nrows(),
                k
            );
        }

        let votes = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let query = x.row(i);
                let mut distances: Vec<(f64, usize)> = train
                    .rows()
                    .into_iter()
                    .enumerate()
                    .map(|(j, row)| {
                        let d: f64 = row.iter().zip(query.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
                        (d, j)
                    })
                    .collect();
                let cmp = |a: &(f64, usize), b: &(f64, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
                if k < distances.len() {
                    distances.select_nth_unstable_by(k - 1, cmp);
                    distances.truncate(k);
                }
                let mut counts = vec![0usize; self.n_classes];
                for &(_, j) in &distances {
                    counts[self.y[j]] += 1;
                }
                counts
            })
            .collect();
        Ok(votes)
    }
}

impl Estimator for KnnModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = to_class_labels(y)?;
        self.n_classes = labels.iter().max().map_or(0, |m| m + 1);
        self.y = labels.to_vec();
        self.x = Some(x.clone());
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let votes = self.neighbour_votes(x)?;
        Ok(votes
            .iter()
            .map(|counts| {
                let mut best = 0;
                for (class, &c) in counts.iter().enumerate() {
                    if c > counts[best] {
                        best = class;
                    }
                }
                best as f64
            })
            .collect())
    }

    fn predict_risk(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let votes = self.neighbour_votes(x)?;
        Ok(votes
            .iter()
            .map(|counts| {
                let total: usize = counts.iter().sum();
                counts.get(1).map_or(0.0, |&c| c as f64 / total.max(1) as f64)
            })
            .collect())
    }

    fn set_hyperparameter(&mut self, param: Hyperparameter, value: f64) -> Result<()> {
        match param {
            Hyperparameter::NNeighbors => {
                self.n_neighbors = positive_integer(param, value)?;
                Ok(())
            }
            _ => Err(unsupported(self.name(), param)),
        }
    }

    fn name(&self) -> &str {
        "KNeighborsClassifier"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn nearest_neighbour_recovers_clusters() {
        let x = array![[0.0, 0.0], [0.1, 0.2], [0.2, 0.1], [5.0, 5.0], [5.1, 4.9], [4.9, 5.2]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut model = KnnModel::new(3);
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&array![[0.05, 0.05], [5.0, 5.1]]).unwrap();
        assert_eq!(pred.to_vec(), vec![0.0, 1.0]);
        let risk = model.predict_risk(&array![[0.05, 0.05], [5.0, 5.1]]).unwrap();
        assert_eq!(risk.to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn vote_ties_go_to_lower_class() {
        let x = array![[0.0], [2.0]];
        let y = array![1.0, 0.0];
        let mut model = KnnModel::new(2);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&array![[1.0]]).unwrap().to_vec(), vec![0.0]);
    }

    #[test]
    fn k_larger_than_training_set_is_clamped() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![0.0, 1.0, 1.0];
        let mut model = KnnModel::new(1);
        model.set_hyperparameter(Hyperparameter::NNeighbors, 10.0).unwrap();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_neighbors(), 10);
        assert_eq!(model.predict(&array![[0.0]]).unwrap().to_vec(), vec![1.0]);
    }
}
