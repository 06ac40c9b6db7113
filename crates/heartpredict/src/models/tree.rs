use linfa::prelude::*;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::Hyperparameter;
use crate::error::{HeartPredictError, Result};
use crate::models::estimator::Estimator;
use crate::models::utils::{
    check_fit_input, not_fitted, positive_integer, to_class_labels, unsupported,
};

fn fit_tree(x: &Array2<f64>, labels: Array1<usize>, max_depth: Option<usize>) -> Result<DecisionTree<f64, usize>> {
    let dataset = Dataset::new(x.clone(), labels);
    DecisionTree::params()
        .max_depth(max_depth)
        .fit(&dataset)
        .map_err(|e| HeartPredictError::Model(format!("decision tree: {}", e)))
}

/// Single CART decision tree backed by `linfa-trees`.
#[derive(Serialize, Deserialize)]
pub struct DecisionTreeModel {
    max_depth: Option<usize>,
    tree: Option<DecisionTree<f64, usize>>,
}

impl DecisionTreeModel {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self { max_depth, tree: None }
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}

impl Estimator for DecisionTreeModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        self.tree = Some(fit_tree(x, to_class_labels(y)?, self.max_depth)?);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let tree = self.tree.as_ref().ok_or_else(|| not_fitted(self.name()))?;
        let labels: Array1<usize> = tree.predict(x);
        Ok(labels.mapv(|c| c as f64))
    }

    fn set_hyperparameter(&mut self, param: Hyperparameter, value: f64) -> Result<()> {
        match param {
            Hyperparameter::MaxDepth => {
                self.max_depth = Some(positive_integer(param, value)?);
                Ok(())
            }
            _ => Err(unsupported(self.name(), param)),
        }
    }

    fn name(&self) -> &str {
        "DecisionTreeClassifier"
    }
}

#[derive(Serialize, Deserialize)]
struct ForestMember {
    features: Vec<usize>,
    tree: DecisionTree<f64, usize>,
}

/// Bagged ensemble of decision trees.
///
/// Every tree is grown on a bootstrap sample of the rows and a random subset
/// of `ceil(sqrt(n_features))` features. The ensemble predicts by majority
/// vote; ties go to the lower class.
#[derive(Serialize, Deserialize)]
pub struct RandomForestModel {
    n_estimators: usize,
    max_depth: Option<usize>,
    seed: u64,
    n_classes: usize,
    members: Vec<ForestMember>,
}

impl RandomForestModel {
    pub fn new(n_estimators: usize, max_depth: Option<usize>, seed: u64) -> Self {
        Self {
            n_estimators,
            max_depth,
            seed,
            n_classes: 0,
            members: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.members.len()
    }

    /// Vote counts per row and class.
    fn votes(&self, x: &Array2<f64>) -> Result<Array2<usize>> {
        if self.members.is_empty() {
            return Err(not_fitted(self.name()));
        }
        let mut votes = Array2::zeros((x.nrows(), self.n_classes));
        for member in &self.members {
            let sub = x.select(Axis(1), &member.features);
            let labels: Array1<usize> = member.tree.predict(&sub);
            for (row, &class) in labels.iter().enumerate() {
                if class < self.n_classes {
                    votes[(row, class)] += 1;
                }
            }
        }
        Ok(votes)
    }
}

impl Estimator for RandomForestModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = to_class_labels(y)?;
        let (n, p) = x.dim();
        let n_sub = ((p as f64).sqrt().ceil() as usize).clamp(1, p.max(1));
        let mut rng = StdRng::seed_from_u64(self.seed);

        self.n_classes = labels.iter().max().map_or(0, |m| m + 1);
        self.members.clear();
        for _ in 0..self.n_estimators {
            let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut features = rand::seq::index::sample(&mut rng, p, n_sub).into_vec();
            features.sort_unstable();

            let x_boot = x.select(Axis(0), &rows).select(Axis(1), &features);
            let y_boot = labels.select(Axis(0), &rows);
            let tree = fit_tree(&x_boot, y_boot, self.max_depth)?;
            self.members.push(ForestMember { features, tree });
        }
        log::debug!(
            "Grew {} trees on {} features each (max_depth {:?})",
            self.members.len(),
            n_sub,
            self.max_depth
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let votes = self.votes(x)?;
        Ok(votes
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (class, &count) in row.iter().enumerate() {
                    if count > row[best] {
                        best = class;
                    }
                }
                best as f64
            })
            .collect())
    }

    fn predict_risk(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let votes = self.votes(x)?;
        let total = self.members.len() as f64;
        Ok(votes
            .rows()
            .into_iter()
            .map(|row| row.get(1).map_or(0.0, |&c| c as f64 / total))
            .collect())
    }

    fn set_hyperparameter(&mut self, param: Hyperparameter, value: f64) -> Result<()> {
        match param {
            Hyperparameter::MaxDepth => {
                self.max_depth = Some(positive_integer(param, value)?);
                Ok(())
            }
            _ => Err(unsupported(self.name(), param)),
        }
    }

    fn name(&self) -> &str {
        "RandomForestClassifier"
    }
}
