//! Kaplan-Meier survival curves stratified by a model's predicted risk.
//!
//! Each validation patient contributes one observation: the follow-up
//! duration from the `time` column, and whether death was observed
//! (`DEATH_EVENT == 1`). Patients without an observed death are right-censored
//! at their last follow-up.
use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2};
use statrs::statistics::{Data, Median};

use crate::data_handling::{Column, SplitData, Table, LABEL_COLUMN, TIME_COLUMN};
use crate::error::{HeartPredictError, Result};
use crate::models::estimator::Estimator;

/// Kaplan-Meier estimate of the survival function.
///
/// The curve stores parallel vectors, one entry per distinct time at which at
/// least one event occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct KaplanMeierCurve {
    pub times: Vec<f64>,
    /// Survival probability right after each event time.
    pub survival_prob: Vec<f64>,
    /// Subjects still under observation just before each event time.
    pub at_risk: Vec<usize>,
    pub events: Vec<usize>,
    pub n_observations: usize,
}

impl KaplanMeierCurve {
    /// Fit a curve from `(duration, event_observed)` pairs.
    pub fn from_observations(mut data: Vec<(f64, bool)>) -> Self {
        data.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = data.len();
        let mut times = vec![];
        let mut survival_prob = vec![];
        let mut at_risk_vec = vec![];
        let mut events_vec = vec![];
        let mut current_survival = 1.0;

        let mut i = 0;
        while i < total {
            let current_time = data[i].0;
            let at_risk = total - i;

            let mut event_count = 0;
            let mut j = i;
            while j < total && data[j].0 == current_time {
                if data[j].1 {
                    event_count += 1;
                }
                j += 1;
            }

            if event_count > 0 {
                current_survival *= 1.0 - event_count as f64 / at_risk as f64;
                times.push(current_time);
                survival_prob.push(current_survival);
                at_risk_vec.push(at_risk);
                events_vec.push(event_count);
            }
            i = j;
        }

        Self {
            times,
            survival_prob,
            at_risk: at_risk_vec,
            events: events_vec,
            n_observations: total,
        }
    }

    /// First time at which the survival probability drops to 0.5 or below.
    pub fn median_survival(&self) -> Option<f64> {
        self.survival_prob
            .iter()
            .position(|&p| p <= 0.5)
            .map(|i| self.times[i])
    }

    /// Step-function value of the curve at `time`.
    pub fn survival_at(&self, time: f64) -> f64 {
        match self.times.iter().rposition(|&t| t <= time) {
            Some(i) => self.survival_prob[i],
            None => 1.0,
        }
    }

    pub fn total_events(&self) -> usize {
        self.events.iter().sum()
    }
}

/// How validation rows are split into strata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stratification {
    /// Above (`High risk`) or at/below (`Low risk`) the median predicted risk.
    MedianRisk,
    /// The two values of a binary covariate.
    Covariate(String),
}

impl FromStr for Stratification {
    type Err = HeartPredictError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "risk" | "median" => Ok(Stratification::MedianRisk),
            column => {
                let column = Column::from_str(column)?;
                if !column.is_boolean() || column.as_str() == LABEL_COLUMN {
                    return Err(HeartPredictError::InvalidInput(format!(
                        "cannot stratify by '{}': not a binary covariate",
                        column.as_str()
                    )));
                }
                Ok(Stratification::Covariate(column.as_str().to_string()))
            }
        }
    }
}

impl fmt::Display for Stratification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stratification::MedianRisk => f.write_str("median predicted risk"),
            Stratification::Covariate(column) => f.write_str(column),
        }
    }
}

/// A labelled subgroup of rows and its fitted curve.
#[derive(Debug, Clone)]
pub struct Stratum {
    pub label: String,
    pub rows: Vec<usize>,
    pub curve: KaplanMeierCurve,
}

/// Survival analysis over held-out rows.
pub struct SurvivalBackend {
    table: Table,
    features: Array2<f64>,
}

impl SurvivalBackend {
    /// `features` are the scaled model inputs of the rows in `table`.
    pub fn new(table: Table, features: Array2<f64>) -> Result<Self> {
        if table.nrows() != features.nrows() {
            return Err(HeartPredictError::InvalidInput(format!(
                "{} table rows but {} feature rows",
                table.nrows(),
                features.nrows()
            )));
        }
        table.column_index(TIME_COLUMN)?;
        table.column_index(LABEL_COLUMN)?;
        Ok(Self { table, features })
    }

    pub fn from_split(split: &SplitData) -> Result<Self> {
        Self::new(split.table.clone(), split.x.clone())
    }

    pub fn predicted_risk<M: Estimator + ?Sized>(&self, model: &M) -> Result<Array1<f64>> {
        model.predict_risk(&self.features)
    }

    /// Partition the rows and fit one curve per non-empty stratum.
    pub fn strata<M: Estimator + ?Sized>(
        &self,
        model: &M,
        stratification: &Stratification,
    ) -> Result<Vec<Stratum>> {
        let groups: Vec<(String, Vec<usize>)> = match stratification {
            Stratification::MedianRisk => {
                let risk = self.predicted_risk(model)?;
                let median = Data::new(risk.to_vec()).median();
                log::debug!("Median predicted risk {:.4} from {}", median, model.name());
                let (high, low): (Vec<usize>, Vec<usize>) =
                    (0..risk.len()).partition(|&i| risk[i] > median);
                vec![("High risk".to_string(), high), ("Low risk".to_string(), low)]
            }
            Stratification::Covariate(column) => self.covariate_groups(column)?,
        };

        let times = self.table.column(TIME_COLUMN)?;
        let deaths = self.table.column(LABEL_COLUMN)?;
        Ok(groups
            .into_iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(label, rows)| {
                let observations = rows.iter().map(|&i| (times[i], deaths[i] == 1.0)).collect();
                let curve = KaplanMeierCurve::from_observations(observations);
                log::debug!(
                    "{}: {} patients, {} deaths, median survival {:?}",
                    label,
                    rows.len(),
                    curve.total_events(),
                    curve.median_survival()
                );
                Stratum { label, rows, curve }
            })
            .collect())
    }

    fn covariate_groups(&self, column: &str) -> Result<Vec<(String, Vec<usize>)>> {
        let values = self.table.column(column)?;
        if let Some(v) = values.iter().find(|&&v| v != 0.0 && v != 1.0) {
            return Err(HeartPredictError::InvalidInput(format!(
                "cannot stratify by '{}': found non-binary value {}",
                column, v
            )));
        }
        let (zero_label, one_label) = match Column::from_str(column).ok().and_then(|c| c.binary_meaning()) {
            Some((zero, one)) => (zero.to_string(), one.to_string()),
            None => (format!("{} = 0", column), format!("{} = 1", column)),
        };
        let (ones, zeros): (Vec<usize>, Vec<usize>) = (0..values.len()).partition(|&i| values[i] == 1.0);
        Ok(vec![(zero_label, zeros), (one_label, ones)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn km_handles_censoring() {
        // events at 1, 3; censored at 2 and 4
        let curve = KaplanMeierCurve::from_observations(vec![
            (3.0, true),
            (1.0, true),
            (2.0, false),
            (4.0, false),
        ]);
        assert_eq!(curve.times, vec![1.0, 3.0]);
        assert_eq!(curve.at_risk, vec![4, 2]);
        assert_abs_diff_eq!(curve.survival_prob[0], 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.survival_prob[1], 0.375, epsilon = 1e-12);
        assert_eq!(curve.median_survival(), Some(3.0));
        assert_eq!(curve.survival_at(0.5), 1.0);
        assert_abs_diff_eq!(curve.survival_at(2.5), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn all_censored_curve_never_drops() {
        let curve = KaplanMeierCurve::from_observations(vec![(5.0, false), (6.0, false)]);
        assert!(curve.times.is_empty());
        assert_eq!(curve.median_survival(), None);
        assert_eq!(curve.survival_at(10.0), 1.0);
        assert_eq!(curve.n_observations, 2);
    }

    #[test]
    fn stratification_parsing() {
        assert_eq!("risk".parse::<Stratification>().unwrap(), Stratification::MedianRisk);
        assert_eq!(
            "smoking".parse::<Stratification>().unwrap(),
            Stratification::Covariate("smoking".to_string())
        );
        assert!("age".parse::<Stratification>().is_err());
        assert!("DEATH_EVENT".parse::<Stratification>().is_err());
        assert!(matches!(
            "weight".parse::<Stratification>(),
            Err(HeartPredictError::ColumnNotFound(_))
        ));
    }
}
