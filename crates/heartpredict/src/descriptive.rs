//! Descriptive statistics over the clinical records.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use statrs::statistics::{Data, Median, Statistics};

use crate::data_handling::{Column, Table};
use crate::error::{HeartPredictError, Result};

/// Share of `0` and `1` values in a binary column.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanStatistics {
    pub name: String,
    pub zero: f64,
    pub one: f64,
}

impl fmt::Display for BooleanStatistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  0: {:.4}", self.zero)?;
        write!(f, "  1: {:.4}", self.one)
    }
}

/// Summary statistics of a continuous column.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteStatistics {
    pub name: String,
    pub minimum: f64,
    pub maximum: f64,
    pub median: f64,
    pub mean: f64,
    /// Sample standard deviation (n - 1 in the denominator).
    pub standard_dev: f64,
}

impl fmt::Display for DiscreteStatistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  min:    {}", self.minimum)?;
        writeln!(f, "  max:    {}", self.maximum)?;
        writeln!(f, "  median: {}", self.median)?;
        writeln!(f, "  mean:   {}", self.mean)?;
        write!(f, "  std:    {}", self.standard_dev)
    }
}

/// Comparison used to filter rows against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl Relation {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Relation::Equal => value == threshold,
            Relation::Less => value < threshold,
            Relation::Greater => value > threshold,
            Relation::LessEqual => value <= threshold,
            Relation::GreaterEqual => value >= threshold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Equal => "==",
            Relation::Less => "<",
            Relation::Greater => ">",
            Relation::LessEqual => "<=",
            Relation::GreaterEqual => ">=",
        }
    }
}

impl FromStr for Relation {
    type Err = HeartPredictError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "==" => Ok(Relation::Equal),
            "<" => Ok(Relation::Less),
            ">" => Ok(Relation::Greater),
            "<=" => Ok(Relation::LessEqual),
            ">=" => Ok(Relation::GreaterEqual),
            other => Err(HeartPredictError::UnsupportedRelation(other.to_string())),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts of the distinct values of a column, most frequent first.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDistribution {
    pub column: String,
    pub entries: Vec<(String, usize)>,
}

impl ValueDistribution {
    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries.iter().find(|(l, _)| l == label).map(|(_, c)| *c)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(l, _)| l.clone()).collect()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.entries.iter().map(|(_, c)| *c).collect()
    }
}

impl fmt::Display for ValueDistribution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.column)?;
        for (label, count) in &self.entries {
            write!(f, "\n  {}: {}", label, count)?;
        }
        Ok(())
    }
}

/// Descriptive analysis over one table.
#[derive(Debug, Clone)]
pub struct DescriptiveBackend {
    table: Table,
}

impl DescriptiveBackend {
    pub fn new(table: Table) -> Self {
        Self { table }
    }

    pub fn boolean_statistics(&self, column: &str) -> Result<BooleanStatistics> {
        log::debug!("Read in boolean column {}", column);
        let values = self.table.column(column)?;
        if values.is_empty() {
            return Err(HeartPredictError::InvalidInput(format!("column '{}' is empty", column)));
        }
        let mut zeros = 0usize;
        let mut ones = 0usize;
        for &v in values.iter() {
            if v == 0.0 {
                zeros += 1;
            } else if v == 1.0 {
                ones += 1;
            } else {
                return Err(HeartPredictError::InvalidInput(format!(
                    "column '{}' is not binary: found value {}",
                    column, v
                )));
            }
        }
        let n = values.len() as f64;
        Ok(BooleanStatistics {
            name: column.to_string(),
            zero: zeros as f64 / n,
            one: ones as f64 / n,
        })
    }

    pub fn discrete_statistics(&self, column: &str) -> Result<DiscreteStatistics> {
        log::debug!("Read in discrete column {}", column);
        let values = self.table.column(column)?.to_vec();
        if values.is_empty() {
            return Err(HeartPredictError::InvalidInput(format!("column '{}' is empty", column)));
        }
        let standard_dev = if values.len() > 1 {
            Statistics::std_dev(&values)
        } else {
            0.0
        };
        Ok(DiscreteStatistics {
            name: column.to_string(),
            minimum: Statistics::min(&values),
            maximum: Statistics::max(&values),
            median: Data::new(values.clone()).median(),
            mean: Statistics::mean(&values),
            standard_dev,
        })
    }

    /// Rows of the backend's table satisfying `column <relation> threshold`.
    pub fn filtered_table(&self, column: &str, threshold: f64, relation: Relation) -> Result<Table> {
        filter_table(&self.table, column, threshold, relation)
    }

    pub fn value_distribution(&self, column: &str) -> Result<ValueDistribution> {
        value_distribution(&self.table, column)
    }
}

/// Rows of `table` satisfying `column <relation> threshold`.
pub fn filter_table(table: &Table, column: &str, threshold: f64, relation: Relation) -> Result<Table> {
    let values = table.column(column)?;
    let mask: Vec<bool> = values.iter().map(|&v| relation.holds(v, threshold)).collect();
    let filtered = table.mask(&mask)?;
    log::debug!(
        "Filtered {} {} {}: kept {} of {} rows",
        column,
        relation,
        threshold,
        filtered.nrows(),
        table.nrows()
    );
    Ok(filtered)
}

/// Count the distinct values of `column`.
///
/// Binary columns with a known meaning are labelled in words, every other
/// column by its raw values.
pub fn value_distribution(table: &Table, column: &str) -> Result<ValueDistribution> {
    let values = table.column(column)?;

    let mut counts: BTreeMap<u64, (f64, usize)> = BTreeMap::new();
    for &v in values.iter() {
        counts.entry(v.to_bits()).or_insert((v, 0)).1 += 1;
    }
    let mut entries: Vec<(f64, usize)> = counts.into_values().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.total_cmp(&b.0)));

    let is_binary = entries.len() == 2 && entries.iter().all(|(v, _)| *v == 0.0 || *v == 1.0);
    let meaning = Column::from_str(column).ok().and_then(|c| c.binary_meaning());

    let entries = entries
        .into_iter()
        .map(|(value, count)| {
            let label = match (is_binary, meaning) {
                (true, Some((zero, one))) => {
                    let text = if value == 0.0 { zero } else { one };
                    text.to_string()
                }
                _ => format!("{}", value),
            };
            (label, count)
        })
        .collect();

    Ok(ValueDistribution {
        column: column.to_string(),
        entries,
    })
}
