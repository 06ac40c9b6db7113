//! Correlation between dataset columns and the death event.
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use ndarray::Array2;
use rayon::prelude::*;

use crate::config::CorrelationMethod;
use crate::data_handling::{Table, LABEL_COLUMN};
use crate::error::{HeartPredictError, Result};
use crate::stats::{kendall_tau_b, pearson, round_to, spearman};

fn coefficient(method: CorrelationMethod, x: &[f64], y: &[f64]) -> f64 {
    match method {
        CorrelationMethod::Pearson => pearson(x, y),
        CorrelationMethod::Kendall => kendall_tau_b(x, y),
        CorrelationMethod::Spearman => spearman(x, y),
    }
}

/// Square matrix of pairwise correlations indexed by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub method: CorrelationMethod,
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

impl CorrelationMatrix {
    pub fn dim(&self) -> usize {
        self.names.len()
    }

    pub fn get(&self, row: &str, col: &str) -> Result<f64> {
        let r = self.index_of(row)?;
        let c = self.index_of(col)?;
        Ok(self.values[(r, c)])
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| HeartPredictError::ColumnNotFound(name.to_string()))
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = self
            .names
            .iter()
            .map(|n| n.len())
            .max()
            .unwrap_or(0)
            .max(6);
        write!(f, "{:width$}", "", width = width)?;
        for name in &self.names {
            write!(f, " {:>width$}", name, width = width)?;
        }
        writeln!(f)?;
        for (r, name) in self.names.iter().enumerate() {
            write!(f, "{:width$}", name, width = width)?;
            for c in 0..self.dim() {
                write!(f, " {:>width$.2}", self.values[(r, c)], width = width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Correlation statistics over one table.
///
/// Matrices are computed once per method and memoized for the lifetime of
/// the backend.
#[derive(Debug)]
pub struct CorrelationBackend {
    table: Table,
    matrices: [OnceCell<CorrelationMatrix>; 3],
}

impl CorrelationBackend {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            matrices: Default::default(),
        }
    }

    /// Correlation of `column` with the death event, unrounded.
    pub fn correlation_to_label(&self, column: &str, method: CorrelationMethod) -> Result<f64> {
        let label = self.table.column(LABEL_COLUMN)?;
        let values = self.table.column(column)?;
        let x = values.to_vec();
        let y = label.to_vec();
        let result = coefficient(method, &x, &y);
        log::debug!("{} correlation of {} with {}: {}", method, column, LABEL_COLUMN, result);
        Ok(result)
    }

    /// Pairwise correlation of all columns, rounded to two decimals.
    pub fn correlation_matrix(&self, method: CorrelationMethod) -> &CorrelationMatrix {
        let slot = match method {
            CorrelationMethod::Pearson => &self.matrices[0],
            CorrelationMethod::Kendall => &self.matrices[1],
            CorrelationMethod::Spearman => &self.matrices[2],
        };
        slot.get_or_init(|| compute_matrix(&self.table, method))
    }
}

fn compute_matrix(table: &Table, method: CorrelationMethod) -> CorrelationMatrix {
    let n = table.ncols();
    let columns: Vec<Vec<f64>> = (0..n)
        .map(|c| table.values().column(c).to_vec())
        .collect();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|r| ((r + 1)..n).map(move |c| (r, c)))
        .collect();

    log::debug!("Computing {} correlation matrix over {} columns", method, n);
    let upper: Vec<f64> = pairs
        .par_iter()
        .map(|&(r, c)| round_to(coefficient(method, &columns[r], &columns[c]), 2))
        .collect();

    let mut values = Array2::from_elem((n, n), 1.0);
    for (&(r, c), &v) in pairs.iter().zip(upper.iter()) {
        values[(r, c)] = v;
        values[(c, r)] = v;
    }

    CorrelationMatrix {
        method,
        names: table.column_names().to_vec(),
        values,
    }
}

/// Explicit cache of correlation backends keyed by table content.
///
/// Building a backend for a table whose content hash is already cached returns
/// the shared instance; entries live until invalidated or cleared.
#[derive(Debug, Default)]
pub struct CorrelationCache {
    entries: HashMap<u64, Rc<CorrelationBackend>>,
}

impl CorrelationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&mut self, table: &Table) -> Rc<CorrelationBackend> {
        let key = table.content_hash();
        self.entries
            .entry(key)
            .or_insert_with(|| {
                log::debug!("Creating correlation backend for table {:016x}", key);
                Rc::new(CorrelationBackend::new(table.clone()))
            })
            .clone()
    }

    /// Drop the cached backend for `table`; returns whether one was present.
    pub fn invalidate(&mut self, table: &Table) -> bool {
        self.entries.remove(&table.content_hash()).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
