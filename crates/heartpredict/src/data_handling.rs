//! Data structures and helpers for loading and splitting the clinical records.
//!
//! This module defines the dataset's closed column set, the column-named
//! `Table`, the seeded train/validation split and the scaled feature
//! matrices consumed by the models.
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{HeartPredictError, Result};
use crate::preprocessing::{fit_scaler, Scaler};

/// Name of the binary label column.
pub const LABEL_COLUMN: &str = "DEATH_EVENT";
/// Name of the follow-up duration column.
pub const TIME_COLUMN: &str = "time";
/// Default location of the clinical records relative to the working directory.
pub const DEFAULT_CSV: &str = "data/heart_failure_clinical_records.csv";

/// Columns of the heart-failure clinical records dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Age,
    Anaemia,
    CreatininePhosphokinase,
    Diabetes,
    EjectionFraction,
    HighBloodPressure,
    Platelets,
    SerumCreatinine,
    SerumSodium,
    Sex,
    Smoking,
    Time,
    DeathEvent,
}

impl Column {
    pub const ALL: [Column; 13] = [
        Column::Age,
        Column::Anaemia,
        Column::CreatininePhosphokinase,
        Column::Diabetes,
        Column::EjectionFraction,
        Column::HighBloodPressure,
        Column::Platelets,
        Column::SerumCreatinine,
        Column::SerumSodium,
        Column::Sex,
        Column::Smoking,
        Column::Time,
        Column::DeathEvent,
    ];

    pub const BOOLEAN: [Column; 6] = [
        Column::Anaemia,
        Column::Diabetes,
        Column::HighBloodPressure,
        Column::Sex,
        Column::Smoking,
        Column::DeathEvent,
    ];

    pub const DISCRETE: [Column; 7] = [
        Column::Age,
        Column::CreatininePhosphokinase,
        Column::EjectionFraction,
        Column::Platelets,
        Column::SerumCreatinine,
        Column::SerumSodium,
        Column::Time,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Age => "age",
            Column::Anaemia => "anaemia",
            Column::CreatininePhosphokinase => "creatinine_phosphokinase",
            Column::Diabetes => "diabetes",
            Column::EjectionFraction => "ejection_fraction",
            Column::HighBloodPressure => "high_blood_pressure",
            Column::Platelets => "platelets",
            Column::SerumCreatinine => "serum_creatinine",
            Column::SerumSodium => "serum_sodium",
            Column::Sex => "sex",
            Column::Smoking => "smoking",
            Column::Time => TIME_COLUMN,
            Column::DeathEvent => LABEL_COLUMN,
        }
    }

    pub fn is_boolean(&self) -> bool {
        Column::BOOLEAN.contains(self)
    }

    /// Human readable meaning of the `0` and `1` values of a boolean column.
    pub fn binary_meaning(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Column::Anaemia => Some(("No anaemia", "anaemia")),
            Column::Diabetes => Some(("No diabetes", "diabetes")),
            Column::HighBloodPressure => Some(("Normal blood pressure", "High blood pressure")),
            Column::Sex => Some(("Female", "Male")),
            Column::Smoking => Some(("Not smoking", "Is smoking")),
            Column::DeathEvent => Some(("Survived", "Died")),
            _ => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = HeartPredictError;

    fn from_str(s: &str) -> Result<Self> {
        Column::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| HeartPredictError::ColumnNotFound(s.to_string()))
    }
}

/// In-memory numeric table with named columns; rows are samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl Table {
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(HeartPredictError::InvalidInput(format!(
                "{} column names for {} columns",
                columns.len(),
                values.ncols()
            )));
        }
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(HeartPredictError::InvalidInput(format!(
                    "duplicate column '{}'",
                    name
                )));
            }
        }
        Ok(Self { columns, values })
    }

    /// Build a table from `(name, values)` pairs of equal length.
    pub fn from_columns(columns: Vec<(&str, Vec<f64>)>) -> Result<Self> {
        let nrows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut values = Array2::zeros((nrows, columns.len()));
        let mut names = Vec::with_capacity(columns.len());
        for (c, (name, data)) in columns.into_iter().enumerate() {
            if data.len() != nrows {
                return Err(HeartPredictError::InvalidInput(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    data.len(),
                    nrows
                )));
            }
            values.column_mut(c).assign(&Array1::from_vec(data));
            names.push(name.to_string());
        }
        Table::new(names, values)
    }

    /// Read a comma separated file with a header row. Every field must be numeric.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| HeartPredictError::from_io(path, e))?;
        log::debug!("Reading table from {}", path.display());
        Table::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut data = Vec::new();
        let mut nrows = 0;
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            for (c, field) in record.iter().enumerate() {
                let value = field.parse::<f64>().map_err(|_| {
                    HeartPredictError::InvalidInput(format!(
                        "non-numeric value '{}' in column '{}' at row {}",
                        field,
                        columns.get(c).map(String::as_str).unwrap_or("?"),
                        row + 1
                    ))
                })?;
                data.push(value);
            }
            nrows += 1;
        }

        let values = Array2::from_shape_vec((nrows, columns.len()), data)
            .map_err(|e| HeartPredictError::InvalidInput(e.to_string()))?;
        Table::new(columns, values)
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| HeartPredictError::ColumnNotFound(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<ArrayView1<f64>> {
        let idx = self.column_index(name)?;
        Ok(self.values.column(idx))
    }

    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), indices),
        }
    }

    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|n| self.column_index(n.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            columns: names.iter().map(|n| n.as_ref().to_string()).collect(),
            values: self.values.select(Axis(1), &indices),
        })
    }

    /// Keep the rows whose mask entry is `true`.
    pub fn mask(&self, mask: &[bool]) -> Result<Table> {
        if mask.len() != self.nrows() {
            return Err(HeartPredictError::InvalidInput(format!(
                "mask of length {} for {} rows",
                mask.len(),
                self.nrows()
            )));
        }
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect();
        Ok(self.select_rows(&indices))
    }

    pub fn drop_column(&self, name: &str) -> Result<Table> {
        let idx = self.column_index(name)?;
        let keep: Vec<usize> = (0..self.ncols()).filter(|&c| c != idx).collect();
        Ok(Table {
            columns: keep.iter().map(|&c| self.columns[c].clone()).collect(),
            values: self.values.select(Axis(1), &keep),
        })
    }

    /// Stable hash over column names, shape and the bit pattern of every value.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.columns.hash(&mut hasher);
        self.values.dim().hash(&mut hasher);
        for v in self.values.iter() {
            v.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// The full clinical records table, validated against the dataset's columns.
#[derive(Debug, Clone)]
pub struct ProjectData {
    pub path: PathBuf,
    pub table: Table,
}

impl ProjectData {
    pub fn build<P: AsRef<Path>>(path: P) -> Result<Self> {
        let table = Table::from_csv(&path)?;
        let project = ProjectData::from_table(path.as_ref(), table)?;
        log::info!(
            "Loaded {} records with {} columns from {}",
            project.table.nrows(),
            project.table.ncols(),
            project.path.display()
        );
        Ok(project)
    }

    pub fn from_table(path: impl Into<PathBuf>, table: Table) -> Result<Self> {
        for column in Column::ALL {
            table.column_index(column.as_str())?;
        }
        Ok(Self {
            path: path.into(),
            table,
        })
    }
}

/// Deterministic seeded train/validation partition of `n` row indices.
///
/// Returns `(train, valid)`; the validation part holds `ceil(n * test_size)` rows.
pub fn train_valid_indices(n: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(HeartPredictError::InvalidInput(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    let n_valid = (n as f64 * test_size).ceil() as usize;
    if n_valid == 0 || n_valid >= n {
        return Err(HeartPredictError::InvalidInput(format!(
            "cannot split {} rows with test_size {}",
            n, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_valid);
    Ok((train, indices))
}

/// One side of the split: scaled features, labels and the raw rows.
#[derive(Debug, Clone)]
pub struct SplitData {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub table: Table,
}

/// Train and validation data ready for model training.
#[derive(Debug, Clone)]
pub struct MlData {
    pub train: SplitData,
    pub valid: SplitData,
    pub scaler: Scaler,
    pub feature_names: Vec<String>,
    pub random_seed: u64,
}

impl MlData {
    pub fn build(project_data: &ProjectData, test_size: f64, random_seed: u64) -> Result<Self> {
        MlData::from_table(&project_data.table, LABEL_COLUMN, test_size, random_seed)
    }

    /// Split `table`, fit the scaler on the training rows and scale both sides.
    pub fn from_table(table: &Table, label: &str, test_size: f64, random_seed: u64) -> Result<Self> {
        let features = table.drop_column(label)?;
        let feature_names = features.column_names().to_vec();
        let labels = table.column(label)?.to_owned();

        let (train_idx, valid_idx) = train_valid_indices(table.nrows(), test_size, random_seed)?;
        log::debug!(
            "Split {} rows into {} training and {} validation rows (seed {})",
            table.nrows(),
            train_idx.len(),
            valid_idx.len(),
            random_seed
        );

        let x_train_raw = features.values().select(Axis(0), &train_idx);
        let x_valid_raw = features.values().select(Axis(0), &valid_idx);
        let scaler = fit_scaler(&x_train_raw, &feature_names)?;

        Ok(Self {
            train: SplitData {
                x: scaler.transform(&x_train_raw)?,
                y: labels.select(Axis(0), &train_idx),
                table: table.select_rows(&train_idx),
            },
            valid: SplitData {
                x: scaler.transform(&x_valid_raw)?,
                y: labels.select(Axis(0), &valid_idx),
                table: table.select_rows(&valid_idx),
            },
            scaler,
            feature_names,
            random_seed,
        })
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Inference-time features: a label-free table transformed with a fitted scaler.
#[derive(Debug, Clone)]
pub struct FeatureData {
    pub table: Table,
    pub feature_matrix: Array2<f64>,
}

impl FeatureData {
    pub fn build(table: &Table, scaler: &Scaler) -> Result<Self> {
        if table.has_column(LABEL_COLUMN) {
            return Err(HeartPredictError::LabelColumnPresent(LABEL_COLUMN.to_string()));
        }
        let ordered = table.select_columns(&scaler.feature_names)?;
        let feature_matrix = scaler.transform(ordered.values())?;
        Ok(Self {
            table: table.clone(),
            feature_matrix,
        })
    }
}
