use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the heartpredict library.
#[derive(Debug, Error)]
pub enum HeartPredictError {
    #[error("column not found: '{0}'")]
    ColumnNotFound(String),

    #[error("{source}: '{}'", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported relation '{0}', expected one of ==, <, >, <=, >=")]
    UnsupportedRelation(String),

    #[error("input table already contains the label column '{0}'")]
    LabelColumnPresent(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("failed to parse CSV data: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to (de)serialize artifact: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HeartPredictError {
    /// Wrap an I/O error raised while opening `path`, keeping not-found
    /// failures distinguishable from other I/O errors.
    pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            HeartPredictError::FileNotFound {
                path: path.into(),
                source: err,
            }
        } else {
            HeartPredictError::Io(err)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, HeartPredictError::FileNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, HeartPredictError>;
