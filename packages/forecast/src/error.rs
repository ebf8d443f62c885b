use thiserror::Error;

/// Structural misuse of the forecasting primitives.
///
/// Numerical trouble (singular systems, zero variance, empty folds) never
/// surfaces here; it is reported through diagnostics instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("training data is empty")]
    EmptyInput,
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
    #[error("invalid fold count {k} for {rows} rows")]
    InvalidFolds { k: usize, rows: usize },
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("model serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}
