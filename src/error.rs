use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unexpected species {0:?}")]
    UnknownSpecies(String),

    #[error("unexpected value {value:?} in column {column}")]
    InvalidValue { column: &'static str, value: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("feature {0} has zero variance")]
    ZeroVariance(usize),

    #[error("{0} matrix is singular")]
    Singular(&'static str),

    #[error("plotting failed: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, Error>;
