use thiserror::Error;

use crate::types::ContainerKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Predictions and labels must share a container kind, got predictions: {predictions}, labels: {labels}")]
    TypeMismatch {
        predictions: ContainerKind,
        labels: ContainerKind,
    },
    #[error("Unsupported container type: {0}, only sequences and numeric arrays are supported")]
    UnsupportedContainerType(ContainerKind),
    #[error("Accumulated {predictions} predictions but {labels} labels")]
    LengthMismatch { predictions: usize, labels: usize },
    #[error("No data accumulated, cannot compute a mean over zero examples")]
    NoDataAccumulated,
    #[error("Missing key: {0}")]
    MissingKey(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
    #[error("Metric already registered: {0}")]
    DuplicateMetric(String),
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parser error: {0}")]
    ParserError(String),
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::ParserError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
