//! Error types for the neurocog pipeline

use thiserror::Error;

/// Result type alias for neurocog operations
pub type Result<T> = std::result::Result<T, NeurocogError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum NeurocogError {
    /// Missing required columns or empty input
    #[error("Data validation error: {0}")]
    ValidationError(String),

    /// Cleaning or transform fit/apply failure
    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    /// Classifier fit or evaluation failure
    #[error("Training error: {0}")]
    TrainingError(String),

    /// Missing persisted artifact or unknown model name
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Any failure surfaced while serving a prediction
    #[error("Prediction error: {0}")]
    PredictionError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl NeurocogError {
    /// Re-raise as a training failure, keeping the original message.
    pub fn into_training(self) -> Self {
        match self {
            NeurocogError::TrainingError(_) | NeurocogError::ModelNotFound(_) => self,
            other => NeurocogError::TrainingError(other.to_string()),
        }
    }

    /// Re-raise as a prediction failure, keeping the original message.
    pub fn into_prediction(self) -> Self {
        match self {
            NeurocogError::PredictionError(_) | NeurocogError::ModelNotFound(_) => self,
            other => NeurocogError::PredictionError(other.to_string()),
        }
    }

    /// Wrap any non-preprocessing error raised during cleaning or transform.
    pub(crate) fn into_preprocessing(self) -> Self {
        match self {
            NeurocogError::PreprocessingError(_) | NeurocogError::ValidationError(_) => self,
            other => NeurocogError::PreprocessingError(other.to_string()),
        }
    }
}

impl From<polars::error::PolarsError> for NeurocogError {
    fn from(err: polars::error::PolarsError) -> Self {
        NeurocogError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for NeurocogError {
    fn from(err: serde_json::Error) -> Self {
        NeurocogError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for NeurocogError {
    fn from(err: bincode::Error) -> Self {
        NeurocogError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for NeurocogError {
    fn from(err: ndarray::ShapeError) -> Self {
        NeurocogError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
