//! Error types for the tabula workflow

use thiserror::Error;

/// Result type alias for tabula operations
pub type Result<T> = std::result::Result<T, TabulaError>;

/// Main error type
#[derive(Error, Debug)]
pub enum TabulaError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Column not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid state: cannot {action} while {state}")]
    InvalidState { action: String, state: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<polars::error::PolarsError> for TabulaError {
    fn from(err: polars::error::PolarsError) -> Self {
        TabulaError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TabulaError {
    fn from(err: serde_json::Error) -> Self {
        TabulaError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TabulaError {
    fn from(err: ndarray::ShapeError) -> Self {
        TabulaError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TabulaError::DataError("empty table".to_string());
        assert_eq!(err.to_string(), "Data error: empty table");
    }

    #[test]
    fn test_invalid_state_display() {
        let err = TabulaError::InvalidState {
            action: "train".to_string(),
            state: "Idle".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid state: cannot train while Idle");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TabulaError = io_err.into();
        assert!(matches!(err, TabulaError::IoError(_)));
    }
}
