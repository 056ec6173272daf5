//! Error types for the rain_forecast crate

use thiserror::Error;

/// Custom error types for the rain_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Not enough history for the requested operation
    #[error("Insufficient history: need at least {required} data points, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    /// Horizon outside the supported range
    #[error("Invalid horizon: {horizon} (must be between 1 and 30 days)")]
    InvalidHorizon { horizon: usize },

    /// Model identifier not present in the registry
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Error related to input validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Invalid model or scaler configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Failure reported by, or malformed output from, the pretrained-model evaluator
    #[error("Evaluator error: {0}")]
    EvaluatorError(String),

    /// Failure inside a classical statistical model
    #[error("Model error: {0}")]
    ModelError(String),

    /// Error from the numerical layer
    #[error("Math error: {0}")]
    MathError(#[from] fit_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from CSV reading or writing
    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}
