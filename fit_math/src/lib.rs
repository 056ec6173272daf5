//! # Fit Math
//!
//! Numerical building blocks for curve fitting.
//! This crate provides a dense linear system solver, least-squares regression
//! (linear, polynomial and exponential) and the accuracy metrics reported with
//! every fit.

use thiserror::Error;

pub mod metrics;
pub mod regression;
pub mod solver;

pub use metrics::FitMetrics;
pub use regression::{perform_regression, RegressionKind, RegressionResult, Sample};
pub use solver::solve_linear_system;

/// Errors that can occur while fitting curves
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Singular system: pivot {pivot:e} in column {column} is numerically zero")]
    SingularSystem { column: usize, pivot: f64 },
}

/// Result type for fitting operations
pub type Result<T> = std::result::Result<T, MathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_error_names_the_column() {
        let err = MathError::SingularSystem {
            column: 2,
            pivot: 0.0,
        };
        assert!(err.to_string().contains("column 2"));
    }
}
