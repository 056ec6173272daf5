//! # Rainfit
//!
//! Front end for the rainfall forecasting and curve fitting crates.
//!
//! The [`api`] module turns JSON request bodies into validated calls on
//! [`rain_forecast`] and [`fit_math`], reporting the first violated constraint
//! as an [`ApiError`]. The `rainfit` binary exposes the same functionality on
//! the command line.
//!
//! ## Example
//!
//! ```
//! let body = r#"{"data": [{"x": 0, "y": 1}, {"x": 1, "y": 3}], "type": "linear"}"#;
//! let result = rainfit::api::handle_regression(body).unwrap();
//! assert_eq!(result.formula, "y = 1.0000 + 2.0000x");
//! ```

pub mod api;
pub mod error;

pub use crate::api::{
    describe_models, handle_predict, handle_regression, ModelCatalogue, PredictResponse,
};
pub use crate::error::ApiError;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
