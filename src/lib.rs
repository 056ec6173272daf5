//! # Rainfit workspace
//!
//! Umbrella crate re-exporting the workspace members:
//!
//! - [`fit_math`]: linear solver, curve fitting and accuracy metrics
//! - [`rain_forecast`]: features, model registry, recursive and classical forecasting
//! - [`rainfit`]: JSON request handlers and the `rainfit` command-line tool
//!
//! ## Example
//!
//! ```
//! use rainfit_workspace::fit_math::{perform_regression, RegressionKind, Sample};
//!
//! let samples: Vec<Sample> = (0..5)
//!     .map(|i| Sample::new(i as f64, 3.0 - i as f64).unwrap())
//!     .collect();
//! let fit = perform_regression(&samples, RegressionKind::Linear).unwrap();
//! assert_eq!(fit.formula, "y = 3.0000 - 1.0000x");
//! ```

pub use fit_math;
pub use rain_forecast;
pub use rainfit;

/// Versions of the member crates, in dependency order
pub fn member_versions() -> [(&'static str, &'static str); 2] {
    [
        (rain_forecast::NAME, rain_forecast::VERSION),
        (rainfit::NAME, rainfit::VERSION),
    ]
}
