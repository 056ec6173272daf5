//! # Rain Forecast
//!
//! Multi-day rainfall forecasting with interchangeable pretrained models and
//! a classical ARIMA-family model guarded by a fallback cascade.
//!
//! ## Features
//!
//! - Lag, rolling-window and calendar features from a daily history
//! - Fixed affine scaling of features and target
//! - A registry of tabular, sequence and ensemble models behind one evaluator seam
//! - Recursive forecasting up to 30 days, each step feeding the next
//! - Classical forecasting with zero-differencing and climatology fallbacks
//!
//! ## Quick Start
//!
//! ```rust
//! use rain_forecast::{ForecastConfig, RecursiveForecaster, Tensor, TimePoint};
//! use chrono::{Days, NaiveDate};
//!
//! let registry = ForecastConfig::default().into_registry()?;
//!
//! // Stand-in for a real model runtime
//! let evaluator = |_: &str, input: &Tensor| -> rain_forecast::Result<Vec<f64>> {
//!     Ok(vec![input.data()[0].abs()])
//! };
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let history: Vec<TimePoint> = (0..14)
//!     .map(|i| TimePoint::new(start + Days::new(i), (i % 3) as f64))
//!     .collect();
//!
//! let forecaster = RecursiveForecaster::new(&registry, &evaluator);
//! let predictions = forecaster.forecast("gbr", &history, 3)?;
//! assert_eq!(predictions.len(), 3);
//! # Ok::<(), rain_forecast::ForecastError>(())
//! ```

pub mod classical;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod forecaster;
pub mod models;
pub mod registry;
pub mod scaler;
pub mod utils;

// Re-export commonly used types
pub use crate::classical::{
    classical_forecast_with_dates, ArimaOrder, ClassicalModel, FallbackOutcome, FallbackPolicy,
    FallbackTier, OrderSpec,
};
pub use crate::config::ForecastConfig;
pub use crate::data::{DataLoader, History, TimePoint};
pub use crate::error::{ForecastError, Result};
pub use crate::evaluator::{ModelEvaluator, Tensor};
pub use crate::forecaster::{RecursiveForecaster, MAX_HORIZON, MIN_HORIZON};
pub use crate::models::ArimaModel;
pub use crate::registry::{ModelDescriptor, ModelKind, ModelRegistry};
pub use crate::scaler::ScalerParams;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
