//! Classical statistical models usable behind [`crate::classical::ClassicalModel`]

pub mod arima;

pub use arima::{ArimaModel, TrainedArimaModel};
