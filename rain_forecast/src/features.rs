//! Feature construction from a daily history
//!
//! Both builders are pure functions of the trailing seven observations. The
//! history is expected to be clamped and chronologically ordered already
//! (see [`crate::data::History`]).

use crate::error::{ForecastError, Result};
use crate::scaler::AffineScaler;
use chrono::{Datelike, NaiveDate};
use statrs::statistics::Statistics;

/// Minimum number of observations either builder accepts
pub const MIN_HISTORY: usize = 7;

/// Length of the tabular feature vector
pub const TABULAR_FEATURE_COUNT: usize = 9;

/// Length of the sequence window
pub const SEQUENCE_LENGTH: usize = 7;

/// Tabular feature names in vector order
pub const TABULAR_FEATURE_NAMES: [&str; TABULAR_FEATURE_COUNT] = [
    "lag_1",
    "lag_3",
    "lag_7",
    "roll_mean_3",
    "roll_mean_7",
    "roll_max_7",
    "roll_std_7",
    "month_idx",
    "day_of_week",
];

/// Engineered features for tabular models
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabularFeatures {
    pub lag1: f64,
    pub lag3: f64,
    pub lag7: f64,
    pub roll_mean3: f64,
    pub roll_mean7: f64,
    pub roll_max7: f64,
    pub roll_std7: f64,
    /// 1 = January ... 12 = December
    pub month_index: f64,
    /// 0 = Monday ... 6 = Sunday
    pub day_of_week_index: f64,
}

impl TabularFeatures {
    /// Features in the order the tabular models were trained on
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.lag1,
            self.lag3,
            self.lag7,
            self.roll_mean3,
            self.roll_mean7,
            self.roll_max7,
            self.roll_std7,
            self.month_index,
            self.day_of_week_index,
        ]
    }
}

/// Mean, max and population standard deviation of a trailing window
#[derive(Debug, Clone, Copy, PartialEq)]
struct RollingStats {
    mean: f64,
    max: f64,
    std: f64,
}

/// Stats over the last `window` values, left-padding with the earliest value
/// when the slice is shorter than the window.
fn rolling_stats(values: &[f64], window: usize) -> RollingStats {
    let padded: Vec<f64> = if values.len() < window {
        let fill = values.first().copied().unwrap_or(0.0);
        std::iter::repeat(fill)
            .take(window - values.len())
            .chain(values.iter().copied())
            .collect()
    } else {
        values[values.len() - window..].to_vec()
    };

    RollingStats {
        mean: Statistics::mean(&padded),
        max: Statistics::max(&padded),
        std: Statistics::population_std_dev(&padded),
    }
}

fn last_window(history: &[f64]) -> Result<&[f64]> {
    if history.len() < MIN_HISTORY {
        return Err(ForecastError::InsufficientHistory {
            required: MIN_HISTORY,
            actual: history.len(),
        });
    }
    Ok(&history[history.len() - MIN_HISTORY..])
}

/// Build the tabular features for predicting `target_date`.
///
/// Lags and rolling statistics come from the last seven values; calendar
/// features come from the target date.
pub fn tabular_features(history: &[f64], target_date: NaiveDate) -> Result<TabularFeatures> {
    let values = last_window(history)?;
    let n = values.len();

    let roll3 = rolling_stats(values, 3);
    let roll7 = rolling_stats(values, 7);

    Ok(TabularFeatures {
        lag1: values[n - 1],
        lag3: values[n - 3],
        lag7: values[0],
        roll_mean3: roll3.mean,
        roll_mean7: roll7.mean,
        roll_max7: roll7.max,
        roll_std7: roll7.std,
        month_index: f64::from(target_date.month()),
        day_of_week_index: f64::from(target_date.weekday().num_days_from_monday()),
    })
}

/// Build the sequence window: the last seven values, most recent last,
/// target-scaled when the consuming model expects it.
pub fn sequence_features(
    history: &[f64],
    target_scaler: Option<&AffineScaler>,
) -> Result<Vec<f64>> {
    let values = last_window(history)?;
    Ok(match target_scaler {
        Some(scaler) => values.iter().map(|&v| scaler.transform(v)).collect(),
        None => values.to_vec(),
    })
}
