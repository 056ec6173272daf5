//! Utility functions for the rain_forecast crate

use crate::data::TimePoint;
use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Gamma};

/// Round to two decimals for presentation
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The `horizon` calendar days following `last`
pub fn future_dates(last: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    (1..=horizon as u64)
        .map(|offset| {
            last.checked_add_days(Days::new(offset)).ok_or_else(|| {
                ForecastError::ValidationError(format!(
                    "Date overflow {} days after {}",
                    offset, last
                ))
            })
        })
        .collect()
}

/// Generate a synthetic daily rainfall series for demos and tests
///
/// # Arguments
/// * `num_days` - Number of consecutive days to generate
/// * `start` - Date of the first observation
/// * `wet_probability` - Chance that any given day has rain (0.0-1.0)
/// * `mean_wet_amount` - Average rainfall on a wet day
/// * `seed` - Seed for a reproducible series
///
/// Wet-day amounts follow a gamma distribution with shape 0.8, which gives
/// the long right tail typical of daily rainfall.
pub fn generate_rainfall(
    num_days: usize,
    start: NaiveDate,
    wet_probability: f64,
    mean_wet_amount: f64,
    seed: u64,
) -> Result<Vec<TimePoint>> {
    if !(0.0..=1.0).contains(&wet_probability) {
        return Err(ForecastError::ValidationError(format!(
            "Wet-day probability must be within [0, 1], got {}",
            wet_probability
        )));
    }

    const SHAPE: f64 = 0.8;
    let amount = Gamma::new(SHAPE, mean_wet_amount / SHAPE).map_err(|e| {
        ForecastError::ValidationError(format!("Invalid rainfall amount: {}", e))
    })?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut dates = vec![start];
    dates.extend(future_dates(start, num_days.saturating_sub(1))?);

    Ok(dates
        .into_iter()
        .take(num_days)
        .map(|date| {
            let value = if rng.gen::<f64>() < wet_probability {
                round2(amount.sample(&mut rng))
            } else {
                0.0
            };
            TimePoint::new(date, value)
        })
        .collect())
}
