//! Recursive multi-step forecasting
//!
//! Day `t+1` is predicted from the working history, the prediction is
//! appended, and day `t+2` is predicted from the extended history, up to the
//! requested horizon. Later steps therefore see earlier predictions as if
//! they had been observed.

use crate::data::{History, TimePoint};
use crate::error::{ForecastError, Result};
use crate::evaluator::ModelEvaluator;
use crate::features::MIN_HISTORY;
use crate::registry::ModelRegistry;
use crate::utils::round2;
use chrono::{Days, NaiveDate};

/// Shortest supported horizon in days
pub const MIN_HORIZON: usize = 1;

/// Longest supported horizon in days
pub const MAX_HORIZON: usize = 30;

/// Reject horizons outside `MIN_HORIZON..=MAX_HORIZON`
pub fn validate_horizon(horizon: usize) -> Result<()> {
    if (MIN_HORIZON..=MAX_HORIZON).contains(&horizon) {
        Ok(())
    } else {
        Err(ForecastError::InvalidHorizon { horizon })
    }
}

/// Working buffer owned by a single forecast call
struct ForecastState {
    values: Vec<f64>,
    last_date: NaiveDate,
}

impl ForecastState {
    fn new(history: History, horizon: usize) -> Self {
        let last_date = history.last_date();
        let mut values = Vec::with_capacity(history.len() + horizon);
        values.extend_from_slice(history.values());
        Self { values, last_date }
    }

    fn next_date(&self) -> Result<NaiveDate> {
        self.last_date.checked_add_days(Days::new(1)).ok_or_else(|| {
            ForecastError::ValidationError(format!("No calendar day after {}", self.last_date))
        })
    }

    /// Append the unrounded prediction so the next step builds on it
    fn push(&mut self, date: NaiveDate, value: f64) {
        self.values.push(value);
        self.last_date = date;
    }
}

/// Produces day-by-day forecasts with models from a registry
pub struct RecursiveForecaster<'a, E: ?Sized> {
    registry: &'a ModelRegistry,
    evaluator: &'a E,
}

impl<'a, E> RecursiveForecaster<'a, E>
where
    E: ModelEvaluator + ?Sized,
{
    pub fn new(registry: &'a ModelRegistry, evaluator: &'a E) -> Self {
        Self {
            registry,
            evaluator,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        self.registry
    }

    /// Forecast `horizon` consecutive days after the last historical date.
    ///
    /// Returns exactly `horizon` points with non-negative values rounded to
    /// two decimals. Any failing step aborts the whole call.
    pub fn forecast(
        &self,
        model_id: &str,
        history: &[TimePoint],
        horizon: usize,
    ) -> Result<Vec<TimePoint>> {
        self.forecast_with_progress(model_id, history, horizon, |_, _| {})
    }

    /// Like [`forecast`](Self::forecast), calling `on_progress(step, total)`
    /// after each completed step.
    pub fn forecast_with_progress<F>(
        &self,
        model_id: &str,
        history: &[TimePoint],
        horizon: usize,
        mut on_progress: F,
    ) -> Result<Vec<TimePoint>>
    where
        F: FnMut(usize, usize),
    {
        validate_horizon(horizon)?;
        self.registry.get(model_id)?;
        let history = History::prepare(history, MIN_HISTORY)?;

        let mut state = ForecastState::new(history, horizon);
        let mut predictions = Vec::with_capacity(horizon);

        for step in 1..=horizon {
            let target = state.next_date()?;
            let value = self
                .registry
                .evaluate(self.evaluator, model_id, &state.values, target)
                .map_err(|e| {
                    tracing::warn!(model = model_id, step, error = %e, "forecast step failed");
                    e
                })?;

            tracing::debug!(model = model_id, step, date = %target, value, "forecast step");
            state.push(target, value);
            predictions.push(TimePoint::new(target, round2(value)));
            on_progress(step, horizon);
        }

        Ok(predictions)
    }
}
