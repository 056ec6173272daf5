//! Classical-model forecasting with a fallback cascade
//!
//! Sparse rainfall series often make differenced ARIMA models predict a flat
//! line at zero. [`FallbackPolicy`] runs an ordered list of tiers and keeps
//! the first one whose output is not degenerate.

use crate::data::{History, TimePoint};
use crate::error::{ForecastError, Result};
use crate::forecaster::validate_horizon;
use crate::utils::{future_dates, round2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum history length for a classical fit
pub const MIN_CLASSICAL_HISTORY: usize = 10;

/// Outputs whose absolute values sum below this are degenerate
pub const DEGENERATE_THRESHOLD: f64 = 0.1;

/// Seasonal part of an order: `(P, D, Q)` with period `s`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

/// `(p, d, q)` order with an optional seasonal component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonal: Option<SeasonalOrder>,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            seasonal: None,
        }
    }

    pub fn with_seasonal(mut self, p: usize, d: usize, q: usize, period: usize) -> Self {
        self.seasonal = Some(SeasonalOrder { p, d, q, period });
        self
    }

    /// Same order with regular and seasonal differencing removed
    pub fn without_differencing(mut self) -> Self {
        self.d = 0;
        if let Some(seasonal) = self.seasonal.as_mut() {
            seasonal.d = 0;
        }
        self
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seasonal {
            Some(s) => write!(
                f,
                "SARIMA({},{},{})({},{},{})[{}]",
                self.p, self.d, self.q, s.p, s.d, s.q, s.period
            ),
            None => write!(f, "ARIMA({},{},{})", self.p, self.d, self.q),
        }
    }
}

/// Caller's choice of order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OrderSpec {
    /// Let the model select its own order
    Auto,
    Manual(ArimaOrder),
}

/// Preset names accepted by [`OrderSpec::preset`]
pub const PRESET_NAMES: [&str; 5] = [
    "arima_111",
    "arima_211",
    "arima_112",
    "sarima_weekly",
    "auto",
];

impl OrderSpec {
    /// Look up a named preset
    pub fn preset(name: &str) -> Result<Self> {
        let spec = match name {
            "arima_111" => OrderSpec::Manual(ArimaOrder::new(1, 1, 1)),
            "arima_211" => OrderSpec::Manual(ArimaOrder::new(2, 1, 1)),
            "arima_112" => OrderSpec::Manual(ArimaOrder::new(1, 1, 2)),
            "sarima_weekly" => {
                OrderSpec::Manual(ArimaOrder::new(1, 1, 1).with_seasonal(1, 1, 1, 7))
            }
            "auto" => OrderSpec::Auto,
            other => {
                return Err(ForecastError::ValidationError(format!(
                    "Unknown ARIMA preset '{}', expected one of: {}",
                    other,
                    PRESET_NAMES.join(", ")
                )))
            }
        };
        Ok(spec)
    }

    /// Order used by the zero-differencing tier
    pub fn zero_differencing(&self) -> Self {
        match self {
            OrderSpec::Auto => OrderSpec::Manual(ArimaOrder::new(1, 0, 0)),
            OrderSpec::Manual(order) => OrderSpec::Manual(order.without_differencing()),
        }
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSpec::Auto => write!(f, "auto"),
            OrderSpec::Manual(order) => order.fmt(f),
        }
    }
}

/// An opaque fit-and-predict statistical model
pub trait ClassicalModel {
    /// Fit on `history` and return `horizon` predictions
    fn fit_predict(&self, history: &[f64], order: &OrderSpec, horizon: usize) -> Result<Vec<f64>>;
}

impl<F> ClassicalModel for F
where
    F: Fn(&[f64], &OrderSpec, usize) -> Result<Vec<f64>>,
{
    fn fit_predict(&self, history: &[f64], order: &OrderSpec, horizon: usize) -> Result<Vec<f64>> {
        self(history, order, horizon)
    }
}

/// Whether a prediction sequence is effectively all zeros
pub fn is_degenerate(predictions: &[f64]) -> bool {
    predictions.iter().map(|v| v.abs()).sum::<f64>() < DEGENERATE_THRESHOLD
}

/// Mean of the strictly positive values, 0 when there are none
pub fn climatology(history: &[f64]) -> f64 {
    let (sum, count) = history
        .iter()
        .filter(|&&v| v > 0.0)
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// One strategy in the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    /// The caller's order, or automatic selection
    Requested,
    /// The caller's order with differencing forced to zero
    ZeroDifferencing,
    /// Historical mean of the rainy days
    Climatology,
}

impl FallbackTier {
    /// Run this tier. Model failures, wrong-length outputs and non-finite
    /// values become `None`.
    fn attempt<M>(
        &self,
        model: &M,
        history: &[f64],
        order: &OrderSpec,
        horizon: usize,
    ) -> Option<Vec<f64>>
    where
        M: ClassicalModel + ?Sized,
    {
        let order = match self {
            FallbackTier::Requested => *order,
            FallbackTier::ZeroDifferencing => order.zero_differencing(),
            FallbackTier::Climatology => return Some(vec![climatology(history); horizon]),
        };

        match model.fit_predict(history, &order, horizon) {
            Ok(predictions) if predictions.len() != horizon => {
                tracing::warn!(
                    tier = ?self,
                    %order,
                    expected = horizon,
                    actual = predictions.len(),
                    "classical model returned the wrong number of predictions"
                );
                None
            }
            Ok(predictions) if predictions.iter().any(|v| !v.is_finite()) => {
                tracing::warn!(
                    tier = ?self,
                    %order,
                    "classical model returned non-finite values"
                );
                None
            }
            Ok(predictions) => Some(predictions),
            Err(e) => {
                tracing::warn!(tier = ?self, %order, error = %e, "classical model failed");
                None
            }
        }
    }
}

/// Which tier produced the final predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackOutcome {
    pub predictions: Vec<f64>,
    pub tier: FallbackTier,
}

/// Ordered cascade of tiers sharing [`is_degenerate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    tiers: Vec<FallbackTier>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            tiers: vec![
                FallbackTier::Requested,
                FallbackTier::ZeroDifferencing,
                FallbackTier::Climatology,
            ],
        }
    }
}

impl FallbackPolicy {
    /// A custom cascade. It must end with `Climatology` so that it always
    /// terminates with an answer.
    pub fn new(tiers: Vec<FallbackTier>) -> Result<Self> {
        if tiers.last() != Some(&FallbackTier::Climatology) {
            return Err(ForecastError::ConfigError(
                "Fallback cascade must end with the climatology tier".to_string(),
            ));
        }
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[FallbackTier] {
        &self.tiers
    }

    /// Run the cascade on a clamped, ordered series of at least
    /// [`MIN_CLASSICAL_HISTORY`] values.
    pub fn run<M>(
        &self,
        model: &M,
        history: &[f64],
        order: &OrderSpec,
        horizon: usize,
    ) -> Result<FallbackOutcome>
    where
        M: ClassicalModel + ?Sized,
    {
        if history.len() < MIN_CLASSICAL_HISTORY {
            return Err(ForecastError::InsufficientHistory {
                required: MIN_CLASSICAL_HISTORY,
                actual: history.len(),
            });
        }

        for &tier in &self.tiers {
            let Some(predictions) = tier.attempt(model, history, order, horizon) else {
                continue;
            };
            if tier == FallbackTier::Climatology || !is_degenerate(&predictions) {
                tracing::debug!(?tier, %order, horizon, "classical forecast accepted");
                return Ok(Self::finish(predictions, tier));
            }
            tracing::warn!(?tier, %order, "degenerate classical forecast, trying next tier");
        }

        Ok(Self::finish(
            vec![climatology(history); horizon],
            FallbackTier::Climatology,
        ))
    }

    fn finish(predictions: Vec<f64>, tier: FallbackTier) -> FallbackOutcome {
        FallbackOutcome {
            predictions: predictions.into_iter().map(|v| v.max(0.0)).collect(),
            tier,
        }
    }
}

/// Forecast a dated series with the default cascade.
///
/// The series is prepared like the recursive forecaster's input (sorted,
/// deduplicated, clamped) and the result carries consecutive dates with
/// values rounded to two decimals.
pub fn classical_forecast_with_dates<M>(
    model: &M,
    history: &[TimePoint],
    horizon: usize,
    order: &OrderSpec,
) -> Result<(Vec<TimePoint>, FallbackTier)>
where
    M: ClassicalModel + ?Sized,
{
    validate_horizon(horizon)?;
    let history = History::prepare(history, MIN_CLASSICAL_HISTORY)?;
    let outcome = FallbackPolicy::default().run(model, history.values(), order, horizon)?;
    let dates = future_dates(history.last_date(), horizon)?;

    let points = dates
        .into_iter()
        .zip(outcome.predictions)
        .map(|(date, value)| TimePoint::new(date, round2(value)))
        .collect();
    Ok((points, outcome.tier))
}
