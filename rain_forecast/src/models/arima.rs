//! Reference ARIMA-family model
//!
//! A deliberately small estimator: regular and seasonal differencing, an
//! autoregression on the differenced series fitted by least squares, and
//! integration back to levels. Moving-average terms are accepted in the
//! order but not estimated.

use crate::classical::{ArimaOrder, ClassicalModel, OrderSpec};
use crate::error::{ForecastError, Result};
use fit_math::solve_linear_system;
use std::collections::BTreeSet;

/// Candidate orders tried by automatic selection
const AUTO_CANDIDATES: [(usize, usize, usize); 6] =
    [(0, 0, 0), (1, 0, 0), (2, 0, 0), (0, 1, 0), (1, 1, 0), (2, 1, 0)];

/// ARIMA model estimator
#[derive(Debug, Clone)]
pub struct ArimaModel {
    candidates: Vec<ArimaOrder>,
}

impl Default for ArimaModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ArimaModel {
    pub fn new() -> Self {
        Self {
            candidates: AUTO_CANDIDATES
                .iter()
                .map(|&(p, d, q)| ArimaOrder::new(p, d, q))
                .collect(),
        }
    }

    /// Replace the orders considered by automatic selection
    pub fn with_candidates(candidates: Vec<ArimaOrder>) -> Self {
        Self { candidates }
    }

    /// Fit a specific order
    pub fn fit(&self, history: &[f64], order: &ArimaOrder) -> Result<TrainedArimaModel> {
        if let Some(index) = history.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::ValidationError(format!(
                "Value at index {} is not a finite number",
                index
            )));
        }

        let lags = Self::differencing_lags(order)?;
        let mut levels = vec![history.to_vec()];
        for &lag in &lags {
            let last = &levels[levels.len() - 1];
            if last.len() <= lag {
                return Err(Self::too_short(order, history.len()));
            }
            let next = difference(last, lag);
            levels.push(next);
        }
        let series = &levels[levels.len() - 1];

        let ar_lags = Self::ar_lags(order);
        let max_lag = ar_lags.last().copied().unwrap_or(0);
        let params = ar_lags.len() + 1;
        if series.len() < max_lag + params {
            return Err(Self::too_short(order, history.len()));
        }

        let rows: Vec<Vec<f64>> = (max_lag..series.len())
            .map(|t| {
                std::iter::once(1.0)
                    .chain(ar_lags.iter().map(|&lag| series[t - lag]))
                    .collect()
            })
            .collect();
        let targets = &series[max_lag..];

        let mut xtx = vec![vec![0.0; params]; params];
        let mut xty = vec![0.0; params];
        for (row, &y) in rows.iter().zip(targets) {
            for i in 0..params {
                xty[i] += row[i] * y;
                for j in 0..params {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }
        let coefficients = solve_linear_system(&xtx, &xty)?;

        let residual_variance = rows
            .iter()
            .zip(targets)
            .map(|(row, &y)| {
                let fitted: f64 = row.iter().zip(&coefficients).map(|(x, c)| x * c).sum();
                (y - fitted).powi(2)
            })
            .sum::<f64>()
            / targets.len() as f64;

        if order.q > 0 || order.seasonal.map_or(false, |s| s.q > 0) {
            tracing::debug!(%order, "moving-average terms are not estimated");
        }

        Ok(TrainedArimaModel {
            order: *order,
            intercept: coefficients[0],
            ar_lags,
            ar_coefficients: coefficients[1..].to_vec(),
            residual_variance,
            differencing: lags,
            levels,
        })
    }

    /// Fit every candidate and keep the one with the lowest residual variance.
    ///
    /// Candidates that cannot be fitted are skipped.
    pub fn select_order(&self, history: &[f64]) -> Result<TrainedArimaModel> {
        let mut best: Option<TrainedArimaModel> = None;
        for order in &self.candidates {
            match self.fit(history, order) {
                Ok(model) => {
                    tracing::trace!(%order, variance = model.residual_variance, "auto candidate");
                    let better = best
                        .as_ref()
                        .map_or(true, |b| model.residual_variance < b.residual_variance);
                    if better {
                        best = Some(model);
                    }
                }
                Err(e) => tracing::trace!(%order, error = %e, "auto candidate skipped"),
            }
        }

        let best = best.ok_or_else(|| {
            ForecastError::ModelError("No candidate ARIMA order could be fitted".to_string())
        })?;
        tracing::debug!(order = %best.order, "auto-selected ARIMA order");
        Ok(best)
    }

    /// Seasonal differences first, then regular ones
    fn differencing_lags(order: &ArimaOrder) -> Result<Vec<usize>> {
        let mut lags = Vec::new();
        if let Some(seasonal) = order.seasonal {
            if seasonal.period == 0 {
                return Err(ForecastError::ModelError(format!(
                    "{} has a zero seasonal period",
                    order
                )));
            }
            lags.extend(std::iter::repeat(seasonal.period).take(seasonal.d));
        }
        lags.extend(std::iter::repeat(1).take(order.d));
        Ok(lags)
    }

    /// Regular lags `1..=p` merged with seasonal lags `s, 2s, ..., Ps`
    fn ar_lags(order: &ArimaOrder) -> Vec<usize> {
        let mut lags: BTreeSet<usize> = (1..=order.p).collect();
        if let Some(seasonal) = order.seasonal {
            lags.extend((1..=seasonal.p).map(|k| k * seasonal.period));
        }
        lags.into_iter().collect()
    }

    fn too_short(order: &ArimaOrder, len: usize) -> ForecastError {
        ForecastError::ModelError(format!(
            "Not enough observations for {}: got {}",
            order, len
        ))
    }
}

impl ClassicalModel for ArimaModel {
    fn fit_predict(&self, history: &[f64], order: &OrderSpec, horizon: usize) -> Result<Vec<f64>> {
        let trained = match order {
            OrderSpec::Auto => self.select_order(history)?,
            OrderSpec::Manual(order) => self.fit(history, order)?,
        };
        Ok(trained.forecast(horizon))
    }
}

/// ARIMA model fitted to one series
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    order: ArimaOrder,
    intercept: f64,
    ar_lags: Vec<usize>,
    ar_coefficients: Vec<f64>,
    residual_variance: f64,
    /// Lag of each differencing step, in application order
    differencing: Vec<usize>,
    /// The series before each differencing step, plus the final one
    levels: Vec<Vec<f64>>,
}

impl TrainedArimaModel {
    pub fn order(&self) -> &ArimaOrder {
        &self.order
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// AR coefficients paired with their lags
    pub fn ar_terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.ar_lags
            .iter()
            .copied()
            .zip(self.ar_coefficients.iter().copied())
    }

    /// Mean squared one-step residual on the fitted series
    pub fn residual_variance(&self) -> f64 {
        self.residual_variance
    }

    /// Forecast `horizon` steps in original units
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        let series = &self.levels[self.levels.len() - 1];
        let mut extended = series.clone();
        for _ in 0..horizon {
            let next = self.intercept
                + self
                    .ar_terms()
                    .map(|(lag, phi)| phi * extended[extended.len() - lag])
                    .sum::<f64>();
            extended.push(next);
        }

        let mut forecast = extended[series.len()..].to_vec();
        for (level, &lag) in self.levels.iter().zip(&self.differencing).rev() {
            forecast = integrate(level, &forecast, lag);
        }
        forecast
    }
}

fn difference(series: &[f64], lag: usize) -> Vec<f64> {
    (lag..series.len()).map(|t| series[t] - series[t - lag]).collect()
}

/// Undo one differencing step for values following `base`
fn integrate(base: &[f64], differences: &[f64], lag: usize) -> Vec<f64> {
    let mut extended = base.to_vec();
    for &d in differences {
        let value = d + extended[extended.len() - lag];
        extended.push(value);
    }
    extended.split_off(base.len())
}
