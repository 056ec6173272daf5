//! Accuracy metrics for fitted curves

use serde::{Deserialize, Serialize};

/// Accuracy of a fit against the observed values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    /// Coefficient of determination, `None` when the fit is undefined
    pub r2: Option<f64>,
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

/// Compute R², MAE and RMSE for a fit.
///
/// `actual` and `predicted` must have the same non-zero length; the regression
/// engine guarantees this for every result it builds.
pub fn accuracy(actual: &[f64], predicted: &[f64]) -> FitMetrics {
    FitMetrics {
        r2: r_squared(actual, predicted),
        mae: mean_absolute_error(actual, predicted),
        rmse: root_mean_squared_error(actual, predicted),
    }
}

/// Mean absolute residual. Returns NaN for empty or mismatched input.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return f64::NAN;
    }

    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();

    sum / actual.len() as f64
}

/// Root mean squared residual. Returns NaN for empty or mismatched input.
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return f64::NAN;
    }

    (sum_squared_residuals(actual, predicted) / actual.len() as f64).sqrt()
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// Negative values are returned as-is: they mean the curve fits worse than
/// the mean of `actual`. When `actual` has zero total variance the ratio is
/// undefined; the fit counts as perfect (`Some(1.0)`) only if the residuals
/// are zero as well, otherwise `None` is returned. Both zero tests are
/// relative to the magnitude of `actual`, so tiny-valued series are judged
/// like any other.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_total: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_residual = sum_squared_residuals(actual, predicted);

    let tolerance = negligible_sum_of_squares(actual);

    if ss_total <= tolerance {
        return (ss_residual <= tolerance).then_some(1.0);
    }

    Some(1.0 - ss_residual / ss_total)
}

/// Largest sum of squared deviations that rounding alone can produce for
/// `values`. Centering n values costs up to `n·ε·|v|` per term.
pub(crate) fn negligible_sum_of_squares(values: &[f64]) -> f64 {
    let energy: f64 = values.iter().map(|v| v * v).sum();
    let noise = f64::EPSILON * values.len() as f64;
    noise * noise * energy
}

fn sum_squared_residuals(actual: &[f64], predicted: &[f64]) -> f64 {
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum()
}

impl std::fmt::Display for FitMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Fit Metrics:")?;
        match self.r2 {
            Some(r2) => writeln!(f, "  R²:    {:.4}", r2)?,
            None => writeln!(f, "  R²:    undefined")?,
        }
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        Ok(())
    }
}
