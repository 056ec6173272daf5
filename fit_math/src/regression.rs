//! Least-squares curve fitting
//!
//! Contains the three supported curve families:
//! - Linear: `y = a + bx`, closed form
//! - Polynomial: `y = c0 + c1·x + ... + cd·x^d`, normal equations
//! - Exponential: `y = a·e^(bx)`, log-linearised over positive samples
//!
//! Every fit returns a [`RegressionResult`] carrying the coefficients, a
//! display formula, the in-sample predictions and the accuracy metrics.

use crate::metrics::{accuracy, negligible_sum_of_squares};
use crate::solver::solve_linear_system;
use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Minimum number of enabled samples for any fit
pub const MIN_SAMPLES: usize = 2;

/// A single `(x, y)` observation.
///
/// Disabled samples stay in the caller's set but are never seen by a fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Sample {
    /// Create an enabled sample, rejecting non-finite coordinates
    pub fn new(x: f64, y: f64) -> Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Sample coordinates must be finite, got ({}, {})",
                x, y
            )));
        }
        Ok(Self {
            x,
            y,
            enabled: true,
        })
    }

    /// Same sample with the enabled flag cleared
    pub fn disabled(self) -> Self {
        Self {
            enabled: false,
            ..self
        }
    }
}

/// Curve family to fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegressionKind {
    Linear,
    Polynomial { degree: usize },
    Exponential,
}

impl RegressionKind {
    pub fn name(&self) -> &'static str {
        match self {
            RegressionKind::Linear => "linear",
            RegressionKind::Polynomial { .. } => "polynomial",
            RegressionKind::Exponential => "exponential",
        }
    }
}

/// Outcome of a curve fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    #[serde(flatten)]
    pub kind: RegressionKind,
    /// Human-readable formula, coefficients rounded to 4 decimals
    pub formula: String,
    /// `[a, b]` for linear and exponential, `[c0..=cd]` for polynomial
    pub coefficients: Vec<f64>,
    /// Coefficient of determination, `None` when undefined (constant target
    /// with non-zero residuals)
    pub r2: Option<f64>,
    pub mae: f64,
    pub rmse: f64,
    /// One prediction per enabled input sample, in input order
    pub predictions: Vec<f64>,
}

impl RegressionResult {
    /// Evaluate the fitted curve at `x`
    pub fn predict(&self, x: f64) -> f64 {
        match self.kind {
            RegressionKind::Linear => self.coefficients[0] + self.coefficients[1] * x,
            RegressionKind::Polynomial { .. } => horner(&self.coefficients, x),
            RegressionKind::Exponential => self.coefficients[0] * (self.coefficients[1] * x).exp(),
        }
    }

    fn build(
        kind: RegressionKind,
        formula: String,
        coefficients: Vec<f64>,
        actual: &[f64],
        predictions: Vec<f64>,
    ) -> Self {
        let metrics = accuracy(actual, &predictions);
        Self {
            kind,
            formula,
            coefficients,
            r2: metrics.r2,
            mae: metrics.mae,
            rmse: metrics.rmse,
            predictions,
        }
    }
}

/// Fit the requested curve family to the enabled samples
pub fn perform_regression(samples: &[Sample], kind: RegressionKind) -> Result<RegressionResult> {
    let result = match kind {
        RegressionKind::Linear => linear_regression(samples),
        RegressionKind::Polynomial { degree } => polynomial_regression(samples, degree),
        RegressionKind::Exponential => exponential_regression(samples),
    }?;

    tracing::debug!(
        kind = kind.name(),
        formula = %result.formula,
        r2 = ?result.r2,
        "regression fitted"
    );

    Ok(result)
}

/// Linear regression: `y = a + bx`
pub fn linear_regression(samples: &[Sample]) -> Result<RegressionResult> {
    let (xs, ys) = enabled_points(samples)?;
    let (a, b) = fit_line(&xs, &ys)?;

    let predictions = xs.iter().map(|x| a + b * x).collect();
    let formula = format!("y = {}{}", display(a), signed_term(b, "x"));

    Ok(RegressionResult::build(
        RegressionKind::Linear,
        formula,
        vec![a, b],
        &ys,
        predictions,
    ))
}

/// Polynomial regression of the given degree via the normal equations
/// `XᵗX·c = Xᵗy`
pub fn polynomial_regression(samples: &[Sample], degree: usize) -> Result<RegressionResult> {
    if degree == 0 {
        return Err(MathError::InvalidInput(
            "Polynomial degree must be at least 1".to_string(),
        ));
    }

    let (xs, ys) = enabled_points(samples)?;
    if xs.len() < degree + 1 {
        return Err(MathError::InsufficientData(format!(
            "At least {} data points are required for polynomial regression of degree {}",
            degree + 1,
            degree
        )));
    }

    // Fit on x mapped into [-1, 1] to keep XᵗX well conditioned, then
    // expand back to powers of x
    let center = xs.iter().sum::<f64>() / xs.len() as f64;
    let spread = xs.iter().map(|x| (x - center).abs()).fold(0.0, f64::max);
    let spread = if spread > 0.0 { spread } else { 1.0 };
    let ts: Vec<f64> = xs.iter().map(|x| (x - center) / spread).collect();

    let terms = degree + 1;
    let mut xtx = vec![vec![0.0; terms]; terms];
    let mut xty = vec![0.0; terms];
    for (&t, &y) in ts.iter().zip(&ys) {
        let powers: Vec<f64> = (0..terms).map(|i| t.powi(i as i32)).collect();
        for i in 0..terms {
            for j in 0..terms {
                xtx[i][j] += powers[i] * powers[j];
            }
            xty[i] += powers[i] * y;
        }
    }

    let centered = solve_linear_system(&xtx, &xty)?;
    let predictions = ts.iter().map(|&t| horner(&centered, t)).collect();
    let coefficients = expand_shifted(&centered, center, spread);

    let mut formula = format!("y = {}", display(coefficients[0]));
    for (i, &c) in coefficients.iter().enumerate().skip(1) {
        let suffix = if i == 1 {
            "x".to_string()
        } else {
            format!("x^{}", i)
        };
        formula.push_str(&signed_term(c, &suffix));
    }

    Ok(RegressionResult::build(
        RegressionKind::Polynomial { degree },
        formula,
        coefficients,
        &ys,
        predictions,
    ))
}

/// Exponential regression: `y = a·e^(bx)`.
///
/// Only samples with `y > 0` take part in the fit (`ln y` is undefined
/// otherwise), but predictions and metrics cover every enabled sample.
pub fn exponential_regression(samples: &[Sample]) -> Result<RegressionResult> {
    let (xs, ys) = enabled_points(samples)?;

    let (pos_x, ln_y): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(&ys)
        .filter(|(_, &y)| y > 0.0)
        .map(|(&x, &y)| (x, y.ln()))
        .unzip();

    if pos_x.len() < MIN_SAMPLES {
        return Err(MathError::InsufficientData(format!(
            "At least {} data points with positive y values are required for \
             exponential regression, got {}",
            MIN_SAMPLES,
            pos_x.len()
        )));
    }

    let (ln_a, b) = fit_line(&pos_x, &ln_y)?;
    let a = ln_a.exp();

    let predictions = xs.iter().map(|x| a * (b * x).exp()).collect();
    let formula = format!("y = {} × e^({}x)", display(a), display(b));

    Ok(RegressionResult::build(
        RegressionKind::Exponential,
        formula,
        vec![a, b],
        &ys,
        predictions,
    ))
}

fn horner(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Rewrite `Σ c_i·((x - center) / spread)^i` as `Σ a_i·x^i`
fn expand_shifted(centered: &[f64], center: f64, spread: f64) -> Vec<f64> {
    let shift = -center / spread;
    let scale = 1.0 / spread;

    let mut expanded = match centered.last() {
        Some(&top) => vec![top],
        None => return Vec::new(),
    };
    for &c in centered.iter().rev().skip(1) {
        let mut next = vec![0.0; expanded.len() + 1];
        for (k, &a) in expanded.iter().enumerate() {
            next[k] += a * shift;
            next[k + 1] += a * scale;
        }
        next[0] += c;
        expanded = next;
    }
    expanded
}

/// Enabled samples split into x and y columns
fn enabled_points(samples: &[Sample]) -> Result<(Vec<f64>, Vec<f64>)> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = samples
        .iter()
        .filter(|s| s.enabled)
        .map(|s| (s.x, s.y))
        .unzip();

    if xs.len() < MIN_SAMPLES {
        return Err(MathError::InsufficientData(format!(
            "At least {} data points are required for regression, got {}",
            MIN_SAMPLES,
            xs.len()
        )));
    }
    if xs.iter().chain(&ys).any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Sample coordinates must be finite".to_string(),
        ));
    }

    Ok((xs, ys))
}

/// Closed-form least squares line, returns `(intercept, slope)`
fn fit_line(xs: &[f64], ys: &[f64]) -> Result<(f64, f64)> {
    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        numerator += (x - x_mean) * (y - y_mean);
        denominator += (x - x_mean) * (x - x_mean);
    }

    if denominator <= negligible_sum_of_squares(xs) {
        return Err(MathError::CalculationError(
            "Cannot calculate slope: x values are too similar".to_string(),
        ));
    }

    let slope = numerator / denominator;
    Ok((y_mean - slope * x_mean, slope))
}

/// Four-decimal display value without a negative zero
fn display(value: f64) -> String {
    let s = format!("{:.4}", value);
    if s == "-0.0000" {
        "0.0000".to_string()
    } else {
        s
    }
}

fn signed_term(value: f64, suffix: &str) -> String {
    let magnitude = display(value.abs());
    if value < 0.0 && magnitude != "0.0000" {
        format!(" - {}{}", magnitude, suffix)
    } else {
        format!(" + {}{}", magnitude, suffix)
    }
}
