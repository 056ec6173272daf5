//! JSON request handlers
//!
//! Each handler takes a raw request body, validates it field by field and
//! either returns a serializable response or an [`ApiError`] naming the
//! first violated constraint. Bodies are inspected as loose JSON so that
//! every malformed field gets its own message.

use crate::error::{ApiError, Result};
use chrono::NaiveDate;
use fit_math::{perform_regression, RegressionKind, RegressionResult, Sample};
use rain_forecast::data::parse_date;
use rain_forecast::features::MIN_HISTORY;
use rain_forecast::{
    ModelEvaluator, ModelRegistry, RecursiveForecaster, TimePoint, MAX_HORIZON, MIN_HORIZON,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Smallest sample count accepted by the regression handler
pub const MIN_REGRESSION_POINTS: usize = 2;

/// Largest polynomial degree accepted by the regression handler
pub const MAX_POLYNOMIAL_DEGREE: usize = 10;

const DEFAULT_POLYNOMIAL_DEGREE: usize = 2;

const REGRESSION_TYPES: [&str; 3] = ["linear", "polynomial", "exponential"];

/// Summary of the model that produced a forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    #[serde(rename = "type")]
    pub model_type: String,
    pub name: String,
    pub mae: f64,
    pub rmse: f64,
}

/// Span of the submitted history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSummary {
    pub count: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Successful forecast response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub model: ModelSummary,
    pub horizon: usize,
    pub predictions: Vec<TimePoint>,
    pub historical_summary: HistoricalSummary,
}

/// One entry of the model catalogue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: String,
    pub mae: f64,
    pub rmse: f64,
}

/// What the forecast endpoint accepts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCatalogue {
    pub available_models: Vec<ModelInfo>,
    pub min_horizon: usize,
    pub max_horizon: usize,
    pub min_history: usize,
}

/// List the registered models and the request limits
pub fn describe_models(registry: &ModelRegistry) -> ModelCatalogue {
    ModelCatalogue {
        available_models: registry
            .models()
            .iter()
            .map(|m| ModelInfo {
                id: m.id.clone(),
                name: m.display_name.clone(),
                description: m.description.clone(),
                kind: m.kind.name().to_string(),
                mae: m.declared_mae,
                rmse: m.declared_rmse,
            })
            .collect(),
        min_horizon: MIN_HORIZON,
        max_horizon: MAX_HORIZON,
        min_history: MIN_HISTORY,
    }
}

/// Handle a forecast request of the form
/// `{"model": id, "horizon": n, "historicalData": [{"date": "YYYY-MM-DD", "value": v}, ...]}`
pub fn handle_predict<E>(
    registry: &ModelRegistry,
    evaluator: &E,
    body: &str,
) -> Result<PredictResponse>
where
    E: ModelEvaluator + ?Sized,
{
    let body = parse_object(body)?;

    let model_id = body
        .get("model")
        .and_then(Value::as_str)
        .filter(|id| registry.contains(id))
        .ok_or_else(|| {
            let valid: Vec<&str> = registry.model_ids().collect();
            ApiError::bad_request("Invalid model type")
                .with_details(format!("Valid models: {}", valid.join(", ")))
        })?;
    let model = registry
        .get(model_id)
        .map_err(|e| ApiError::internal("Prediction failed", e.to_string()))?;

    let horizon = body
        .get("horizon")
        .and_then(as_whole_number)
        .filter(|h| (MIN_HORIZON..=MAX_HORIZON).contains(h))
        .ok_or_else(|| {
            ApiError::bad_request("Invalid horizon").with_details(format!(
                "Horizon must be between {} and {} days",
                MIN_HORIZON, MAX_HORIZON
            ))
        })?;

    let raw_points = body
        .get("historicalData")
        .and_then(Value::as_array)
        .filter(|points| points.len() >= MIN_HISTORY)
        .ok_or_else(|| {
            ApiError::bad_request("Insufficient historical data").with_details(format!(
                "At least {} data points are required",
                MIN_HISTORY
            ))
        })?;

    let history = raw_points
        .iter()
        .enumerate()
        .map(|(i, point)| parse_time_point(i, point))
        .collect::<Result<Vec<_>>>()?;
    reject_duplicate_dates(&history)?;

    let forecaster = RecursiveForecaster::new(registry, evaluator);
    let predictions = forecaster
        .forecast(model_id, &history, horizon)
        .map_err(|e| {
            tracing::warn!(model = model_id, horizon, error = %e, "prediction failed");
            ApiError::internal("Prediction failed", e.to_string())
        })?;

    let (start_date, end_date) = date_span(&history)
        .ok_or_else(|| ApiError::internal("Prediction failed", "Empty history"))?;

    tracing::info!(model = model_id, horizon, points = history.len(), "prediction served");
    Ok(PredictResponse {
        model: ModelSummary {
            model_type: model.id.clone(),
            name: model.display_name.clone(),
            mae: model.declared_mae,
            rmse: model.declared_rmse,
        },
        horizon,
        predictions,
        historical_summary: HistoricalSummary {
            count: history.len(),
            start_date,
            end_date,
        },
    })
}

/// Handle a regression request of the form
/// `{"data": [{"x": n, "y": n, "enabled": bool?}, ...], "type": kind, "degree": n?}`
pub fn handle_regression(body: &str) -> Result<RegressionResult> {
    let body = parse_object(body)?;

    let data = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::bad_request("Data must be an array of {x, y} objects"))?;
    if data.len() < MIN_REGRESSION_POINTS {
        return Err(ApiError::bad_request(format!(
            "At least {} data points are required",
            MIN_REGRESSION_POINTS
        )));
    }

    let samples = data
        .iter()
        .enumerate()
        .map(|(i, point)| parse_sample(i, point))
        .collect::<Result<Vec<_>>>()?;

    let kind = match body.get("type").and_then(Value::as_str) {
        Some("linear") => RegressionKind::Linear,
        Some("exponential") => RegressionKind::Exponential,
        Some("polynomial") => {
            let degree = match body.get("degree") {
                None | Some(Value::Null) => DEFAULT_POLYNOMIAL_DEGREE,
                Some(value) => as_whole_number(value)
                    .filter(|d| (1..=MAX_POLYNOMIAL_DEGREE).contains(d))
                    .ok_or_else(|| {
                        ApiError::bad_request(format!(
                            "Polynomial degree must be between 1 and {}",
                            MAX_POLYNOMIAL_DEGREE
                        ))
                    })?,
            };
            RegressionKind::Polynomial { degree }
        }
        _ => {
            return Err(ApiError::bad_request(format!(
                "Invalid regression type. Must be one of: {}",
                REGRESSION_TYPES.join(", ")
            )))
        }
    };

    perform_regression(&samples, kind).map_err(|e| {
        tracing::warn!(kind = kind.name(), error = %e, "regression failed");
        ApiError::internal("Regression calculation failed", e.to_string())
    })
}

fn parse_object(body: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::bad_request("Invalid request body")
            .with_details("Request body must be a JSON object")),
        Err(e) => Err(ApiError::bad_request("Invalid request body").with_details(e.to_string())),
    }
}

/// A finite number, or a string holding one
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn as_whole_number(value: &Value) -> Option<usize> {
    as_number(value)
        .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= usize::MAX as f64)
        .map(|v| v as usize)
}

fn parse_time_point(index: usize, point: &Value) -> Result<TimePoint> {
    let invalid = || {
        ApiError::bad_request(format!("Invalid data point at index {}", index))
            .with_details("Each point must have \"date\" (string) and \"value\" (number)")
    };

    let date_text = point
        .get("date")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(invalid)?;
    let value = point.get("value").and_then(Value::as_f64).ok_or_else(invalid)?;

    let date = parse_date(date_text).map_err(|e| {
        ApiError::bad_request(format!("Invalid date at index {}", index))
            .with_details(e.to_string())
    })?;
    Ok(TimePoint::new(date, value))
}

fn parse_sample(index: usize, point: &Value) -> Result<Sample> {
    let point = point
        .as_object()
        .ok_or_else(|| ApiError::bad_request(format!("Data point at index {} is invalid", index)))?;

    let invalid_xy =
        || ApiError::bad_request(format!("Data point at index {} has invalid x or y value", index));
    let x = point.get("x").and_then(as_number).ok_or_else(invalid_xy)?;
    let y = point.get("y").and_then(as_number).ok_or_else(invalid_xy)?;
    let sample = Sample::new(x, y).map_err(|_| invalid_xy())?;

    match point.get("enabled") {
        None | Some(Value::Bool(true)) => Ok(sample),
        Some(Value::Bool(false)) => Ok(sample.disabled()),
        Some(_) => Err(ApiError::bad_request(format!(
            "Data point at index {} has a non-boolean \"enabled\" flag",
            index
        ))),
    }
}

/// The first repeated date is reported at the index of its second occurrence
fn reject_duplicate_dates(points: &[TimePoint]) -> Result<()> {
    let mut seen = HashSet::with_capacity(points.len());
    match points.iter().position(|p| !seen.insert(p.date)) {
        Some(index) => Err(
            ApiError::bad_request(format!("Duplicate date at index {}", index))
                .with_details(format!("{} appears more than once", points[index].date)),
        ),
        None => Ok(()),
    }
}

fn date_span(points: &[TimePoint]) -> Option<(NaiveDate, NaiveDate)> {
    let start = points.iter().map(|p| p.date).min()?;
    let end = points.iter().map(|p| p.date).max()?;
    Some((start, end))
}
