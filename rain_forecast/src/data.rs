//! Time series data handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use fit_math::Sample;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Date formats accepted when reading series from text
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// One daily observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    /// Calendar day of the observation
    pub date: NaiveDate,
    /// Observed (or predicted) rainfall
    pub value: f64,
}

impl TimePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// A validated, chronologically ordered history ready for model computation.
///
/// Values are clamped to be non-negative. Dates are unique and ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl History {
    /// Sort, validate and clamp a caller-supplied series.
    ///
    /// Fails with `ValidationError` on non-finite values or duplicate dates and
    /// with `InsufficientHistory` when fewer than `min_points` remain.
    pub fn prepare(points: &[TimePoint], min_points: usize) -> Result<Self> {
        if let Some(index) = points.iter().position(|p| !p.value.is_finite()) {
            return Err(ForecastError::ValidationError(format!(
                "Value at index {} is not a finite number",
                index
            )));
        }

        let mut sorted = points.to_vec();
        sorted.sort_by_key(|p| p.date);

        if let Some(pair) = sorted.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ForecastError::ValidationError(format!(
                "Duplicate date in historical data: {}",
                pair[0].date
            )));
        }

        let required = min_points.max(1);
        if sorted.len() < required {
            return Err(ForecastError::InsufficientHistory {
                required,
                actual: sorted.len(),
            });
        }

        let (dates, values) = sorted.iter().map(|p| (p.date, p.value.max(0.0))).unzip();
        Ok(Self { dates, values })
    }

    /// Clamped values, oldest first
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }
}

/// Parse a calendar date in any of the supported formats
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ForecastError::ValidationError(format!("Unparseable date: {}", text)))
}

/// Data loader for CSV files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a daily series from a CSV file with a date column and a value column
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<TimePoint>> {
        let file = File::open(path)?;
        Self::series_from_reader(file)
    }

    /// Load a daily series from any CSV source
    pub fn series_from_reader<R: Read>(reader: R) -> Result<Vec<TimePoint>> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();

        let date_idx = Self::detect_column(&headers, &["date", "time", "tanggal"]).ok_or_else(
            || ForecastError::ValidationError("No date column found in data".to_string()),
        )?;
        let value_idx = Self::detect_column(&headers, &["value", "rain", "precip", "curah"])
            .or_else(|| (0..headers.len()).find(|&i| i != date_idx))
            .ok_or_else(|| {
                ForecastError::ValidationError("No value column found in data".to_string())
            })?;

        let mut points = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let date = parse_date(record.get(date_idx).unwrap_or_default())?;
            let value = Self::parse_number(record.get(value_idx), row, "value")?;
            points.push(TimePoint::new(date, value));
        }

        tracing::debug!(rows = points.len(), "loaded time series");
        Ok(points)
    }

    /// Load `(x, y)` samples from a CSV file
    pub fn samples_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Sample>> {
        let file = File::open(path)?;
        Self::samples_from_reader(file)
    }

    /// Load `(x, y)` samples from any CSV source. Uses columns named `x` and
    /// `y` when present, otherwise the first two columns.
    pub fn samples_from_reader<R: Read>(reader: R) -> Result<Vec<Sample>> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();
        if headers.len() < 2 {
            return Err(ForecastError::ValidationError(
                "Sample data needs at least two columns".to_string(),
            ));
        }

        let x_idx = Self::exact_column(&headers, "x").unwrap_or(0);
        let y_idx = Self::exact_column(&headers, "y").unwrap_or(1);

        let mut samples = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let x = Self::parse_number(record.get(x_idx), row, "x")?;
            let y = Self::parse_number(record.get(y_idx), row, "y")?;
            samples.push(Sample::new(x, y)?);
        }

        Ok(samples)
    }

    fn detect_column(headers: &csv::StringRecord, needles: &[&str]) -> Option<usize> {
        headers.iter().position(|name| {
            let lower = name.to_lowercase();
            needles.iter().any(|n| lower.contains(n))
        })
    }

    fn exact_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    fn parse_number(field: Option<&str>, row: usize, column: &str) -> Result<f64> {
        field
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                ForecastError::ValidationError(format!(
                    "Row {} has an invalid {} value",
                    row + 1,
                    column
                ))
            })
    }
}

/// Write dated points as `date,value` CSV
pub fn write_points_csv<W: Write>(points: &[TimePoint], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for point in points {
        wtr.serialize(point)?;
    }
    wtr.flush()?;
    Ok(())
}
