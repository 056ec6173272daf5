use chrono::{Days, NaiveDate};
use pretty_assertions::assert_eq;
use rain_forecast::data::write_points_csv;
use rain_forecast::{
    DataLoader, ForecastConfig, ForecastError, ModelRegistry, RecursiveForecaster, Result, Tensor,
    TimePoint,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn series(values: &[f64]) -> Vec<TimePoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| TimePoint::new(start() + Days::new(i as u64), v))
        .collect()
}

fn registry() -> ModelRegistry {
    ForecastConfig::default().into_registry().unwrap()
}

// Helper function to create a small rainfall file
fn create_sample_data() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();

    writeln!(file, "date,rainfall").unwrap();
    for (i, value) in [0.0, 2.5, 0.0, 11.2, 4.1, 0.0, 0.0, 7.3, 1.0, 0.0]
        .iter()
        .enumerate()
    {
        writeln!(file, "2023-03-{:02},{}", i + 1, value).unwrap();
    }

    file
}

#[test]
fn test_full_forecast_workflow() {
    // 1. Load data
    let data_file = create_sample_data();
    let history = DataLoader::from_csv(data_file.path()).unwrap();
    assert_eq!(history.len(), 10);

    // 2. Forecast with a stand-in runtime
    let registry = registry();
    let evaluator = |_: &str, _: &Tensor| -> Result<Vec<f64>> { Ok(vec![1.234]) };
    let forecaster = RecursiveForecaster::new(&registry, &evaluator);
    let predictions = forecaster.forecast("xgb", &history, 3).unwrap();

    // 3. Dates follow the last observation with no gaps
    let dates: Vec<String> = predictions.iter().map(|p| p.date.to_string()).collect();
    assert_eq!(dates, vec!["2023-03-11", "2023-03-12", "2023-03-13"]);
    assert!(predictions.iter().all(|p| p.value == 1.23));

    // 4. Write the forecast back out
    let mut out = Vec::new();
    write_points_csv(&predictions, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("date,value\n2023-03-11,1.23"));
}

#[test]
fn test_every_registered_model_forecasts() {
    let registry = registry();
    let evaluator = |_: &str, input: &Tensor| -> Result<Vec<f64>> {
        Ok(vec![input.data().iter().sum::<f64>().abs() / 10.0])
    };
    let forecaster = RecursiveForecaster::new(&registry, &evaluator);
    let history = series(&[0.0, 1.0, 0.0, 5.0, 2.0, 0.0, 3.0, 0.5]);

    for id in ["gbr", "xgb", "lstm", "bilstm", "hybrid"] {
        let predictions = forecaster.forecast(id, &history, 30).unwrap();
        assert_eq!(predictions.len(), 30, "model {}", id);
        assert!(predictions.iter().all(|p| p.value >= 0.0), "model {}", id);
    }
}

#[test]
fn test_each_step_sees_previous_predictions() {
    let registry = registry();
    let scaler = registry.scaler().feature_scaler.clone();
    // Recover lag1 from the scaled feature row and predict one more than it
    let evaluator = move |_: &str, input: &Tensor| -> Result<Vec<f64>> {
        let lag1 = input.data()[0] * scaler.scale[0] + scaler.mean[0];
        Ok(vec![lag1 + 1.0])
    };
    let forecaster = RecursiveForecaster::new(&registry, &evaluator);

    let predictions = forecaster
        .forecast("gbr", &series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]), 4)
        .unwrap();
    let values: Vec<f64> = predictions.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![8.0, 9.0, 10.0, 11.0]);
}

#[test]
fn test_rounding_does_not_feed_back() {
    let registry = registry();
    let scaler = registry.scaler().feature_scaler.clone();
    let evaluator = move |_: &str, input: &Tensor| -> Result<Vec<f64>> {
        let lag1 = input.data()[0] * scaler.scale[0] + scaler.mean[0];
        Ok(vec![lag1 + 0.004])
    };
    let forecaster = RecursiveForecaster::new(&registry, &evaluator);

    let predictions = forecaster.forecast("gbr", &series(&[7.0; 7]), 3).unwrap();
    let values: Vec<f64> = predictions.iter().map(|p| p.value).collect();
    // Unrounded working values are 7.004, 7.008, 7.012
    assert_eq!(values, vec![7.0, 7.01, 7.01]);
}

#[test]
fn test_sequence_window_slides_over_predictions() {
    let registry = registry();
    let target = registry.scaler().target_scaler;
    let windows = std::cell::RefCell::new(Vec::new());
    let evaluator = |_: &str, input: &Tensor| -> Result<Vec<f64>> {
        let raw: Vec<f64> = input
            .data()
            .iter()
            .map(|&v| (target.inverse_transform(v) * 100.0).round() / 100.0)
            .collect();
        windows.borrow_mut().push(raw);
        Ok(vec![target.transform(9.0)])
    };
    let forecaster = RecursiveForecaster::new(&registry, &evaluator);
    forecaster
        .forecast("lstm", &series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]), 3)
        .unwrap();

    let windows = windows.into_inner();
    assert_eq!(windows[0], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    assert_eq!(windows[1], vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 9.0]);
    assert_eq!(windows[2], vec![3.0, 4.0, 5.0, 6.0, 7.0, 9.0, 9.0]);
}

#[test]
fn test_negative_history_is_clamped() {
    let registry = registry();
    let scaler = registry.scaler().feature_scaler.clone();
    let evaluator = move |_: &str, input: &Tensor| -> Result<Vec<f64>> {
        // roll_max_7 of a clamped history can never be negative
        let max7 = input.data()[5] * scaler.scale[5] + scaler.mean[5];
        assert!(max7 >= -1e-9);
        Ok(vec![max7])
    };
    let forecaster = RecursiveForecaster::new(&registry, &evaluator);
    let predictions = forecaster
        .forecast("gbr", &series(&[-3.0, -1.0, -2.0, -5.0, -1.0, -4.0, -2.0]), 2)
        .unwrap();
    assert!(predictions.iter().all(|p| p.value == 0.0));
}

#[test]
fn test_insufficient_history() {
    let registry = registry();
    let evaluator = |_: &str, _: &Tensor| -> Result<Vec<f64>> { Ok(vec![1.0]) };
    let forecaster = RecursiveForecaster::new(&registry, &evaluator);

    let err = forecaster
        .forecast("gbr", &series(&[1.0; 5]), 3)
        .unwrap_err();
    assert!(matches!(
        err,
        ForecastError::InsufficientHistory {
            required: 7,
            actual: 5
        }
    ));
}

#[test]
fn test_failing_step_returns_no_partial_output() {
    let registry = registry();
    let calls = std::cell::Cell::new(0);
    let evaluator = |_: &str, _: &Tensor| -> Result<Vec<f64>> {
        calls.set(calls.get() + 1);
        if calls.get() == 3 {
            Err(ForecastError::EvaluatorError("runtime crashed".to_string()))
        } else {
            Ok(vec![1.0])
        }
    };
    let forecaster = RecursiveForecaster::new(&registry, &evaluator);

    let result = forecaster.forecast("gbr", &series(&[1.0; 7]), 5);
    assert!(matches!(result, Err(ForecastError::EvaluatorError(_))));
    assert_eq!(calls.get(), 3);
}
