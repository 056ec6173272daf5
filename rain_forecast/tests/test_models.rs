use chrono::{Days, NaiveDate};
use pretty_assertions::assert_eq;
use rain_forecast::classical::PRESET_NAMES;
use rain_forecast::utils::generate_rainfall;
use rain_forecast::{
    classical_forecast_with_dates, ArimaModel, ArimaOrder, ClassicalModel, FallbackPolicy,
    FallbackTier, ForecastError, OrderSpec, Result, TimePoint,
};
use rstest::rstest;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
}

fn dated(values: &[f64]) -> Vec<TimePoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| TimePoint::new(start() + Days::new(i as u64), v))
        .collect()
}

#[rstest]
#[case("arima_111")]
#[case("arima_211")]
#[case("arima_112")]
#[case("sarima_weekly")]
#[case("auto")]
fn test_presets_on_synthetic_rainfall(#[case] preset: &str) {
    let history = generate_rainfall(90, start(), 0.35, 8.0, 42).unwrap();
    let order = OrderSpec::preset(preset).unwrap();

    let (points, tier) =
        classical_forecast_with_dates(&ArimaModel::new(), &history, 14, &order).unwrap();

    assert_eq!(points.len(), 14);
    assert_eq!(points[0].date, history[89].date + Days::new(1));
    assert!(points.iter().all(|p| p.value >= 0.0));
    if tier == FallbackTier::Climatology {
        assert!(points.iter().all(|p| p.value == points[0].value));
    }
}

#[test]
fn test_all_dry_history_falls_to_zero_climatology() {
    let history = dated(&[0.0; 20]);
    let (points, tier) =
        classical_forecast_with_dates(&ArimaModel::new(), &history, 5, &OrderSpec::Auto).unwrap();

    assert_eq!(tier, FallbackTier::Climatology);
    assert!(points.iter().all(|p| p.value == 0.0));
}

#[test]
fn test_reference_model_on_a_trend() {
    let values: Vec<f64> = (0..15).map(|t| 1.0 + 0.25 * t as f64).collect();
    let order = OrderSpec::Manual(ArimaOrder::new(0, 1, 0));

    let outcome = FallbackPolicy::default()
        .run(&ArimaModel::new(), &values, &order, 3)
        .unwrap();

    assert_eq!(outcome.tier, FallbackTier::Requested);
    for (got, want) in outcome.predictions.iter().zip([4.75, 5.0, 5.25]) {
        assert!((got - want).abs() < 1e-9, "{} != {}", got, want);
    }
}

#[test]
fn test_requires_ten_dated_points() {
    let err = classical_forecast_with_dates(
        &ArimaModel::new(),
        &dated(&[1.0; 9]),
        3,
        &OrderSpec::Auto,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ForecastError::InsufficientHistory {
            required: 10,
            actual: 9
        }
    ));
}

#[test]
fn test_horizon_validated_for_classical_forecasts() {
    let err = classical_forecast_with_dates(
        &ArimaModel::new(),
        &dated(&[1.0; 12]),
        31,
        &OrderSpec::Auto,
    )
    .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidHorizon { horizon: 31 }));
}

#[test]
fn test_climatology_values_are_rounded() {
    // Positive mean is 10/3
    let model = |_: &[f64], _: &OrderSpec, h: usize| -> Result<Vec<f64>> { Ok(vec![0.0; h]) };
    let mut values = vec![0.0; 9];
    values.extend([1.0, 4.0, 5.0]);

    let (points, tier) =
        classical_forecast_with_dates(&model, &dated(&values), 2, &OrderSpec::Auto).unwrap();
    assert_eq!(tier, FallbackTier::Climatology);
    assert_eq!(points[0].value, 3.33);
}

#[test]
fn test_trait_object_model() {
    let model: Box<dyn ClassicalModel> = Box::new(ArimaModel::new());

    // Constant after differencing, so the lag column duplicates the intercept
    let singular = model.fit_predict(&[2.0; 12], &OrderSpec::preset("arima_111").unwrap(), 2);
    assert!(matches!(singular, Err(ForecastError::MathError(_))));

    let walk = OrderSpec::Manual(ArimaOrder::new(0, 1, 0));
    let predictions = model.fit_predict(&[2.0; 12], &walk, 2).unwrap();
    assert_eq!(predictions, vec![2.0, 2.0]);
    assert_eq!(PRESET_NAMES.len(), 5);
}
