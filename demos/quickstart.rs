// Walks through a regression fit, a recursive forecast and a classical forecast
use chrono::NaiveDate;
use rainfit_workspace::fit_math::{perform_regression, RegressionKind, Sample};
use rainfit_workspace::rain_forecast::utils::generate_rainfall;
use rainfit_workspace::rain_forecast::{
    classical_forecast_with_dates, ArimaModel, ForecastConfig, OrderSpec, RecursiveForecaster,
    Result, Tensor,
};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("=== Curve fitting ===");
    let samples: Vec<Sample> = [(1.0, 2.7), (2.0, 7.4), (3.0, 20.1), (4.0, 54.6), (5.0, 148.4)]
        .iter()
        .map(|&(x, y)| Sample::new(x, y))
        .collect::<std::result::Result<_, _>>()?;
    for kind in [
        RegressionKind::Linear,
        RegressionKind::Polynomial { degree: 2 },
        RegressionKind::Exponential,
    ] {
        let fit = perform_regression(&samples, kind)?;
        println!("{:<12} {}  (RMSE {:.3})", kind.name(), fit.formula, fit.rmse);
    }

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("invalid start date")?;
    let history = generate_rainfall(60, start, 0.4, 7.5, 2024)?;

    println!("\n=== Recursive forecast ===");
    let config = ForecastConfig::default();
    let target = config.scaler.target_scaler;
    let feature = config.scaler.feature_scaler.clone();
    let registry = config.into_registry()?;

    // Stand-in runtime: tabular models return the 3-day mean, sequence models
    // a damped copy of the last scaled value
    let evaluator = move |_: &str, input: &Tensor| -> Result<Vec<f64>> {
        let data = input.data();
        Ok(vec![if input.shape().len() == 3 {
            0.8 * data[data.len() - 1] + 0.2 * target.transform(0.0)
        } else {
            data[3] * feature.scale[3] + feature.mean[3]
        }])
    };

    let forecaster = RecursiveForecaster::new(&registry, &evaluator);
    for model in registry.models() {
        let predictions = forecaster.forecast_with_progress(&model.id, &history, 7, |step, total| {
            if step == total {
                print!("{:<8}", model.id);
            }
        })?;
        let values: Vec<String> = predictions.iter().map(|p| format!("{:5.2}", p.value)).collect();
        println!(" {}", values.join(" "));
    }

    println!("\n=== Classical forecast ===");
    for preset in ["arima_111", "sarima_weekly", "auto"] {
        let order = OrderSpec::preset(preset)?;
        let (predictions, tier) =
            classical_forecast_with_dates(&ArimaModel::new(), &history, 7, &order)?;
        let values: Vec<String> = predictions.iter().map(|p| format!("{:5.2}", p.value)).collect();
        println!("{:<14} {:<18} {}", preset, format!("{:?}", tier), values.join(" "));
    }

    Ok(())
}
