//! rainfit - curve fitting and classical rainfall forecasts from CSV files
//!
//! Results are printed to stdout as JSON. Set `RUST_LOG` (for example
//! `RUST_LOG=rain_forecast=debug`) to see diagnostics on stderr.

use clap::{Parser, Subcommand, ValueEnum};
use fit_math::{perform_regression, RegressionKind};
use rain_forecast::{
    classical_forecast_with_dates, ArimaModel, DataLoader, ForecastConfig, OrderSpec,
};
use rainfit::describe_models;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "rainfit", version)]
#[command(about = "Curve fitting and rainfall forecasting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fit a curve to an x,y CSV file
    Regress {
        /// CSV file with x and y columns
        input: PathBuf,

        /// Curve family
        #[arg(value_enum)]
        kind: CurveKind,

        /// Polynomial degree
        #[arg(default_value_t = 2)]
        degree: usize,
    },

    /// Forecast a date,value CSV file with the classical cascade
    Arima {
        /// CSV file with date and value columns
        input: PathBuf,

        /// Number of days to forecast
        horizon: usize,

        /// Model order preset
        #[arg(value_enum, default_value_t = Preset::Arima111)]
        preset: Preset,
    },

    /// List the registered forecasting models
    Models,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CurveKind {
    Linear,
    Polynomial,
    Exponential,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    #[value(name = "arima_111")]
    Arima111,
    #[value(name = "arima_211")]
    Arima211,
    #[value(name = "arima_112")]
    Arima112,
    #[value(name = "sarima_weekly")]
    SarimaWeekly,
    Auto,
}

impl Preset {
    fn name(self) -> &'static str {
        match self {
            Preset::Arima111 => "arima_111",
            Preset::Arima211 => "arima_211",
            Preset::Arima112 => "arima_112",
            Preset::SarimaWeekly => "sarima_weekly",
            Preset::Auto => "auto",
        }
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let output = match cli.command {
        Command::Regress {
            input,
            kind,
            degree,
        } => regress(input, kind, degree)?,
        Command::Arima {
            input,
            horizon,
            preset,
        } => arima(input, horizon, preset)?,
        Command::Models => {
            let registry = ForecastConfig::default().into_registry()?;
            serde_json::to_value(describe_models(&registry))?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn regress(input: PathBuf, kind: CurveKind, degree: usize) -> CliResult<serde_json::Value> {
    let kind = match kind {
        CurveKind::Linear => RegressionKind::Linear,
        CurveKind::Polynomial => RegressionKind::Polynomial { degree },
        CurveKind::Exponential => RegressionKind::Exponential,
    };

    let samples = DataLoader::samples_from_csv(&input)?;
    tracing::info!(samples = samples.len(), kind = kind.name(), "fitting");
    let result = perform_regression(&samples, kind)?;
    Ok(serde_json::to_value(result)?)
}

fn arima(input: PathBuf, horizon: usize, preset: Preset) -> CliResult<serde_json::Value> {
    let order = OrderSpec::preset(preset.name())?;
    let history = DataLoader::from_csv(&input)?;
    let (predictions, tier) =
        classical_forecast_with_dates(&ArimaModel::new(), &history, horizon, &order)?;

    Ok(json!({
        "order": order.to_string(),
        "tier": tier,
        "horizon": horizon,
        "predictions": predictions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rain_forecast::classical::PRESET_NAMES;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_arima_defaults_to_arima_111() {
        let cli = Cli::try_parse_from(["rainfit", "arima", "rain.csv", "7"]).unwrap();
        match cli.command {
            Command::Arima {
                horizon, preset, ..
            } => {
                assert_eq!(horizon, 7);
                assert_eq!(preset.name(), "arima_111");
            }
            _ => panic!("expected the arima command"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(Cli::try_parse_from(["rainfit", "arima", "rain.csv", "soon"]).is_err());
        assert!(Cli::try_parse_from(["rainfit", "regress", "xy.csv", "cubic"]).is_err());
        assert!(Cli::try_parse_from(["rainfit", "arima", "rain.csv", "3", "arima_999"]).is_err());
    }

    #[test]
    fn test_parse_polynomial_degree() {
        let cli = Cli::try_parse_from(["rainfit", "regress", "xy.csv", "polynomial", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Regress {
                kind: CurveKind::Polynomial,
                degree: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_every_preset_is_known_to_the_cascade() {
        for preset in Preset::value_variants() {
            assert!(PRESET_NAMES.contains(&preset.name()));
            assert!(OrderSpec::preset(preset.name()).is_ok());
        }
    }
}
