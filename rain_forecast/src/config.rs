//! Model and scaler configuration
//!
//! Descriptors and scaler constants are data, not code: they can be loaded
//! from JSON so that retrained models only need a new configuration file.
//! [`ForecastConfig::default`] carries the parameters of the shipped models.

use crate::error::Result;
use crate::registry::{ModelDescriptor, ModelKind, ModelRegistry, DEFAULT_TABULAR_WEIGHT};
use crate::scaler::ScalerParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything needed to build a [`ModelRegistry`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub models: Vec<ModelDescriptor>,
    #[serde(default)]
    pub scaler: ScalerParams,
}

impl ForecastConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(
            path = %path.display(),
            models = config.models.len(),
            "loaded forecast configuration"
        );
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate and freeze into a registry
    pub fn into_registry(self) -> Result<ModelRegistry> {
        ModelRegistry::new(self.models, self.scaler)
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        let tabular = |id: &str, name: &str, description: &str, mae: f64, rmse: f64| {
            ModelDescriptor {
                id: id.to_string(),
                display_name: name.to_string(),
                description: description.to_string(),
                input_feature_count: 9,
                kind: ModelKind::Tabular,
                requires_feature_scaling: true,
                requires_target_scaling: false,
                declared_mae: mae,
                declared_rmse: rmse,
            }
        };
        let sequence = |id: &str, name: &str, description: &str, mae: f64, rmse: f64| {
            ModelDescriptor {
                id: id.to_string(),
                display_name: name.to_string(),
                description: description.to_string(),
                input_feature_count: 7,
                kind: ModelKind::Sequence,
                requires_feature_scaling: false,
                requires_target_scaling: true,
                declared_mae: mae,
                declared_rmse: rmse,
            }
        };

        Self {
            models: vec![
                tabular(
                    "gbr",
                    "Gradient Boosting Regressor",
                    "Tabular model on lag, rolling and calendar features",
                    0.29,
                    0.54,
                ),
                tabular(
                    "xgb",
                    "XGBoost Regressor",
                    "Extreme gradient boosting on the tabular features",
                    0.31,
                    0.53,
                ),
                sequence(
                    "lstm",
                    "LSTM (Long Short-Term Memory)",
                    "Recurrent sequence model over the last seven days",
                    0.46,
                    0.77,
                ),
                sequence(
                    "bilstm",
                    "Bidirectional LSTM",
                    "Bidirectional recurrent sequence model",
                    0.69,
                    1.05,
                ),
                ModelDescriptor {
                    id: "hybrid".to_string(),
                    display_name: "Hybrid XGBoost + LSTM".to_string(),
                    description: "Weighted ensemble of XGBoost and LSTM".to_string(),
                    input_feature_count: 9,
                    kind: ModelKind::Ensemble {
                        tabular: "xgb".to_string(),
                        sequence: "lstm".to_string(),
                        tabular_weight: DEFAULT_TABULAR_WEIGHT,
                    },
                    requires_feature_scaling: true,
                    requires_target_scaling: true,
                    declared_mae: 0.35,
                    declared_rmse: 0.60,
                },
            ],
            scaler: ScalerParams::default(),
        }
    }
}
