//! Model registry and dispatch
//!
//! The registry holds the immutable model descriptors together with the
//! scaler parameters and turns "predict day D with model M" into the right
//! feature construction, scaling and evaluator call for M's kind.

use crate::error::{ForecastError, Result};
use crate::evaluator::{evaluate_scalar, ModelEvaluator, Tensor};
use crate::features::{
    sequence_features, tabular_features, SEQUENCE_LENGTH, TABULAR_FEATURE_COUNT,
};
use crate::scaler::ScalerParams;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Weight given to the tabular member of an ensemble unless configured
pub const DEFAULT_TABULAR_WEIGHT: f64 = 0.6;

fn default_tabular_weight() -> f64 {
    DEFAULT_TABULAR_WEIGHT
}

/// How a model consumes history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelKind {
    /// Engineered 9-feature row, predicts in original units
    Tabular,
    /// Raw 7-step window, optionally in target-scaled space
    Sequence,
    /// Weighted average of one tabular and one sequence model
    Ensemble {
        tabular: String,
        sequence: String,
        #[serde(default = "default_tabular_weight")]
        tabular_weight: f64,
    },
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Tabular => "tabular",
            ModelKind::Sequence => "sequence",
            ModelKind::Ensemble { .. } => "ensemble",
        }
    }
}

/// Static description of a pretrained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub input_feature_count: usize,
    pub kind: ModelKind,
    #[serde(default)]
    pub requires_feature_scaling: bool,
    #[serde(default)]
    pub requires_target_scaling: bool,
    /// Test-set MAE reported at training time
    pub declared_mae: f64,
    /// Test-set RMSE reported at training time
    pub declared_rmse: f64,
}

/// Immutable set of models plus the scaler they share
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
    scaler: ScalerParams,
}

impl ModelRegistry {
    /// Build a registry, validating descriptors and scaler parameters
    pub fn new(models: Vec<ModelDescriptor>, scaler: ScalerParams) -> Result<Self> {
        scaler.validate()?;

        let mut seen = HashSet::new();
        for model in &models {
            if model.id.trim().is_empty() {
                return Err(ForecastError::ConfigError(
                    "Model id must not be empty".to_string(),
                ));
            }
            if !seen.insert(model.id.as_str()) {
                return Err(ForecastError::ConfigError(format!(
                    "Duplicate model id: {}",
                    model.id
                )));
            }
            for (label, value) in [("MAE", model.declared_mae), ("RMSE", model.declared_rmse)] {
                if !value.is_finite() || value < 0.0 {
                    return Err(ForecastError::ConfigError(format!(
                        "Model '{}' declares an invalid {}: {}",
                        model.id, label, value
                    )));
                }
            }
        }

        for model in &models {
            Self::validate_kind(model, &models)?;
        }

        tracing::info!(models = models.len(), "model registry loaded");
        Ok(Self { models, scaler })
    }

    fn validate_kind(model: &ModelDescriptor, all: &[ModelDescriptor]) -> Result<()> {
        let expect_inputs = |expected: usize| {
            if model.input_feature_count == expected {
                Ok(())
            } else {
                Err(ForecastError::ConfigError(format!(
                    "{} model '{}' must take {} inputs, declares {}",
                    model.kind.name(),
                    model.id,
                    expected,
                    model.input_feature_count
                )))
            }
        };

        match &model.kind {
            ModelKind::Tabular => expect_inputs(TABULAR_FEATURE_COUNT),
            ModelKind::Sequence => expect_inputs(SEQUENCE_LENGTH),
            ModelKind::Ensemble {
                tabular,
                sequence,
                tabular_weight,
            } => {
                if !(0.0..=1.0).contains(tabular_weight) {
                    return Err(ForecastError::ConfigError(format!(
                        "Ensemble '{}' weight must be within [0, 1], got {}",
                        model.id, tabular_weight
                    )));
                }
                let members = [(tabular, ModelKind::Tabular), (sequence, ModelKind::Sequence)];
                for (member, wanted) in members {
                    let found = all.iter().find(|m| &m.id == member).ok_or_else(|| {
                        ForecastError::ConfigError(format!(
                            "Ensemble '{}' references unknown model '{}'",
                            model.id, member
                        ))
                    })?;
                    if found.kind != wanted {
                        return Err(ForecastError::ConfigError(format!(
                            "Ensemble '{}' member '{}' must be a {} model",
                            model.id,
                            member,
                            wanted.name()
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Look up a descriptor by id
    pub fn get(&self, model_id: &str) -> Result<&ModelDescriptor> {
        self.models
            .iter()
            .find(|m| m.id == model_id)
            .ok_or_else(|| ForecastError::UnknownModel(model_id.to_string()))
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.models.iter().any(|m| m.id == model_id)
    }

    /// All descriptors in registration order
    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn model_ids(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.id.as_str())
    }

    pub fn scaler(&self) -> &ScalerParams {
        &self.scaler
    }

    /// Predict the value for `target_date` from `history` with `model_id`.
    ///
    /// `history` must already be clamped and ordered. The result is in
    /// original units and never negative.
    pub fn evaluate<E>(
        &self,
        evaluator: &E,
        model_id: &str,
        history: &[f64],
        target_date: NaiveDate,
    ) -> Result<f64>
    where
        E: ModelEvaluator + ?Sized,
    {
        let model = self.get(model_id)?;
        match &model.kind {
            ModelKind::Ensemble {
                tabular,
                sequence,
                tabular_weight,
            } => {
                let tab_model = self.get(tabular)?;
                let seq_model = self.get(sequence)?;
                let tab = self.evaluate_member(evaluator, tab_model, history, target_date)?;
                let seq = self.evaluate_member(evaluator, seq_model, history, target_date)?;
                let combined = tabular_weight * tab + (1.0 - tabular_weight) * seq;
                tracing::trace!(model = model_id, tab, seq, combined, "ensemble combined");
                Ok(combined.max(0.0))
            }
            _ => self.evaluate_member(evaluator, model, history, target_date),
        }
    }

    fn evaluate_member<E>(
        &self,
        evaluator: &E,
        model: &ModelDescriptor,
        history: &[f64],
        target_date: NaiveDate,
    ) -> Result<f64>
    where
        E: ModelEvaluator + ?Sized,
    {
        match model.kind {
            ModelKind::Tabular => {
                let raw = tabular_features(history, target_date)?.to_vec();
                let features = if model.requires_feature_scaling {
                    self.scaler.feature_scaler.transform(&raw)?
                } else {
                    raw
                };
                let prediction = evaluate_scalar(evaluator, &model.id, &Tensor::tabular(features))?;
                Ok(prediction.max(0.0))
            }
            ModelKind::Sequence => {
                let target = model
                    .requires_target_scaling
                    .then_some(&self.scaler.target_scaler);
                let window = sequence_features(history, target)?;
                let output = evaluate_scalar(evaluator, &model.id, &Tensor::sequence(window))?;
                let prediction = match target {
                    Some(scaler) => scaler.inverse_transform(output),
                    None => output,
                };
                Ok(prediction.max(0.0))
            }
            ModelKind::Ensemble { .. } => Err(ForecastError::ConfigError(format!(
                "Ensemble '{}' cannot be used as an ensemble member",
                model.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForecastConfig;
    use approx::assert_relative_eq;

    fn registry() -> ModelRegistry {
        ForecastConfig::default().into_registry().unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    /// Tabular models return the first input, sequence models the last
    fn echo(_model_id: &str, input: &Tensor) -> Result<Vec<f64>> {
        let data = input.data();
        let value = if input.shape().len() == 3 {
            data[data.len() - 1]
        } else {
            data[0]
        };
        Ok(vec![value])
    }

    #[test]
    fn test_unknown_model() {
        let err = registry()
            .evaluate(&echo, "prophet", &[1.0; 7], date())
            .unwrap_err();
        assert!(matches!(err, ForecastError::UnknownModel(id) if id == "prophet"));
    }

    #[test]
    fn test_tabular_receives_scaled_features() {
        let reg = registry();
        let seen = std::cell::RefCell::new(Vec::new());
        let evaluator = |id: &str, input: &Tensor| -> Result<Vec<f64>> {
            seen.borrow_mut().push((id.to_string(), input.clone()));
            Ok(vec![1.5])
        };

        let history = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let value = reg.evaluate(&evaluator, "gbr", &history, date()).unwrap();
        assert_eq!(value, 1.5);

        let calls = seen.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "gbr");
        assert_eq!(calls[0].1.shape(), &[1, 9]);

        let scaler = &reg.scaler().feature_scaler;
        assert_relative_eq!(
            calls[0].1.data()[0],
            (7.0 - scaler.mean[0]) / scaler.scale[0],
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_tabular_output_not_inverse_scaled_and_clamped() {
        let reg = registry();
        let negative = |_: &str, _: &Tensor| -> Result<Vec<f64>> { Ok(vec![-2.0]) };
        assert_eq!(reg.evaluate(&negative, "xgb", &[1.0; 7], date()).unwrap(), 0.0);
    }

    #[test]
    fn test_sequence_round_trips_target_scaling() {
        let reg = registry();
        // Echo returns the last scaled input, which must come back as the raw value
        let value = reg
            .evaluate(&echo, "lstm", &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.2], date())
            .unwrap();
        assert_relative_eq!(value, 4.2, epsilon = 1e-12);
    }

    #[test]
    fn test_sequence_tensor_shape() {
        let reg = registry();
        let evaluator = |_: &str, input: &Tensor| -> Result<Vec<f64>> {
            assert_eq!(input.shape(), &[1, 7, 1]);
            Ok(vec![0.0])
        };
        reg.evaluate(&evaluator, "bilstm", &[1.0; 10], date()).unwrap();
    }

    #[test]
    fn test_ensemble_is_weighted_average() {
        let reg = registry();
        let evaluator = |id: &str, _: &Tensor| -> Result<Vec<f64>> {
            match id {
                "xgb" => Ok(vec![10.0]),
                // Scaled output that maps back to 0.0 mm
                "lstm" => {
                    let t = ForecastConfig::default().scaler.target_scaler;
                    Ok(vec![t.transform(0.0)])
                }
                other => panic!("unexpected sub-model {}", other),
            }
        };

        let value = reg.evaluate(&evaluator, "hybrid", &[1.0; 7], date()).unwrap();
        assert_relative_eq!(value, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ensemble_stays_between_members() {
        let reg = registry();
        for (tab, seq) in [(0.0, 5.0), (3.0, 1.0), (2.5, 2.5), (12.0, 0.4)] {
            let t = reg.scaler().target_scaler;
            let evaluator = move |id: &str, _: &Tensor| -> Result<Vec<f64>> {
                Ok(vec![if id == "xgb" { tab } else { t.transform(seq) }])
            };
            let value = reg.evaluate(&evaluator, "hybrid", &[1.0; 7], date()).unwrap();
            let (lo, hi) = if tab < seq { (tab, seq) } else { (seq, tab) };
            assert!(value >= lo - 1e-9 && value <= hi + 1e-9, "{} not in [{}, {}]", value, lo, hi);
        }
    }

    #[test]
    fn test_insufficient_history_surfaces() {
        let err = registry()
            .evaluate(&echo, "gbr", &[1.0; 5], date())
            .unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientHistory { .. }));
    }

    #[test]
    fn test_evaluator_error_propagates() {
        let failing = |_: &str, _: &Tensor| -> Result<Vec<f64>> {
            Err(ForecastError::EvaluatorError("session closed".to_string()))
        };
        assert!(matches!(
            registry().evaluate(&failing, "gbr", &[1.0; 7], date()),
            Err(ForecastError::EvaluatorError(_))
        ));
    }

    #[test]
    fn test_rejects_bad_ensemble_reference() {
        let mut config = ForecastConfig::default();
        for model in &mut config.models {
            if let ModelKind::Ensemble { sequence, .. } = &mut model.kind {
                *sequence = "gbr".to_string();
            }
        }
        assert!(matches!(
            config.into_registry(),
            Err(ForecastError::ConfigError(_))
        ));
    }

    #[test]
    fn test_rejects_weight_out_of_range() {
        let mut config = ForecastConfig::default();
        for model in &mut config.models {
            if let ModelKind::Ensemble { tabular_weight, .. } = &mut model.kind {
                *tabular_weight = 1.5;
            }
        }
        assert!(matches!(
            config.into_registry(),
            Err(ForecastError::ConfigError(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_input_count_and_duplicates() {
        let mut config = ForecastConfig::default();
        config.models[0].input_feature_count = 8;
        assert!(config.into_registry().is_err());

        let mut config = ForecastConfig::default();
        let copy = config.models[0].clone();
        config.models.push(copy);
        assert!(matches!(
            config.into_registry(),
            Err(ForecastError::ConfigError(msg)) if msg.contains("Duplicate")
        ));
    }
}
