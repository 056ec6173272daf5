//! Fixed affine normalization of features and target
//!
//! Parameters come from training (a standard scaler fitted offline); this
//! module only applies them.

use crate::error::{ForecastError, Result};
use crate::features::TABULAR_FEATURE_COUNT;
use serde::{Deserialize, Serialize};

/// A single `(mean, scale)` pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineScaler {
    pub mean: f64,
    pub scale: f64,
}

impl AffineScaler {
    pub fn new(mean: f64, scale: f64) -> Result<Self> {
        let scaler = Self { mean, scale };
        scaler.validate("scaler")?;
        Ok(scaler)
    }

    /// `(raw - mean) / scale`
    pub fn transform(&self, raw: f64) -> f64 {
        (raw - self.mean) / self.scale
    }

    /// `scaled * scale + mean`
    pub fn inverse_transform(&self, scaled: f64) -> f64 {
        scaled * self.scale + self.mean
    }

    fn validate(&self, label: &str) -> Result<()> {
        if !self.mean.is_finite() {
            return Err(ForecastError::ConfigError(format!(
                "{} mean must be finite, got {}",
                label, self.mean
            )));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ForecastError::ConfigError(format!(
                "{} scale must be a positive finite number, got {}",
                label, self.scale
            )));
        }
        Ok(())
    }
}

/// Per-feature scaling for the tabular feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    /// Scale each feature with its own `(mean, scale)` pair
    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        self.check_len(features.len())?;
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    pub fn inverse_transform(&self, scaled: &[f64]) -> Result<Vec<f64>> {
        self.check_len(scaled.len())?;
        Ok(scaled
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| v * s + m)
            .collect())
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.mean.len() {
            return Err(ForecastError::ValidationError(format!(
                "Feature scaler expects {} features, got {}",
                self.mean.len(),
                len
            )));
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.mean.len() != TABULAR_FEATURE_COUNT || self.scale.len() != TABULAR_FEATURE_COUNT
        {
            return Err(ForecastError::ConfigError(format!(
                "Feature scaler needs {} means and scales, got {} and {}",
                TABULAR_FEATURE_COUNT,
                self.mean.len(),
                self.scale.len()
            )));
        }
        for (i, (&mean, &scale)) in self.mean.iter().zip(&self.scale).enumerate() {
            AffineScaler { mean, scale }.validate(&format!("feature {}", i))?;
        }
        Ok(())
    }
}

/// Scaler parameters exported from training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub feature_scaler: FeatureScaler,
    pub target_scaler: AffineScaler,
}

impl ScalerParams {
    /// Fail fast on parameters that would produce NaN or infinite output
    pub fn validate(&self) -> Result<()> {
        self.feature_scaler.validate()?;
        self.target_scaler.validate("target")
    }
}

impl Default for ScalerParams {
    /// Parameters fitted on the daily rainfall training set
    fn default() -> Self {
        Self {
            feature_scaler: FeatureScaler {
                mean: vec![
                    1.5034776847977684,
                    1.5047677824267782,
                    1.5121806136680611,
                    1.5027935068960179,
                    1.505339277412499,
                    2.3536510925151095,
                    0.5868997351841349,
                    8.01673640167364,
                    2.999302649930265,
                ],
                scale: vec![
                    1.7453128483566687,
                    1.7474087481923781,
                    1.7581850927128913,
                    1.6589804600670142,
                    1.5471533588843935,
                    2.2020681136274662,
                    0.65485208217006,
                    2.938656692514004,
                    2.0012198690276453,
                ],
            },
            target_scaler: AffineScaler {
                mean: 1.4091728960584102,
                scale: 1.7061216300633373,
            },
        }
    }
}
