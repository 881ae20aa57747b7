//! Feature normalization for maternal risk model inference.
//!
//! Applies the standard-scaling transform fitted at training time
//! so that raw vitals land in the space the classifier was
//! trained on. Features are produced in the exact order expected by the
//! ONNX model.

use crate::error::{Result, RiskError};
use crate::types::reading::{VitalReading, FEATURE_COUNT, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fitted scaler parameters as exported by the training pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

/// Per-feature affine transform `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureNormalizer {
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
}

impl FeatureNormalizer {
    /// Build a normalizer from already-validated parameters
    pub fn new(mean: [f64; FEATURE_COUNT], scale: [f64; FEATURE_COUNT]) -> Result<Self> {
        if let Some((i, s)) = scale
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_finite() || **s == 0.0)
        {
            return Err(RiskError::InvalidInput(format!(
                "scale for {} must be finite and non-zero, got {}",
                FEATURE_NAMES[i], s
            )));
        }
        if let Some((i, m)) = mean.iter().enumerate().find(|(_, m)| !m.is_finite()) {
            return Err(RiskError::InvalidInput(format!(
                "mean for {} must be finite, got {}",
                FEATURE_NAMES[i], m
            )));
        }
        Ok(Self { mean, scale })
    }

    /// Pass-through transform (mean 0, scale 1)
    pub fn identity() -> Self {
        Self {
            mean: [0.0; FEATURE_COUNT],
            scale: [1.0; FEATURE_COUNT],
        }
    }

    pub fn from_params(params: &ScalerParams) -> Result<Self> {
        let mean: [f64; FEATURE_COUNT] = params.mean.as_slice().try_into().map_err(|_| {
            RiskError::InvalidInput(format!(
                "scaler mean has {} entries, expected {}",
                params.mean.len(),
                FEATURE_COUNT
            ))
        })?;
        let scale: [f64; FEATURE_COUNT] = params.scale.as_slice().try_into().map_err(|_| {
            RiskError::InvalidInput(format!(
                "scaler scale has {} entries, expected {}",
                params.scale.len(),
                FEATURE_COUNT
            ))
        })?;

        if let Some(names) = &params.feature_names {
            if names.len() != FEATURE_COUNT {
                return Err(RiskError::InvalidInput(format!(
                    "scaler lists {} feature names, expected {}",
                    names.len(),
                    FEATURE_COUNT
                )));
            }
            if let Some((i, (got, expected))) = names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .enumerate()
                .find(|(_, (got, expected))| got.as_str() != **expected)
            {
                return Err(RiskError::InvalidInput(format!(
                    "scaler feature {} is '{}', expected '{}'",
                    i, got, expected
                )));
            }
        }

        Self::new(mean, scale)
    }

    /// Load scaler parameters from a JSON file. Any failure is an artifact error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| RiskError::artifact(path, e))?;
        let params: ScalerParams =
            serde_json::from_str(&content).map_err(|e| RiskError::artifact(path, e))?;
        Self::from_params(&params).map_err(|e| RiskError::artifact(path, e))
    }

    /// Scale raw values given in model input order.
    pub fn transform(&self, raw: &[f64]) -> Result<Vec<f32>> {
        if raw.len() != FEATURE_COUNT {
            return Err(RiskError::InvalidInput(format!(
                "expected {} features, got {}",
                FEATURE_COUNT,
                raw.len()
            )));
        }

        Ok(self.scale_values(raw))
    }

    /// Scale a reading.
    pub fn transform_reading(&self, reading: &VitalReading) -> Vec<f32> {
        self.scale_values(&reading.to_array())
    }

    fn scale_values(&self, raw: &[f64]) -> Vec<f32> {
        raw.iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (m, s))| ((x - m) / s) as f32)
            .collect()
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names (matching the training column order).
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

impl Default for FeatureNormalizer {
    fn default() -> Self {
        Self::identity()
    }
}
