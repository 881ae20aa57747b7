//! Error types for the risk scoring core

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by artifact loading and prediction
#[derive(Error, Debug)]
pub enum RiskError {
    /// A model artifact is missing or corrupt. Fatal at startup.
    #[error("Failed to load artifact {path}: {reason}")]
    ArtifactLoad { path: PathBuf, reason: String },

    /// The caller passed a reading with the wrong shape or non-finite values
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The classifier produced output the engine cannot interpret
    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("ONNX Runtime error: {0}")]
    Onnx(#[from] ort::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RiskError {
    pub fn artifact(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        RiskError::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;
