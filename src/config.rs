//! Configuration management for the maternal risk pipeline

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming vital readings
    pub reading_subject: String,
    /// Subject for outgoing risk assessments
    pub assessment_subject: String,
}

/// Model artifacts configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing the trained artifacts
    pub models_dir: String,
    /// ONNX classifier file, relative to `models_dir`
    #[serde(default = "default_classifier_file")]
    pub classifier_file: String,
    /// Fitted scaler parameters (JSON), relative to `models_dir`
    #[serde(default = "default_scaler_file")]
    pub scaler_file: String,
    /// Label -> class index mapping (JSON), relative to `models_dir`
    #[serde(default = "default_label_mapping_file")]
    pub label_mapping_file: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_classifier_file() -> String {
    "classifier.onnx".to_string()
}

fn default_scaler_file() -> String {
    "scaler.json".to_string()
}

fn default_label_mapping_file() -> String {
    "risk_mapping.json".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            models_dir: "models".to_string(),
            classifier_file: default_classifier_file(),
            scaler_file: default_scaler_file(),
            label_mapping_file: default_label_mapping_file(),
            onnx_threads: default_onnx_threads(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum readings processed concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
    /// Attach the reference-range health summary to assessments
    #[serde(default = "default_include_health_summary")]
    pub include_health_summary: bool,
}

fn default_metrics_interval() -> u64 {
    30
}

fn default_include_health_summary() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path, with `MATERNAL_RISK__*` environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MATERNAL_RISK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                reading_subject: "maternal.readings".to_string(),
                assessment_subject: "maternal.assessments".to_string(),
            },
            models: ModelsConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: default_metrics_interval(),
                include_health_summary: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.reading_subject, "maternal.readings");
        assert_eq!(config.models.classifier_file, "classifier.onnx");
        assert_eq!(config.models.label_mapping_file, "risk_mapping.json");
        assert_eq!(config.pipeline.workers, 4);
    }

    #[test]
    fn test_load_from_file_applies_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[nats]
url = "nats://nats:4222"
reading_subject = "clinic.readings"
assessment_subject = "clinic.assessments"

[models]
models_dir = "/srv/models"

[pipeline]
workers = 8

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.nats.reading_subject, "clinic.readings");
        assert_eq!(config.models.models_dir, "/srv/models");
        assert_eq!(config.models.scaler_file, "scaler.json");
        assert_eq!(config.models.onnx_threads, 1);
        assert_eq!(config.pipeline.workers, 8);
        assert_eq!(config.pipeline.metrics_interval_secs, 30);
        assert!(config.pipeline.include_health_summary);
        assert_eq!(config.logging.format, "json");
    }
}
