//! Maternal Risk Pipeline Library
//!
//! Scores maternal health risk from six vital signs: a trained classifier
//! proposes a risk level, and deterministic clinical override rules may
//! escalate it before it is returned.

pub mod config;
pub mod consumer;
pub mod dashboard;
pub mod decision;
pub mod error;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod producer;
pub mod types;
pub mod units;
pub mod validation;

pub use config::AppConfig;
pub use consumer::ReadingConsumer;
pub use decision::{ConfidenceBucket, OverrideRules, OverrideTier};
pub use error::{Result, RiskError};
pub use models::engine::{Evaluation, RiskEngine};
pub use normalizer::FeatureNormalizer;
pub use producer::AssessmentProducer;
pub use types::{PredictionResult, RiskAssessment, RiskLabel, VitalReading};
pub use validation::PlausibilityLimits;
