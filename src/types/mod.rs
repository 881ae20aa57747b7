//! Type definitions for the maternal risk pipeline

pub mod assessment;
pub mod reading;

pub use assessment::{PredictionResult, Priority, RiskAssessment, RiskLabel};
pub use reading::{ReadingMessage, VitalReading, VitalSign, FEATURE_COUNT, FEATURE_NAMES};
