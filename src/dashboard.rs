//! Reference-range health summary of a reading.
//!
//! Each parameter is graded against a normal range and a narrower optimal
//! range, then the grades are rolled up into counts and an overall score.

use crate::types::{VitalReading, VitalSign};
use serde::{Deserialize, Serialize};

/// Normal and optimal range for one parameter (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
    pub optimal_min: f64,
    pub optimal_max: f64,
}

impl ReferenceRange {
    pub const fn new(min: f64, max: f64, optimal_min: f64, optimal_max: f64) -> Self {
        Self {
            min,
            max,
            optimal_min,
            optimal_max,
        }
    }

    pub fn status(&self, value: f64) -> ParameterStatus {
        if self.optimal_min <= value && value <= self.optimal_max {
            ParameterStatus::Optimal
        } else if self.min <= value && value <= self.max {
            ParameterStatus::Acceptable
        } else {
            ParameterStatus::Alert
        }
    }
}

/// Reference ranges for a parameter
pub fn reference_range(vital: VitalSign) -> ReferenceRange {
    match vital {
        VitalSign::Age => ReferenceRange::new(18.0, 45.0, 20.0, 35.0),
        VitalSign::SystolicBp => ReferenceRange::new(90.0, 120.0, 100.0, 115.0),
        VitalSign::DiastolicBp => ReferenceRange::new(60.0, 80.0, 65.0, 75.0),
        VitalSign::BloodSugar => ReferenceRange::new(6.0, 7.8, 6.2, 7.2),
        VitalSign::BodyTemp => ReferenceRange::new(97.0, 99.0, 97.5, 98.6),
        VitalSign::HeartRate => ReferenceRange::new(60.0, 100.0, 70.0, 85.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterStatus {
    Optimal,
    Acceptable,
    Alert,
}

impl ParameterStatus {
    /// Per-parameter contribution to the overall score
    pub fn score(&self) -> f64 {
        match self {
            ParameterStatus::Optimal => 100.0,
            ParameterStatus::Acceptable => 70.0,
            ParameterStatus::Alert => 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterAssessment {
    pub vital: VitalSign,
    pub value: f64,
    pub range: ReferenceRange,
    pub status: ParameterStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallRating {
    Excellent,
    Good,
    Fair,
}

impl OverallRating {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            OverallRating::Excellent
        } else if score >= 70.0 {
            OverallRating::Good
        } else {
            OverallRating::Fair
        }
    }
}

/// Roll-up of all six parameter grades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub parameters: Vec<ParameterAssessment>,
    /// Parameters within their optimal range
    pub optimal_count: usize,
    /// Parameters outside their normal range
    pub attention_count: usize,
    /// Mean of per-parameter scores, 30..=100
    pub overall_score: f64,
    pub rating: OverallRating,
}

impl HealthSummary {
    pub fn for_reading(reading: &VitalReading) -> Self {
        let parameters: Vec<ParameterAssessment> = VitalSign::ALL
            .iter()
            .map(|&vital| {
                let value = vital.value(reading);
                let range = reference_range(vital);
                ParameterAssessment {
                    vital,
                    value,
                    range,
                    status: range.status(value),
                }
            })
            .collect();

        let optimal_count = parameters
            .iter()
            .filter(|p| p.status == ParameterStatus::Optimal)
            .count();
        let attention_count = parameters
            .iter()
            .filter(|p| p.status == ParameterStatus::Alert)
            .count();
        let overall_score =
            parameters.iter().map(|p| p.status.score()).sum::<f64>() / parameters.len() as f64;

        Self {
            parameters,
            optimal_count,
            attention_count,
            overall_score,
            rating: OverallRating::from_score(overall_score),
        }
    }

    /// "Good" with at least four optimal parameters
    pub fn optimal_verdict(&self) -> &'static str {
        if self.optimal_count >= 4 {
            "Good"
        } else {
            "Needs Attention"
        }
    }

    pub fn attention_verdict(&self) -> &'static str {
        if self.attention_count > 0 {
            "Monitor"
        } else {
            "All Good"
        }
    }
}
