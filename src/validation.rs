//! Plausibility checks applied by callers before asking for a prediction.
//!
//! The decision engine never enforces these ranges; readings outside them
//! are a caller-side rejection.

use crate::types::{VitalReading, VitalSign};
use serde::{Deserialize, Serialize};

/// Inclusive plausible range for one parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
}

impl PlausibleRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// A parameter that fell outside its plausible range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeViolation {
    pub vital: VitalSign,
    pub value: f64,
    pub range: PlausibleRange,
}

impl RangeViolation {
    /// Message shown to whoever entered the reading
    pub fn message(&self) -> String {
        format!(
            "{} must be between {} and {} {}",
            self.vital.display_name(),
            self.range.min,
            self.range.max,
            self.vital.unit()
        )
    }
}

impl std::fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (got {})", self.message(), self.value)
    }
}

/// Plausible ranges for every parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlausibilityLimits {
    pub age: PlausibleRange,
    pub systolic_bp: PlausibleRange,
    pub diastolic_bp: PlausibleRange,
    pub blood_sugar: PlausibleRange,
    pub body_temp: PlausibleRange,
    pub heart_rate: PlausibleRange,
}

impl Default for PlausibilityLimits {
    fn default() -> Self {
        Self {
            age: PlausibleRange::new(10.0, 70.0),
            systolic_bp: PlausibleRange::new(70.0, 200.0),
            diastolic_bp: PlausibleRange::new(40.0, 120.0),
            blood_sugar: PlausibleRange::new(5.0, 20.0),
            body_temp: PlausibleRange::new(96.0, 104.0),
            heart_rate: PlausibleRange::new(60.0, 120.0),
        }
    }
}

impl PlausibilityLimits {
    pub fn range_for(&self, vital: VitalSign) -> PlausibleRange {
        match vital {
            VitalSign::Age => self.age,
            VitalSign::SystolicBp => self.systolic_bp,
            VitalSign::DiastolicBp => self.diastolic_bp,
            VitalSign::BloodSugar => self.blood_sugar,
            VitalSign::BodyTemp => self.body_temp,
            VitalSign::HeartRate => self.heart_rate,
        }
    }

    /// Every parameter outside its range, in input order. Empty means valid.
    pub fn check(&self, reading: &VitalReading) -> Vec<RangeViolation> {
        VitalSign::ALL
            .iter()
            .filter_map(|&vital| {
                let value = vital.value(reading);
                let range = self.range_for(vital);
                (!range.contains(value)).then_some(RangeViolation {
                    vital,
                    value,
                    range,
                })
            })
            .collect()
    }

    pub fn is_plausible(&self, reading: &VitalReading) -> bool {
        self.check(reading).is_empty()
    }
}
