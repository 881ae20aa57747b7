//! Vital-sign reading data structures

use crate::error::{Result, RiskError};
use crate::units::{GlucoseUnit, TemperatureUnit};
use serde::{Deserialize, Serialize};

/// Number of features in a reading, and in the classifier input
pub const FEATURE_COUNT: usize = 6;

/// Feature names in model input order (matching the training data columns)
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Age",
    "SystolicBP",
    "DiastolicBP",
    "BS",
    "BodyTemp",
    "HeartRate",
];

/// One set of maternal vital signs, the input to a single prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalReading {
    /// Age in years
    #[serde(alias = "Age")]
    pub age: f64,

    /// Systolic blood pressure (mmHg)
    #[serde(alias = "SystolicBP")]
    pub systolic_bp: f64,

    /// Diastolic blood pressure (mmHg)
    #[serde(alias = "DiastolicBP")]
    pub diastolic_bp: f64,

    /// Blood sugar (mmol/L)
    #[serde(alias = "BS")]
    pub blood_sugar: f64,

    /// Body temperature (°F)
    #[serde(alias = "BodyTemp")]
    pub body_temp: f64,

    /// Heart rate (bpm)
    #[serde(alias = "HeartRate")]
    pub heart_rate: f64,
}

impl VitalReading {
    pub fn new(
        age: f64,
        systolic_bp: f64,
        diastolic_bp: f64,
        blood_sugar: f64,
        body_temp: f64,
        heart_rate: f64,
    ) -> Self {
        Self {
            age,
            systolic_bp,
            diastolic_bp,
            blood_sugar,
            body_temp,
            heart_rate,
        }
    }

    /// Build a reading from raw values in model input order.
    ///
    /// Any length other than [`FEATURE_COUNT`] is a caller contract violation.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match *values {
            [age, systolic_bp, diastolic_bp, blood_sugar, body_temp, heart_rate] => Ok(Self::new(
                age,
                systolic_bp,
                diastolic_bp,
                blood_sugar,
                body_temp,
                heart_rate,
            )),
            _ => Err(RiskError::InvalidInput(format!(
                "expected {} features, got {}",
                FEATURE_COUNT,
                values.len()
            ))),
        }
    }

    /// Raw values in model input order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.systolic_bp,
            self.diastolic_bp,
            self.blood_sugar,
            self.body_temp,
            self.heart_rate,
        ]
    }

    /// Reject NaN and infinite values; they are never coerced.
    pub fn ensure_finite(&self) -> Result<()> {
        for vital in VitalSign::ALL {
            let value = vital.value(self);
            if !value.is_finite() {
                return Err(RiskError::InvalidInput(format!(
                    "{} must be a finite number, got {}",
                    vital.field_name(),
                    value
                )));
            }
        }
        Ok(())
    }
}

/// One of the six measured parameters of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalSign {
    Age,
    SystolicBp,
    DiastolicBp,
    BloodSugar,
    BodyTemp,
    HeartRate,
}

impl VitalSign {
    /// All parameters in model input order
    pub const ALL: [VitalSign; FEATURE_COUNT] = [
        VitalSign::Age,
        VitalSign::SystolicBp,
        VitalSign::DiastolicBp,
        VitalSign::BloodSugar,
        VitalSign::BodyTemp,
        VitalSign::HeartRate,
    ];

    pub fn value(&self, reading: &VitalReading) -> f64 {
        match self {
            VitalSign::Age => reading.age,
            VitalSign::SystolicBp => reading.systolic_bp,
            VitalSign::DiastolicBp => reading.diastolic_bp,
            VitalSign::BloodSugar => reading.blood_sugar,
            VitalSign::BodyTemp => reading.body_temp,
            VitalSign::HeartRate => reading.heart_rate,
        }
    }

    /// Field name as used in messages and rule descriptions
    pub fn field_name(&self) -> &'static str {
        match self {
            VitalSign::Age => "age",
            VitalSign::SystolicBp => "systolic_bp",
            VitalSign::DiastolicBp => "diastolic_bp",
            VitalSign::BloodSugar => "blood_sugar",
            VitalSign::BodyTemp => "body_temp",
            VitalSign::HeartRate => "heart_rate",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            VitalSign::Age => "Age",
            VitalSign::SystolicBp => "Systolic BP",
            VitalSign::DiastolicBp => "Diastolic BP",
            VitalSign::BloodSugar => "Blood Sugar",
            VitalSign::BodyTemp => "Body Temperature",
            VitalSign::HeartRate => "Heart Rate",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            VitalSign::Age => "years",
            VitalSign::SystolicBp | VitalSign::DiastolicBp => "mmHg",
            VitalSign::BloodSugar => "mmol/L",
            VitalSign::BodyTemp => "°F",
            VitalSign::HeartRate => "bpm",
        }
    }
}

/// Reading as it arrives on the wire, tagged with a caller-chosen id.
///
/// Blood sugar may be sent in mg/dL and temperature in °C when tagged;
/// untagged values are taken as mmol/L and °F.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingMessage {
    pub reading_id: String,

    #[serde(flatten)]
    pub reading: VitalReading,

    #[serde(default)]
    pub glucose_unit: GlucoseUnit,

    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
}

impl ReadingMessage {
    /// Message for a reading already in model units
    pub fn new(reading_id: String, reading: VitalReading) -> Self {
        Self {
            reading_id,
            reading,
            glucose_unit: GlucoseUnit::default(),
            temperature_unit: TemperatureUnit::default(),
        }
    }

    /// The reading converted to mmol/L and °F
    pub fn canonical_reading(&self) -> VitalReading {
        VitalReading {
            blood_sugar: self.glucose_unit.to_mmol(self.reading.blood_sugar),
            body_temp: self.temperature_unit.to_fahrenheit(self.reading.body_temp),
            ..self.reading
        }
    }
}
