//! Unit conversions for readings taken in other units

use serde::{Deserialize, Serialize};

/// mg/dL per mmol/L for glucose
const GLUCOSE_MGDL_PER_MMOL: f64 = 18.0;

/// Blood sugar in mg/dL to mmol/L
pub fn mgdl_to_mmol(mgdl: f64) -> f64 {
    mgdl / GLUCOSE_MGDL_PER_MMOL
}

/// Body temperature in °C to °F
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Unit a blood sugar value was measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GlucoseUnit {
    #[default]
    #[serde(rename = "mmol/L")]
    MmolPerL,
    #[serde(rename = "mg/dL")]
    MgPerDl,
}

impl GlucoseUnit {
    /// Value in mmol/L, the unit the model was trained on
    pub fn to_mmol(&self, value: f64) -> f64 {
        match self {
            GlucoseUnit::MmolPerL => value,
            GlucoseUnit::MgPerDl => mgdl_to_mmol(value),
        }
    }
}

/// Unit a body temperature was measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "F")]
    Fahrenheit,
    #[serde(rename = "C")]
    Celsius,
}

impl TemperatureUnit {
    /// Value in °F, the unit the model was trained on
    pub fn to_fahrenheit(&self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Fahrenheit => value,
            TemperatureUnit::Celsius => celsius_to_fahrenheit(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glucose() {
        assert!((mgdl_to_mmol(126.0) - 7.0).abs() < 1e-9);
        assert!((mgdl_to_mmol(200.0) - 11.11).abs() < 0.01);
    }

    #[test]
    fn test_temperature() {
        assert!((celsius_to_fahrenheit(37.0) - 98.6).abs() < 1e-9);
        assert!((celsius_to_fahrenheit(38.0) - 100.4).abs() < 1e-9);
    }

    #[test]
    fn test_unit_tags() {
        assert_eq!(GlucoseUnit::MmolPerL.to_mmol(7.5), 7.5);
        assert!((GlucoseUnit::MgPerDl.to_mmol(126.0) - 7.0).abs() < 1e-9);
        assert_eq!(TemperatureUnit::Fahrenheit.to_fahrenheit(98.6), 98.6);
        assert!((TemperatureUnit::Celsius.to_fahrenheit(37.0) - 98.6).abs() < 1e-9);

        let unit: GlucoseUnit = serde_json::from_str(r#""mg/dL""#).unwrap();
        assert_eq!(unit, GlucoseUnit::MgPerDl);
        let unit: TemperatureUnit = serde_json::from_str(r#""C""#).unwrap();
        assert_eq!(unit, TemperatureUnit::Celsius);
    }
}
