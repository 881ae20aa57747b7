//! Confidence bucketing of the classifier's winning probability

use serde::{Deserialize, Serialize};
use std::fmt;

/// Human-readable confidence range reported alongside a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceBucket {
    #[serde(rename = "50-55%")]
    From50To55,
    #[serde(rename = "55-70%")]
    From55To70,
    #[serde(rename = "70-80%")]
    From70To80,
    #[serde(rename = "80-90%")]
    From80To90,
    #[serde(rename = "95-98%")]
    From95To98,
}

/// Lower bounds (percent, inclusive), checked top-down
const BUCKET_TABLE: [(f64, ConfidenceBucket); 4] = [
    (95.0, ConfidenceBucket::From95To98),
    (80.0, ConfidenceBucket::From80To90),
    (70.0, ConfidenceBucket::From70To80),
    (55.0, ConfidenceBucket::From55To70),
];

impl ConfidenceBucket {
    pub const ALL: [ConfidenceBucket; 5] = [
        ConfidenceBucket::From50To55,
        ConfidenceBucket::From55To70,
        ConfidenceBucket::From70To80,
        ConfidenceBucket::From80To90,
        ConfidenceBucket::From95To98,
    ];

    /// Bucket a probability in `[0, 1]`
    pub fn from_probability(probability: f64) -> Self {
        Self::from_percent(probability * 100.0)
    }

    /// Bucket a percentage in `[0, 100]`; anything below the table is 50-55%
    pub fn from_percent(percent: f64) -> Self {
        BUCKET_TABLE
            .iter()
            .find(|(lower, _)| percent >= *lower)
            .map(|(_, bucket)| *bucket)
            .unwrap_or(ConfidenceBucket::From50To55)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBucket::From50To55 => "50-55%",
            ConfidenceBucket::From55To70 => "55-70%",
            ConfidenceBucket::From70To80 => "70-80%",
            ConfidenceBucket::From80To90 => "80-90%",
            ConfidenceBucket::From95To98 => "95-98%",
        }
    }
}

impl fmt::Display for ConfidenceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_probabilities() {
        assert_eq!(ConfidenceBucket::from_probability(0.955).as_str(), "95-98%");
        assert_eq!(ConfidenceBucket::from_probability(0.82).as_str(), "80-90%");
        assert_eq!(ConfidenceBucket::from_probability(0.91).as_str(), "80-90%");
        assert_eq!(ConfidenceBucket::from_probability(0.75).as_str(), "70-80%");
        assert_eq!(ConfidenceBucket::from_probability(0.60).as_str(), "55-70%");
        assert_eq!(ConfidenceBucket::from_probability(0.50).as_str(), "50-55%");
    }

    #[test]
    fn test_lower_bounds_inclusive() {
        assert_eq!(ConfidenceBucket::from_percent(95.0), ConfidenceBucket::From95To98);
        assert_eq!(ConfidenceBucket::from_percent(94.99), ConfidenceBucket::From80To90);
        assert_eq!(ConfidenceBucket::from_percent(80.0), ConfidenceBucket::From80To90);
        assert_eq!(ConfidenceBucket::from_percent(79.99), ConfidenceBucket::From70To80);
        assert_eq!(ConfidenceBucket::from_percent(70.0), ConfidenceBucket::From70To80);
        assert_eq!(ConfidenceBucket::from_percent(55.0), ConfidenceBucket::From55To70);
        assert_eq!(ConfidenceBucket::from_percent(54.99), ConfidenceBucket::From50To55);
    }

    #[test]
    fn test_low_and_full_probabilities() {
        // Three classes can produce a winner below 50%; it still lands in the bottom bucket
        assert_eq!(ConfidenceBucket::from_probability(0.34), ConfidenceBucket::From50To55);
        assert_eq!(ConfidenceBucket::from_probability(1.0), ConfidenceBucket::From95To98);
    }

    #[test]
    fn test_serializes_as_range_string() {
        let json = serde_json::to_string(&ConfidenceBucket::From55To70).unwrap();
        assert_eq!(json, "\"55-70%\"");
        for bucket in ConfidenceBucket::ALL {
            assert_eq!(bucket.to_string(), bucket.as_str());
        }
    }
}
