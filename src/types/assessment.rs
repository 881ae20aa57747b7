//! Risk assessment data structures

use crate::dashboard::HealthSummary;
use crate::decision::{ConfidenceBucket, OverrideTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Maternal risk category, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    #[serde(rename = "low risk")]
    Low,
    #[serde(rename = "mid risk")]
    Mid,
    #[serde(rename = "high risk")]
    High,
}

impl RiskLabel {
    pub const ALL: [RiskLabel; 3] = [RiskLabel::Low, RiskLabel::Mid, RiskLabel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Low => "low risk",
            RiskLabel::Mid => "mid risk",
            RiskLabel::High => "high risk",
        }
    }

    /// The more severe of two labels
    pub fn escalate_to(self, target: RiskLabel) -> RiskLabel {
        self.max(target)
    }

    /// Follow-up priority for a reading at this level
    pub fn priority(&self) -> Priority {
        match self {
            RiskLabel::Low => Priority::Normal,
            RiskLabel::Mid => Priority::Moderate,
            RiskLabel::High => Priority::Urgent,
        }
    }

    /// Guidance shown alongside an assessment at this level
    pub fn recommended_actions(&self) -> &'static [&'static str] {
        match self {
            RiskLabel::Low => &[
                "Maintain regular prenatal checkups",
                "Continue healthy lifestyle habits",
                "Stay hydrated and eat nutritious food",
                "Light exercise as recommended by doctor",
            ],
            RiskLabel::Mid => &[
                "Schedule a doctor's appointment soon",
                "Monitor blood pressure daily",
                "Maintain a healthy diet and exercise routine",
                "Keep track of any symptoms",
            ],
            RiskLabel::High => &[
                "Contact your healthcare provider immediately",
                "Do not delay medical consultation",
                "Monitor symptoms closely",
            ],
        }
    }
}

/// How soon a reading needs clinical follow-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Normal,
    Moderate,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "NORMAL",
            Priority::Moderate => "MODERATE",
            Priority::Urgent => "URGENT",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low risk" => Ok(RiskLabel::Low),
            "mid risk" => Ok(RiskLabel::Mid),
            "high risk" => Ok(RiskLabel::High),
            other => Err(format!("unknown risk label '{}'", other)),
        }
    }
}

/// Result handed back to the caller for one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Final risk level after clinical overrides
    pub risk_level: RiskLabel,

    /// Confidence range from the classifier's own winning probability
    pub confidence: ConfidenceBucket,

    /// Raw classifier probabilities as percentages ("91.00%")
    pub probabilities: BTreeMap<RiskLabel, String>,
}

/// Assessment published for a reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Unique assessment identifier
    pub assessment_id: String,

    /// Id of the reading this assessment answers
    pub reading_id: String,

    #[serde(flatten)]
    pub result: PredictionResult,

    /// Follow-up priority for the final risk level
    pub priority: Priority,

    /// Guidance for the final risk level
    pub recommended_actions: Vec<String>,

    /// Label the classifier produced before overrides
    pub model_label: RiskLabel,

    /// Override tier that matched, if any
    pub override_tier: Option<OverrideTier>,

    /// Threshold conditions that fired in the matching tier
    pub triggered_rules: Vec<String>,

    /// Reference-range summary of the reading
    pub health_summary: Option<HealthSummary>,

    pub timestamp: DateTime<Utc>,
}

impl RiskAssessment {
    /// Priority and recommended actions follow the final risk level
    pub fn new(reading_id: String, result: PredictionResult, model_label: RiskLabel) -> Self {
        let level = result.risk_level;
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            reading_id,
            result,
            priority: level.priority(),
            recommended_actions: level
                .recommended_actions()
                .iter()
                .map(|a| a.to_string())
                .collect(),
            model_label,
            override_tier: None,
            triggered_rules: Vec::new(),
            health_summary: None,
            timestamp: Utc::now(),
        }
    }

    /// Record which override tier matched and why
    pub fn with_override(mut self, tier: Option<OverrideTier>, triggered: Vec<String>) -> Self {
        self.override_tier = tier;
        self.triggered_rules = triggered;
        self
    }

    pub fn with_health_summary(mut self, summary: HealthSummary) -> Self {
        self.health_summary = Some(summary);
        self
    }
}
