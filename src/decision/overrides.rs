//! Clinical safety overrides applied on top of the classifier's label.
//!
//! Rules are grouped into ordered tiers. Tiers are checked top-down and the
//! first tier with any firing condition escalates the label to its target;
//! later tiers are skipped. Escalation takes the more severe of the base and
//! target labels, so an override can never lower the classifier's output.

use crate::types::{RiskLabel, VitalReading, VitalSign};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which override tier matched a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideTier {
    /// Absolute danger thresholds, escalate to high risk
    Hard,
    /// Borderline thresholds, escalate low risk to mid risk
    Soft,
}

impl OverrideTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideTier::Hard => "hard",
            OverrideTier::Soft => "soft",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    AtLeast,
    Above,
    Below,
}

/// A single raw-value threshold check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub vital: VitalSign,
    pub comparison: Comparison,
    pub limit: f64,
}

impl Threshold {
    pub const fn at_least(vital: VitalSign, limit: f64) -> Self {
        Self {
            vital,
            comparison: Comparison::AtLeast,
            limit,
        }
    }

    pub const fn above(vital: VitalSign, limit: f64) -> Self {
        Self {
            vital,
            comparison: Comparison::Above,
            limit,
        }
    }

    pub const fn below(vital: VitalSign, limit: f64) -> Self {
        Self {
            vital,
            comparison: Comparison::Below,
            limit,
        }
    }

    pub fn matches(&self, reading: &VitalReading) -> bool {
        let value = self.vital.value(reading);
        match self.comparison {
            Comparison::AtLeast => value >= self.limit,
            Comparison::Above => value > self.limit,
            Comparison::Below => value < self.limit,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.comparison {
            Comparison::AtLeast => ">=",
            Comparison::Above => ">",
            Comparison::Below => "<",
        };
        write!(f, "{} {} {}", self.vital.field_name(), op, self.limit)
    }
}

const HARD_THRESHOLDS: [Threshold; 7] = [
    Threshold::at_least(VitalSign::SystolicBp, 140.0),
    Threshold::at_least(VitalSign::DiastolicBp, 90.0),
    Threshold::at_least(VitalSign::BloodSugar, 11.1),
    Threshold::at_least(VitalSign::BodyTemp, 100.4),
    Threshold::at_least(VitalSign::HeartRate, 110.0),
    Threshold::below(VitalSign::Age, 18.0),
    Threshold::above(VitalSign::Age, 35.0),
];

const SOFT_THRESHOLDS: [Threshold; 5] = [
    Threshold::at_least(VitalSign::SystolicBp, 120.0),
    Threshold::at_least(VitalSign::DiastolicBp, 80.0),
    Threshold::at_least(VitalSign::BloodSugar, 7.0),
    Threshold::at_least(VitalSign::BodyTemp, 99.0),
    Threshold::at_least(VitalSign::HeartRate, 90.0),
];

/// A tier of thresholds sharing one escalation target
#[derive(Debug, Clone)]
pub struct OverrideRule {
    pub tier: OverrideTier,
    pub target: RiskLabel,
    pub thresholds: Vec<Threshold>,
}

impl OverrideRule {
    /// Thresholds of this rule that the reading trips
    pub fn triggered(&self, reading: &VitalReading) -> Vec<Threshold> {
        self.thresholds
            .iter()
            .filter(|t| t.matches(reading))
            .copied()
            .collect()
    }
}

/// Outcome of running the override rules against one reading
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideOutcome {
    /// Label after escalation
    pub risk_level: RiskLabel,
    /// Tier that matched, `None` when no condition fired
    pub tier: Option<OverrideTier>,
    /// Conditions that fired in the matching tier
    pub triggered: Vec<Threshold>,
}

impl OverrideOutcome {
    pub fn triggered_names(&self) -> Vec<String> {
        self.triggered.iter().map(|t| t.to_string()).collect()
    }
}

/// Ordered override rule set
#[derive(Debug, Clone)]
pub struct OverrideRules {
    rules: Vec<OverrideRule>,
}

impl OverrideRules {
    pub fn new(rules: Vec<OverrideRule>) -> Self {
        Self { rules }
    }

    /// The clinical rule set: hard thresholds first, then soft thresholds.
    pub fn clinical() -> Self {
        Self::new(vec![
            OverrideRule {
                tier: OverrideTier::Hard,
                target: RiskLabel::High,
                thresholds: HARD_THRESHOLDS.to_vec(),
            },
            OverrideRule {
                tier: OverrideTier::Soft,
                target: RiskLabel::Mid,
                thresholds: SOFT_THRESHOLDS.to_vec(),
            },
        ])
    }

    pub fn rules(&self) -> &[OverrideRule] {
        &self.rules
    }

    /// Escalate `base` according to the first tier with a firing condition.
    pub fn apply(&self, base: RiskLabel, reading: &VitalReading) -> OverrideOutcome {
        for rule in &self.rules {
            let triggered = rule.triggered(reading);
            if !triggered.is_empty() {
                return OverrideOutcome {
                    risk_level: base.escalate_to(rule.target),
                    tier: Some(rule.tier),
                    triggered,
                };
            }
        }

        OverrideOutcome {
            risk_level: base,
            tier: None,
            triggered: Vec::new(),
        }
    }
}

impl Default for OverrideRules {
    fn default() -> Self {
        Self::clinical()
    }
}
