//! Decision layer: clinical overrides and confidence bucketing

pub mod confidence;
pub mod overrides;

pub use confidence::ConfidenceBucket;
pub use overrides::{OverrideOutcome, OverrideRule, OverrideRules, OverrideTier, Threshold};
