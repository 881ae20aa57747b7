//! Risk decision engine: classifier output plus clinical overrides

use crate::config::ModelsConfig;
use crate::dashboard::HealthSummary;
use crate::decision::{ConfidenceBucket, OverrideOutcome, OverrideRules};
use crate::error::{Result, RiskError};
use crate::models::classifier::{Classifier, ClassifierOutput};
use crate::models::labels::LabelMapping;
use crate::models::loader::ModelLoader;
use crate::normalizer::FeatureNormalizer;
use crate::types::{PredictionResult, RiskAssessment, RiskLabel, VitalReading};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Prediction together with the trail of how it was reached
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// What the caller sees
    pub result: PredictionResult,
    /// Label decoded from the classifier before overrides
    pub model_label: RiskLabel,
    /// Probability the classifier gave its own prediction
    pub model_probability: f64,
    /// Override rules outcome
    pub overrides: OverrideOutcome,
}

impl Evaluation {
    /// Whether overrides changed the classifier's label
    pub fn escalated(&self) -> bool {
        self.result.risk_level != self.model_label
    }

    /// Convert the evaluation into a publishable assessment
    pub fn to_assessment(&self, reading_id: &str, reading: &VitalReading) -> RiskAssessment {
        RiskAssessment::new(reading_id.to_string(), self.result.clone(), self.model_label)
            .with_override(self.overrides.tier, self.overrides.triggered_names())
            .with_health_summary(HealthSummary::for_reading(reading))
    }
}

/// Owns the trained artifacts and turns readings into risk predictions.
///
/// Holds no per-call state; share it behind an `Arc`.
pub struct RiskEngine {
    classifier: Box<dyn Classifier>,
    normalizer: FeatureNormalizer,
    labels: LabelMapping,
    rules: OverrideRules,
}

impl RiskEngine {
    /// Create an engine from loaded parts, with the clinical override rules
    pub fn new(
        classifier: Box<dyn Classifier>,
        normalizer: FeatureNormalizer,
        labels: LabelMapping,
    ) -> Self {
        Self {
            classifier,
            normalizer,
            labels,
            rules: OverrideRules::clinical(),
        }
    }

    /// Load all artifacts from the models configuration. Failures are fatal.
    pub fn from_config(config: &ModelsConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.onnx_threads)?;
        let artifacts = loader.load_artifacts(config)?;

        info!(
            classifier = %config.classifier_file,
            classes = artifacts.labels.len(),
            "Risk engine initialized"
        );

        Ok(Self::new(
            Box::new(artifacts.classifier),
            artifacts.normalizer,
            artifacts.labels,
        ))
    }

    /// Replace the override rule set
    pub fn with_rules(mut self, rules: OverrideRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn labels(&self) -> &LabelMapping {
        &self.labels
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Predict the risk level for one reading
    pub fn predict(&self, reading: &VitalReading) -> Result<PredictionResult> {
        self.evaluate(reading).map(|evaluation| evaluation.result)
    }

    /// Predict from raw values in model input order
    pub fn predict_values(&self, values: &[f64]) -> Result<PredictionResult> {
        let reading = VitalReading::from_slice(values)?;
        self.predict(&reading)
    }

    /// Run inference on a batch of readings
    pub fn predict_batch(&self, readings: &[VitalReading]) -> Vec<Result<PredictionResult>> {
        readings.iter().map(|r| self.predict(r)).collect()
    }

    /// Predict and keep the decision trail
    pub fn evaluate(&self, reading: &VitalReading) -> Result<Evaluation> {
        reading.ensure_finite()?;

        let features = self.normalizer.transform_reading(reading);
        let output = self.classifier.predict(&features)?;
        let (model_label, model_probability) = self.decode(&output)?;

        let overrides = self.rules.apply(model_label, reading);
        let confidence = ConfidenceBucket::from_probability(model_probability);

        let probabilities: BTreeMap<RiskLabel, String> = self
            .labels
            .class_names()
            .iter()
            .zip(output.probabilities.iter())
            .map(|(label, p)| (*label, format_percent(*p)))
            .collect();

        debug!(
            model_label = %model_label,
            model_probability = model_probability,
            risk_level = %overrides.risk_level,
            override_tier = ?overrides.tier,
            confidence = %confidence,
            "Reading evaluated"
        );

        Ok(Evaluation {
            result: PredictionResult {
                risk_level: overrides.risk_level,
                confidence,
                probabilities,
            },
            model_label,
            model_probability,
            overrides,
        })
    }

    /// Map the classifier's index to a label and its winning probability
    fn decode(&self, output: &ClassifierOutput) -> Result<(RiskLabel, f64)> {
        if output.probabilities.len() != self.labels.len() {
            return Err(RiskError::Classifier(format!(
                "expected {} class probabilities, got {}",
                self.labels.len(),
                output.probabilities.len()
            )));
        }

        let label = self.labels.label_for(output.class_index).ok_or_else(|| {
            RiskError::Classifier(format!("unknown class index {}", output.class_index))
        })?;
        let probability = output.winning_probability().ok_or_else(|| {
            RiskError::Classifier(format!(
                "no probability for class index {}",
                output.class_index
            ))
        })?;

        Ok((label, probability))
    }
}

/// Format a probability as a percentage with two decimals ("91.00%")
pub fn format_percent(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::OverrideTier;
    use crate::types::Priority;

    /// Classifier that always returns the same output
    struct FixedClassifier {
        output: ClassifierOutput,
    }

    impl Classifier for FixedClassifier {
        fn predict(&self, features: &[f32]) -> Result<ClassifierOutput> {
            assert_eq!(features.len(), 6);
            Ok(self.output.clone())
        }
    }

    /// Engine whose classifier predicts `label` with probability `p`
    fn engine_predicting(label: RiskLabel, p: f64) -> RiskEngine {
        let labels = LabelMapping::default();
        let winner = labels.index_for(label);
        let rest = (1.0 - p) / 2.0;
        let probabilities = (0..labels.len())
            .map(|i| if i == winner { p } else { rest })
            .collect();

        RiskEngine::new(
            Box::new(FixedClassifier {
                output: ClassifierOutput {
                    class_index: winner,
                    probabilities,
                },
            }),
            FeatureNormalizer::identity(),
            labels,
        )
    }

    fn nominal() -> VitalReading {
        VitalReading::new(25.0, 110.0, 70.0, 6.0, 98.0, 76.0)
    }

    fn percent_sum(result: &PredictionResult) -> f64 {
        result
            .probabilities
            .values()
            .map(|p| p.trim_end_matches('%').parse::<f64>().unwrap())
            .sum()
    }

    #[test]
    fn test_hard_override_from_systolic() {
        let engine = engine_predicting(RiskLabel::Low, 0.91);
        let reading = VitalReading::new(30.0, 150.0, 75.0, 6.5, 98.0, 75.0);

        let result = engine.predict(&reading).unwrap();
        assert_eq!(result.risk_level, RiskLabel::High);
        assert_eq!(result.confidence.as_str(), "80-90%");
        assert_eq!(result.probabilities[&RiskLabel::Low], "91.00%");
    }

    #[test]
    fn test_soft_override_from_systolic() {
        let engine = engine_predicting(RiskLabel::Low, 0.60);
        let reading = VitalReading::new(28.0, 122.0, 78.0, 6.8, 98.2, 80.0);

        let result = engine.predict(&reading).unwrap();
        assert_eq!(result.risk_level, RiskLabel::Mid);
        assert_eq!(result.confidence.as_str(), "55-70%");
    }

    #[test]
    fn test_age_outside_range_is_high() {
        let engine = engine_predicting(RiskLabel::Low, 0.97);
        let reading = VitalReading { age: 40.0, ..nominal() };

        let evaluation = engine.evaluate(&reading).unwrap();
        assert_eq!(evaluation.result.risk_level, RiskLabel::High);
        assert_eq!(evaluation.overrides.tier, Some(OverrideTier::Hard));
        assert_eq!(evaluation.overrides.triggered_names(), vec!["age > 35".to_string()]);
        assert!(evaluation.escalated());
    }

    #[test]
    fn test_heart_rate_lifts_low_to_mid() {
        let engine = engine_predicting(RiskLabel::Low, 0.80);
        let reading = VitalReading { heart_rate: 95.0, ..nominal() };

        assert_eq!(engine.predict(&reading).unwrap().risk_level, RiskLabel::Mid);
    }

    #[test]
    fn test_mid_stays_mid_under_soft_conditions() {
        let engine = engine_predicting(RiskLabel::Mid, 0.72);
        let reading = VitalReading {
            systolic_bp: 125.0,
            diastolic_bp: 85.0,
            heart_rate: 95.0,
            ..nominal()
        };

        let evaluation = engine.evaluate(&reading).unwrap();
        assert_eq!(evaluation.result.risk_level, RiskLabel::Mid);
        assert_eq!(evaluation.overrides.tier, Some(OverrideTier::Soft));
        assert!(!evaluation.escalated());
    }

    #[test]
    fn test_classifier_label_kept_when_nominal() {
        for label in RiskLabel::ALL {
            let engine = engine_predicting(label, 0.88);
            let result = engine.predict(&nominal()).unwrap();
            assert_eq!(result.risk_level, label);
        }
    }

    #[test]
    fn test_confidence_uses_model_probability_not_final_label() {
        let engine = engine_predicting(RiskLabel::Low, 0.50);
        let reading = VitalReading { blood_sugar: 15.0, ..nominal() };

        let evaluation = engine.evaluate(&reading).unwrap();
        assert_eq!(evaluation.result.risk_level, RiskLabel::High);
        assert_eq!(evaluation.model_label, RiskLabel::Low);
        assert_eq!(evaluation.result.confidence, ConfidenceBucket::From50To55);
    }

    #[test]
    fn test_probabilities_unchanged_by_override() {
        let engine = engine_predicting(RiskLabel::Low, 0.91);
        let plain = engine.predict(&nominal()).unwrap();
        let escalated = engine
            .predict(&VitalReading { diastolic_bp: 95.0, ..nominal() })
            .unwrap();

        assert_eq!(escalated.risk_level, RiskLabel::High);
        assert_eq!(plain.probabilities, escalated.probabilities);
        assert_eq!(escalated.probabilities.len(), 3);
        assert!((percent_sum(&escalated) - 100.0).abs() <= 0.1);
    }

    #[test]
    fn test_probabilities_keyed_by_mapping_order() {
        let engine = engine_predicting(RiskLabel::High, 0.955);
        let result = engine.predict(&nominal()).unwrap();

        assert_eq!(result.probabilities[&RiskLabel::High], "95.50%");
        assert_eq!(result.probabilities[&RiskLabel::Low], "2.25%");
        assert_eq!(result.probabilities[&RiskLabel::Mid], "2.25%");
        assert_eq!(result.confidence.as_str(), "95-98%");
    }

    #[test]
    fn test_predict_is_idempotent() {
        let engine = engine_predicting(RiskLabel::Mid, 0.66);
        let reading = VitalReading::new(33.0, 118.0, 79.0, 7.1, 98.4, 82.0);

        assert_eq!(engine.predict(&reading).unwrap(), engine.predict(&reading).unwrap());
    }

    #[test]
    fn test_predict_values_arity() {
        let engine = engine_predicting(RiskLabel::Low, 0.9);

        let err = engine.predict_values(&[25.0, 110.0, 70.0, 6.0, 98.0]).unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)));

        let result = engine
            .predict_values(&[25.0, 110.0, 70.0, 6.0, 98.0, 76.0])
            .unwrap();
        assert_eq!(result.risk_level, RiskLabel::Low);
    }

    #[test]
    fn test_non_finite_reading_rejected() {
        let engine = engine_predicting(RiskLabel::Low, 0.9);
        let reading = VitalReading { body_temp: f64::INFINITY, ..nominal() };

        assert!(matches!(
            engine.predict(&reading).unwrap_err(),
            RiskError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_malformed_classifier_output() {
        let engine = RiskEngine::new(
            Box::new(FixedClassifier {
                output: ClassifierOutput {
                    class_index: 0,
                    probabilities: vec![1.0, 0.0],
                },
            }),
            FeatureNormalizer::identity(),
            LabelMapping::default(),
        );
        assert!(matches!(
            engine.predict(&nominal()).unwrap_err(),
            RiskError::Classifier(_)
        ));

        let engine = RiskEngine::new(
            Box::new(FixedClassifier {
                output: ClassifierOutput {
                    class_index: 3,
                    probabilities: vec![0.2, 0.3, 0.5],
                },
            }),
            FeatureNormalizer::identity(),
            LabelMapping::default(),
        );
        assert!(engine
            .predict(&nominal())
            .unwrap_err()
            .to_string()
            .contains("unknown class index 3"));
    }

    #[test]
    fn test_predict_batch() {
        let engine = engine_predicting(RiskLabel::Low, 0.9);
        let results = engine.predict_batch(&[
            nominal(),
            VitalReading { heart_rate: 112.0, ..nominal() },
            VitalReading { body_temp: 99.5, ..nominal() },
        ]);

        let levels: Vec<RiskLabel> = results.into_iter().map(|r| r.unwrap().risk_level).collect();
        assert_eq!(levels, vec![RiskLabel::Low, RiskLabel::High, RiskLabel::Mid]);
    }

    #[test]
    fn test_assessment_carries_trail() {
        let engine = engine_predicting(RiskLabel::Low, 0.91);
        let reading = VitalReading::new(30.0, 150.0, 75.0, 6.5, 98.0, 75.0);

        let assessment = engine.evaluate(&reading).unwrap().to_assessment("r-1", &reading);
        assert_eq!(assessment.reading_id, "r-1");
        assert_eq!(assessment.model_label, RiskLabel::Low);
        assert_eq!(assessment.result.risk_level, RiskLabel::High);
        assert_eq!(assessment.override_tier, Some(OverrideTier::Hard));
        assert_eq!(assessment.triggered_rules, vec!["systolic_bp >= 140".to_string()]);
        assert!(assessment.health_summary.is_some());
        assert_eq!(assessment.priority, Priority::Urgent);
    }

    #[test]
    fn test_assessment_priority_follows_final_level() {
        let cases = [
            (RiskLabel::Low, nominal(), Priority::Normal),
            (RiskLabel::Low, VitalReading { heart_rate: 95.0, ..nominal() }, Priority::Moderate),
            (RiskLabel::Mid, nominal(), Priority::Moderate),
            (RiskLabel::High, nominal(), Priority::Urgent),
        ];

        for (model_label, reading, expected) in cases {
            let engine = engine_predicting(model_label, 0.85);
            let assessment = engine.evaluate(&reading).unwrap().to_assessment("r-2", &reading);
            assert_eq!(assessment.priority, expected);
            assert_eq!(
                assessment.recommended_actions,
                assessment
                    .result
                    .risk_level
                    .recommended_actions()
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
            );
        }
    }
}
