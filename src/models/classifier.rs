//! Classifier seam and the ONNX Runtime implementation

use crate::error::{Result, RiskError};
use crate::models::loader::LoadedModel;
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue};
use std::cmp::Ordering;
use std::sync::Mutex;
use tracing::debug;

/// Raw classifier output for one feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOutput {
    /// Predicted class index
    pub class_index: usize,
    /// One probability per class, in class-index order
    pub probabilities: Vec<f64>,
}

impl ClassifierOutput {
    /// Output whose predicted class is the arg-max of the probabilities
    pub fn from_probabilities(probabilities: Vec<f64>) -> Self {
        let class_index = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        Self {
            class_index,
            probabilities,
        }
    }

    /// Probability the classifier assigned to its own prediction
    pub fn winning_probability(&self) -> Option<f64> {
        self.probabilities.get(self.class_index).copied()
    }
}

/// A trained classifier over scaled features.
///
/// Implementations must be safe to share read-only across tasks.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &[f32]) -> Result<ClassifierOutput>;

    fn name(&self) -> &str {
        "classifier"
    }
}

/// Classifier backed by an ONNX Runtime session (scikit-learn export)
pub struct OnnxClassifier {
    model: Mutex<LoadedModel>,
    name: String,
    num_classes: usize,
}

impl OnnxClassifier {
    pub fn new(model: LoadedModel, num_classes: usize) -> Self {
        let name = model.name.clone();
        Self {
            model: Mutex::new(model),
            name,
            num_classes,
        }
    }

    /// Read the probability vector; handles both a `[1, n]` tensor and the
    /// `seq(map(int64, float))` shape produced by scikit-learn's ZipMap.
    fn extract_probabilities(&self, output: &DynValue) -> Result<Vec<f64>> {
        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            debug!(model = %self.name, "Extracted probabilities from tensor");
            return Ok(data.iter().map(|&p| p as f64).collect());
        }

        let dtype = output.dtype();
        if DynSequenceValueType::can_downcast(&dtype) {
            return self.extract_from_sequence_map(output);
        }

        Err(RiskError::Classifier(format!(
            "unsupported probability output type {:?}",
            dtype
        )))
    }

    fn extract_from_sequence_map(&self, output: &DynValue) -> Result<Vec<f64>> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| RiskError::Classifier(format!("Failed to downcast to sequence: {}", e)))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

        // batch size is always 1
        let map_value = maps
            .first()
            .ok_or_else(|| RiskError::Classifier("Empty probability sequence".to_string()))?;

        let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

        debug!(model = %self.name, "Extracted probabilities from seq(map)");

        probabilities_from_pairs(&kv_pairs, self.num_classes)
    }

    fn extract_label(&self, output: &DynValue) -> Result<usize> {
        let (_, data) = output.try_extract_tensor::<i64>()?;
        let label = data
            .first()
            .copied()
            .ok_or_else(|| RiskError::Classifier("Empty label output".to_string()))?;
        class_index_from_label(label)
    }
}

/// Slot ZipMap `(class id, probability)` pairs into a class-indexed vector.
///
/// Every class in `0..num_classes` must appear exactly once.
pub(crate) fn probabilities_from_pairs(pairs: &[(i64, f32)], num_classes: usize) -> Result<Vec<f64>> {
    let mut probabilities = vec![None; num_classes];
    for (class_id, prob) in pairs {
        let slot = usize::try_from(*class_id)
            .ok()
            .and_then(|i| probabilities.get_mut(i))
            .ok_or_else(|| RiskError::Classifier(format!("class id {} out of range", class_id)))?;
        if slot.is_some() {
            return Err(RiskError::Classifier(format!(
                "duplicate probability for class {}",
                class_id
            )));
        }
        *slot = Some(*prob as f64);
    }

    probabilities
        .into_iter()
        .enumerate()
        .map(|(i, p)| p.ok_or_else(|| RiskError::Classifier(format!("no probability for class {}", i))))
        .collect()
}

pub(crate) fn class_index_from_label(label: i64) -> Result<usize> {
    usize::try_from(label).map_err(|_| RiskError::Classifier(format!("negative class label {}", label)))
}

/// Prefer the model's own label output; fall back to the arg-max
pub(crate) fn select_output(class_index: Option<usize>, probabilities: Vec<f64>) -> ClassifierOutput {
    match class_index {
        Some(class_index) => ClassifierOutput {
            class_index,
            probabilities,
        },
        None => ClassifierOutput::from_probabilities(probabilities),
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &[f32]) -> Result<ClassifierOutput> {
        use ort::value::Tensor;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))?;

        let mut model = self
            .model
            .lock()
            .map_err(|e| RiskError::Classifier(format!("Lock error: {}", e)))?;
        let model = &mut *model;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        let prob_value = outputs.get(model.probability_output.as_str()).ok_or_else(|| {
            RiskError::Classifier(format!(
                "missing output '{}'",
                model.probability_output
            ))
        })?;
        let probabilities = self.extract_probabilities(prob_value)?;

        let class_index = match model
            .label_output
            .as_deref()
            .and_then(|name| outputs.get(name))
        {
            Some(label_value) => Some(self.extract_label(label_value)?),
            None => None,
        };
        let output = select_output(class_index, probabilities);

        debug!(
            model = %self.name,
            class_index = output.class_index,
            probabilities = ?output.probabilities,
            "Classifier inference complete"
        );

        Ok(output)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_probabilities_argmax() {
        let output = ClassifierOutput::from_probabilities(vec![0.1, 0.7, 0.2]);
        assert_eq!(output.class_index, 1);
        assert_eq!(output.winning_probability(), Some(0.7));
    }

    #[test]
    fn test_pairs_slotted_by_class_id() {
        let probabilities =
            probabilities_from_pairs(&[(2, 0.25), (0, 0.5), (1, 0.25)], 3).unwrap();
        assert_eq!(probabilities, vec![0.5, 0.25, 0.25]);
    }

    #[test]
    fn test_pairs_missing_class() {
        let err = probabilities_from_pairs(&[(0, 0.4), (2, 0.6)], 3).unwrap_err();
        assert!(err.to_string().contains("no probability for class 1"));
    }

    #[test]
    fn test_pairs_class_id_out_of_range() {
        let err = probabilities_from_pairs(&[(0, 0.2), (1, 0.3), (3, 0.5)], 3).unwrap_err();
        assert!(err.to_string().contains("class id 3 out of range"));

        let err = probabilities_from_pairs(&[(-1, 1.0)], 3).unwrap_err();
        assert!(err.to_string().contains("class id -1 out of range"));
    }

    #[test]
    fn test_pairs_duplicate_class() {
        let err = probabilities_from_pairs(&[(0, 0.5), (0, 0.2), (1, 0.3)], 2).unwrap_err();
        assert!(err.to_string().contains("duplicate probability for class 0"));
    }

    #[test]
    fn test_class_index_from_label() {
        assert_eq!(class_index_from_label(2).unwrap(), 2);
        assert!(matches!(
            class_index_from_label(-1).unwrap_err(),
            RiskError::Classifier(_)
        ));
    }

    #[test]
    fn test_label_output_takes_precedence_over_argmax() {
        let output = select_output(Some(0), vec![0.3, 0.6, 0.1]);
        assert_eq!(output.class_index, 0);
        assert_eq!(output.winning_probability(), Some(0.3));

        let output = select_output(None, vec![0.3, 0.6, 0.1]);
        assert_eq!(output.class_index, 1);
    }

    #[test]
    fn test_winning_probability_out_of_range() {
        let output = ClassifierOutput {
            class_index: 5,
            probabilities: vec![0.5, 0.5],
        };
        assert_eq!(output.winning_probability(), None);
    }
}
