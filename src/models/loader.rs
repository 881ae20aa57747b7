//! Model artifact loader: ONNX classifier, feature scaler and label mapping

use crate::config::ModelsConfig;
use crate::error::{Result, RiskError};
use crate::models::classifier::OnnxClassifier;
use crate::models::labels::LabelMapping;
use crate::normalizer::FeatureNormalizer;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Output carrying the predicted class, when the export has one
    pub label_output: Option<String>,
    /// Output carrying the per-class probabilities
    pub probability_output: String,
}

/// The three trained artifacts the decision engine needs
pub struct ModelArtifacts {
    pub classifier: OnnxClassifier,
    pub normalizer: FeatureNormalizer,
    pub labels: LabelMapping,
}

/// Loader for model artifacts
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        // Initialize ONNX Runtime
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single ONNX model from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<LoadedModel> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(RiskError::artifact(path, "file not found"));
        }

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = self
            .build_session(path)
            .map_err(|e| RiskError::artifact(path, e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| RiskError::artifact(path, "model declares no inputs"))?;

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let (label_output, probability_output) = discover_outputs(&output_names);
        let probability_output = probability_output
            .ok_or_else(|| RiskError::artifact(path, "model declares no probability output"))?;

        info!(
            model = %name,
            input = %input_name,
            label_output = ?label_output,
            probability_output = %probability_output,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name: name.to_string(),
            session,
            input_name,
            label_output,
            probability_output,
        })
    }

    fn build_session(&self, path: &Path) -> std::result::Result<Session, Box<dyn std::error::Error>> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)?;
        Ok(session)
    }

    /// Load classifier, scaler and label mapping from the configured models directory.
    ///
    /// Every artifact is required; the first failure aborts loading.
    pub fn load_artifacts(&self, config: &ModelsConfig) -> Result<ModelArtifacts> {
        let models_dir = Path::new(&config.models_dir);

        let labels = LabelMapping::from_file(models_dir.join(&config.label_mapping_file))?;
        info!(
            classes = ?labels.class_names(),
            "Label mapping loaded"
        );

        let normalizer = FeatureNormalizer::from_file(models_dir.join(&config.scaler_file))?;
        info!(features = normalizer.feature_count(), "Feature scaler loaded");

        let model = self.load_model(models_dir.join(&config.classifier_file), "classifier")?;
        let classifier = OnnxClassifier::new(model, labels.len());

        info!(
            models_dir = %models_dir.display(),
            "Loaded all model artifacts"
        );

        Ok(ModelArtifacts {
            classifier,
            normalizer,
            labels,
        })
    }
}

/// Pick the label and probability outputs from a model's output names.
///
/// The probability output is the first name containing "prob", else the
/// first name that is not the label.
pub(crate) fn discover_outputs(names: &[String]) -> (Option<String>, Option<String>) {
    let label = names.iter().find(|n| n.contains("label")).cloned();
    let probabilities = names
        .iter()
        .find(|n| n.contains("prob"))
        .or_else(|| names.iter().find(|n| !n.contains("label")))
        .cloned();
    (label, probabilities)
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}
