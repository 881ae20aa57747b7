//! Trained model artifacts and the risk decision engine

pub mod classifier;
pub mod engine;
pub mod labels;
pub mod loader;

pub use classifier::{Classifier, ClassifierOutput, OnnxClassifier};
pub use engine::{Evaluation, RiskEngine};
pub use labels::LabelMapping;
pub use loader::{ModelArtifacts, ModelLoader};
