//! Bidirectional mapping between classifier class indices and risk labels

use crate::error::{Result, RiskError};
use crate::types::RiskLabel;
use std::collections::HashMap;
use std::path::Path;

/// Fixed index <-> label lookup, built once at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMapping {
    /// Labels indexed by class index
    by_index: Vec<RiskLabel>,
}

impl LabelMapping {
    /// Build from `label -> index` pairs, as exported by the training pipeline.
    ///
    /// The pairs must cover every risk label exactly once with indices `0..3`.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (RiskLabel, usize)>,
    {
        let mut slots: Vec<Option<RiskLabel>> = vec![None; RiskLabel::ALL.len()];

        for (label, index) in pairs {
            let slot = slots.get_mut(index).ok_or_else(|| {
                RiskError::InvalidInput(format!(
                    "class index {} for '{}' is out of range 0..{}",
                    index,
                    label,
                    RiskLabel::ALL.len()
                ))
            })?;
            if let Some(existing) = slot {
                return Err(RiskError::InvalidInput(format!(
                    "class index {} is assigned to both '{}' and '{}'",
                    index, existing, label
                )));
            }
            *slot = Some(label);
        }

        let by_index: Vec<RiskLabel> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    RiskError::InvalidInput(format!("class index {} has no label", index))
                })
            })
            .collect::<Result<_>>()?;

        for label in RiskLabel::ALL {
            if !by_index.contains(&label) {
                return Err(RiskError::InvalidInput(format!(
                    "label '{}' is missing from the mapping",
                    label
                )));
            }
        }

        Ok(Self { by_index })
    }

    /// Parse a JSON object such as `{"high risk": 0, "low risk": 1, "mid risk": 2}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, usize> = serde_json::from_str(json)?;
        let pairs = raw
            .into_iter()
            .map(|(name, index)| {
                name.parse::<RiskLabel>()
                    .map(|label| (label, index))
                    .map_err(RiskError::InvalidInput)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_pairs(pairs)
    }

    /// Load the mapping artifact. Any failure is an artifact error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| RiskError::artifact(path, e))?;
        Self::from_json(&content).map_err(|e| RiskError::artifact(path, e))
    }

    pub fn label_for(&self, index: usize) -> Option<RiskLabel> {
        self.by_index.get(index).copied()
    }

    pub fn index_for(&self, label: RiskLabel) -> usize {
        // from_pairs guarantees every label is present
        self.by_index
            .iter()
            .position(|l| *l == label)
            .unwrap_or_default()
    }

    /// Labels in class-index order
    pub fn class_names(&self) -> &[RiskLabel] {
        &self.by_index
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }
}

impl Default for LabelMapping {
    /// Alphabetical class order, as a scikit-learn `LabelEncoder` assigns it
    fn default() -> Self {
        Self {
            by_index: vec![RiskLabel::High, RiskLabel::Low, RiskLabel::Mid],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_roundtrip_lookup() {
        let mapping =
            LabelMapping::from_json(r#"{"high risk": 0, "low risk": 1, "mid risk": 2}"#).unwrap();

        assert_eq!(mapping.label_for(0), Some(RiskLabel::High));
        assert_eq!(mapping.label_for(1), Some(RiskLabel::Low));
        assert_eq!(mapping.label_for(2), Some(RiskLabel::Mid));
        assert_eq!(mapping.label_for(3), None);
        for label in RiskLabel::ALL {
            assert_eq!(mapping.label_for(mapping.index_for(label)), Some(label));
        }
        assert_eq!(mapping, LabelMapping::default());
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let err = LabelMapping::from_json(r#"{"high risk": 0, "low risk": 0, "mid risk": 2}"#)
            .unwrap_err();
        assert!(err.to_string().contains("assigned to both"));
    }

    #[test]
    fn test_missing_label_rejected() {
        let err = LabelMapping::from_pairs([(RiskLabel::Low, 0), (RiskLabel::Mid, 1)]).unwrap_err();
        assert!(err.to_string().contains("class index 2 has no label"));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let err = LabelMapping::from_pairs([
            (RiskLabel::Low, 0),
            (RiskLabel::Mid, 1),
            (RiskLabel::High, 5),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = LabelMapping::from_json(r#"{"high risk": 0, "low risk": 1, "medium": 2}"#)
            .unwrap_err();
        assert!(err.to_string().contains("unknown risk label"));
    }

    #[test]
    fn test_corrupt_file_is_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk_mapping.json");
        std::fs::write(&path, b"\x80\x04pickle").unwrap();

        let err = LabelMapping::from_file(&path).unwrap_err();
        assert!(matches!(err, RiskError::ArtifactLoad { .. }));
    }
}
