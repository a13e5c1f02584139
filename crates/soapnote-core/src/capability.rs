//! Contracts for the optional NLP collaborators the engine can delegate to.
//!
//! Implementations are constructed once at start-up and shared read-only
//! across requests, so every trait requires `Send + Sync` and takes `&self`.
//! A call must not mutate shared state and must be safe to repeat.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;

/// Linguistic sentence-boundary detection.
pub trait SentenceBoundary: Send + Sync {
    /// Split `text` into sentence spans, in document order.
    fn segment(&self, text: &str) -> Result<Vec<String>, CapabilityError>;
}

/// Zero-shot text classification against caller-supplied descriptions.
pub trait ZeroShotClassifier: Send + Sync {
    fn classify(
        &self,
        text: &str,
        candidate_labels: &[&str],
    ) -> Result<ZeroShotOutput, CapabilityError>;
}

/// Named-entity recognition.
pub trait EntityRecognizer: Send + Sync {
    fn extract_entities(&self, text: &str) -> Result<Vec<Entity>, CapabilityError>;
}

/// Zero-shot scores. `labels[i]` is scored by `scores[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroShotOutput {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
}

impl ZeroShotOutput {
    /// Check the label/score correspondence.
    pub fn validate(&self, capability: &'static str) -> Result<(), CapabilityError> {
        if self.labels.len() != self.scores.len() {
            return Err(CapabilityError::malformed(
                capability,
                format!(
                    "{} labels but {} scores",
                    self.labels.len(),
                    self.scores.len()
                ),
            ));
        }
        if self.scores.iter().any(|s| s.is_nan()) {
            return Err(CapabilityError::malformed(capability, "NaN score"));
        }
        Ok(())
    }

    /// Score assigned to `label`, if it was returned.
    pub fn score_of(&self, label: &str) -> Option<f32> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.scores.get(i).copied())
    }
}

/// A typed span recognised in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub entity_type: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entity_type: entity_type.into(),
        }
    }

    /// Case-insensitive match of the entity type against `types`.
    pub fn is_one_of(&self, types: &[&str]) -> bool {
        types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(self.entity_type.as_str()))
    }
}

/// The set of collaborator handles injected into the engine.
///
/// Every handle is optional; an absent one means the engine uses its
/// built-in fallback for that step.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub sentence_boundary: Option<Arc<dyn SentenceBoundary>>,
    pub zero_shot: Option<Arc<dyn ZeroShotClassifier>>,
    pub entities: Option<Arc<dyn EntityRecognizer>>,
}

impl Capabilities {
    /// No collaborators: punctuation segmentation, keyword-only
    /// classification, no entity facts.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_sentence_boundary(mut self, boundary: Arc<dyn SentenceBoundary>) -> Self {
        self.sentence_boundary = Some(boundary);
        self
    }

    pub fn with_zero_shot(mut self, classifier: Arc<dyn ZeroShotClassifier>) -> Self {
        self.zero_shot = Some(classifier);
        self
    }

    pub fn with_entities(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.entities = Some(recognizer);
        self
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("sentence_boundary", &self.sentence_boundary.is_some())
            .field("zero_shot", &self.zero_shot.is_some())
            .field("entities", &self.entities.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl EntityRecognizer for Fixed {
        fn extract_entities(&self, _text: &str) -> Result<Vec<Entity>, CapabilityError> {
            Ok(vec![Entity::new("fever", "Sign_symptom")])
        }
    }

    #[test]
    fn zero_shot_length_mismatch_is_malformed() {
        let out = ZeroShotOutput {
            labels: vec!["a".into(), "b".into()],
            scores: vec![0.9],
        };
        assert!(matches!(
            out.validate("zero-shot"),
            Err(CapabilityError::Malformed { .. })
        ));
    }

    #[test]
    fn zero_shot_score_lookup() {
        let out = ZeroShotOutput {
            labels: vec!["plan".into(), "objective".into()],
            scores: vec![0.7, 0.3],
        };
        assert!(out.validate("zero-shot").is_ok());
        assert_eq!(out.score_of("objective"), Some(0.3));
        assert_eq!(out.score_of("assessment"), None);
    }

    #[test]
    fn entity_type_filter_ignores_case() {
        let e = Entity::new("asthma", "DISEASE_DISORDER");
        assert!(e.is_one_of(&["condition", "disease_disorder"]));
        assert!(!e.is_one_of(&["medication"]));
    }

    #[test]
    fn builder_sets_handles() {
        let caps = Capabilities::none().with_entities(Arc::new(Fixed));
        assert!(caps.entities.is_some());
        assert!(caps.zero_shot.is_none());
        assert_eq!(
            format!("{caps:?}"),
            "Capabilities { sentence_boundary: false, zero_shot: false, entities: true }"
        );
    }
}
