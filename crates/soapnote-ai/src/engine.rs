//! End-to-end note structuring for one input text.

use std::collections::BTreeMap;

use soapnote_core::{Capabilities, ClassifiedSentence, SoapError, SoapNote, transcript};
use tracing::{debug, warn};

use crate::assembler::assemble;
use crate::classifier::SectionClassifier;
use crate::config::EngineConfig;
use crate::extractor::FieldExtractor;
use crate::segmenter::Segmenter;

/// Segment → classify → extract → assemble.
///
/// Holds only read-only collaborator handles, so one engine can be shared
/// across threads behind an `Arc` and `process` called concurrently.
#[derive(Clone)]
pub struct NoteEngine {
    capabilities: Capabilities,
    config: EngineConfig,
    segmenter: Segmenter,
    classifier: SectionClassifier,
    extractor: FieldExtractor,
}

impl NoteEngine {
    pub fn new(capabilities: Capabilities) -> Self {
        Self::with_config(capabilities, EngineConfig::default())
    }

    pub fn with_config(capabilities: Capabilities, config: EngineConfig) -> Self {
        debug!(?capabilities, ?config, "building note engine");
        Self {
            segmenter: Segmenter::new(capabilities.sentence_boundary.clone()),
            classifier: SectionClassifier::new(
                capabilities.zero_shot.clone(),
                config.default_section,
            ),
            extractor: FieldExtractor::new(capabilities.entities.clone()),
            capabilities,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Structure `text` into a fresh [`SoapNote`].
    ///
    /// Fails only on blank input. Capability failures degrade to the
    /// built-in fallbacks and never surface here.
    pub fn process(&self, text: &str) -> Result<SoapNote, SoapError> {
        let sentences = self.classify_sentences(text)?;
        debug!(sentences = sentences.len(), "assembling note");
        Ok(assemble(sentences))
    }

    /// Classified, extracted sentences in document order, before assembly.
    pub fn classify_sentences(&self, text: &str) -> Result<Vec<ClassifiedSentence>, SoapError> {
        if text.trim().is_empty() {
            return Err(SoapError::EmptyInput);
        }

        let normalized;
        let text = if self.config.normalize_transcripts {
            normalized = transcript::normalize(text);
            normalized.as_str()
        } else {
            text
        };

        Ok(self
            .segmenter
            .segment(text)
            .map(|sentence| {
                let section = self.classifier.classify(&sentence.text);
                let facts = self.extractor.extract(&sentence.text, section);
                ClassifiedSentence {
                    sentence,
                    section,
                    facts,
                }
            })
            .collect())
    }

    /// Entities recognised in the whole text, grouped by entity type in
    /// order of appearance. Empty without an entity capability or when
    /// recognition fails.
    pub fn entities(&self, text: &str) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let Some(recognizer) = &self.capabilities.entities else {
            return grouped;
        };
        if text.trim().is_empty() {
            return grouped;
        }

        match recognizer.extract_entities(text) {
            Ok(entities) => {
                for entity in entities {
                    grouped
                        .entry(entity.entity_type)
                        .or_default()
                        .push(entity.text);
                }
            }
            Err(e) => warn!(error = %e, "entity recognition failed, reporting no entities"),
        }
        grouped
    }
}

impl Default for NoteEngine {
    fn default() -> Self {
        Self::new(Capabilities::none())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use soapnote_core::{NO_INFORMATION, SectionLabel, VitalSign, Vital};

    use crate::lexicon::LexiconRecognizer;

    #[test]
    fn blank_input_rejected() {
        let engine = NoteEngine::default();
        assert_eq!(engine.process("").unwrap_err(), SoapError::EmptyInput);
        assert_eq!(engine.process(" \n\t ").unwrap_err(), SoapError::EmptyInput);
    }

    #[test]
    fn degraded_mode_routes_to_subjective() {
        let note = NoteEngine::default().process("Patient reports headache.").unwrap();
        assert_eq!(note.text(SectionLabel::Subjective), "Patient reports headache.");
        assert!(note.sections.assessment.diagnoses.is_empty());
        assert_eq!(note.text(SectionLabel::Plan), NO_INFORMATION);
    }

    #[test]
    fn full_consultation() {
        let text = "Patient reports headache for three days. BP: 120/80, HR: 72. \
                    Impression is tension headache. Take 500 mg of ibuprofen twice daily. \
                    Please follow up in 2 weeks.";
        let note = NoteEngine::default().process(text).unwrap();

        assert_eq!(
            note.sections.objective.vitals,
            vec![
                Vital {
                    name: VitalSign::BloodPressure,
                    value: "120/80".into()
                },
                Vital {
                    name: VitalSign::HeartRate,
                    value: "72".into()
                },
            ]
        );
        assert_eq!(note.sections.plan.medications[0].name, "ibuprofen");
        assert_eq!(note.sections.plan.medications[0].dosage, "500 mg");
        let follow_up = note.sections.plan.follow_up.as_ref().unwrap();
        assert_eq!((follow_up.duration.as_str(), follow_up.unit.as_str()), ("2", "weeks"));
        assert_eq!(
            note.sentences(SectionLabel::Assessment),
            ["Impression is tension headache"]
        );
    }

    #[test]
    fn configured_default_section() {
        let config = EngineConfig {
            default_section: SectionLabel::Objective,
            ..EngineConfig::default()
        };
        let engine = NoteEngine::with_config(Capabilities::none(), config);
        let note = engine.process("Lungs clear bilaterally.").unwrap();
        assert_eq!(note.sentences(SectionLabel::Objective), ["Lungs clear bilaterally"]);
    }

    #[test]
    fn transcript_normalisation_enables_vitals() {
        let text = "Blood fresher is 130 over 85.";
        let plain = NoteEngine::default().process(text).unwrap();
        assert!(plain.sections.objective.vitals.is_empty());

        let config = EngineConfig {
            normalize_transcripts: true,
            ..EngineConfig::default()
        };
        let note = NoteEngine::with_config(Capabilities::none(), config)
            .process(text)
            .unwrap();
        assert_eq!(note.sections.objective.vitals[0].value, "130/85");
    }

    #[test]
    fn lexicon_supplies_diagnoses_and_findings() {
        let caps = Capabilities::none().with_entities(Arc::new(LexiconRecognizer::new()));
        let note = NoteEngine::new(caps)
            .process("Patient reports fever and cough. Diagnosis is likely pneumonia.")
            .unwrap();
        assert!(note.sections.subjective.key_findings.contains("fever"));
        assert!(note.sections.subjective.key_findings.contains("cough"));
        assert!(note.sections.assessment.diagnoses.contains("pneumonia"));
    }

    #[test]
    fn entities_grouped_by_type() {
        let caps = Capabilities::none().with_entities(Arc::new(LexiconRecognizer::new()));
        let grouped = NoteEngine::new(caps).entities("Fever, asthma and cough");
        assert_eq!(grouped["Sign_symptom"], vec!["fever", "cough"]);
        assert_eq!(grouped["Disease_disorder"], vec!["asthma"]);

        assert!(NoteEngine::default().entities("Fever").is_empty());
    }
}
