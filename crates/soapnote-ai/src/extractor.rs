//! Structured-field extraction.
//!
//! Only the pattern group relevant to a sentence's section runs:
//!
//! | Section    | Facts                                              |
//! |------------|----------------------------------------------------|
//! | Subjective | key findings (symptom/condition entities)          |
//! | Objective  | vitals, then weight/height/BMI                     |
//! | Assessment | diagnoses (condition/disease entities)             |
//! | Plan       | medications, then follow-up timing                 |
//!
//! Values are kept as matched text; nothing is unit-converted.

use std::sync::Arc;

use soapnote_core::patterns;
use soapnote_core::{EntityRecognizer, ExtractedFact, Measurement, SectionLabel};
use tracing::warn;

/// Entity types accepted as Subjective key findings.
pub const KEY_FINDING_TYPES: &[&str] = &["symptom", "sign_symptom", "condition", "complaint"];

/// Entity types accepted as Assessment diagnoses.
pub const DIAGNOSIS_TYPES: &[&str] = &["condition", "disease", "disease_disorder", "diagnosis"];

#[derive(Clone, Default)]
pub struct FieldExtractor {
    entities: Option<Arc<dyn EntityRecognizer>>,
}

impl FieldExtractor {
    pub fn new(entities: Option<Arc<dyn EntityRecognizer>>) -> Self {
        Self { entities }
    }

    /// Facts in `sentence` relevant to `section`. Empty when nothing matches.
    pub fn extract(&self, sentence: &str, section: SectionLabel) -> Vec<ExtractedFact> {
        match section {
            SectionLabel::Objective => {
                let mut facts = extract_vitals(sentence);
                facts.extend(extract_measurements(sentence));
                facts
            }
            SectionLabel::Plan => {
                let mut facts = extract_medications(sentence);
                facts.extend(extract_follow_up(sentence));
                facts
            }
            SectionLabel::Assessment => self
                .entity_texts(sentence, DIAGNOSIS_TYPES)
                .into_iter()
                .map(|text| ExtractedFact::Diagnosis { text })
                .collect(),
            SectionLabel::Subjective => self
                .entity_texts(sentence, KEY_FINDING_TYPES)
                .into_iter()
                .map(|text| ExtractedFact::KeyFinding { text })
                .collect(),
        }
    }

    /// Entity texts of the given types. Without a recognizer, or when it
    /// fails, there are none.
    fn entity_texts(&self, sentence: &str, types: &[&str]) -> Vec<String> {
        let Some(recognizer) = &self.entities else {
            return Vec::new();
        };
        match recognizer.extract_entities(sentence) {
            Ok(entities) => entities
                .into_iter()
                .filter(|e| e.is_one_of(types))
                .filter_map(|e| {
                    let text = clean_entity_text(&e.text);
                    (!text.is_empty()).then_some(text)
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "entity recognition failed, no entity facts for sentence");
                Vec::new()
            }
        }
    }
}

/// Strip word-piece markers and surrounding punctuation from entity text.
fn clean_entity_text(raw: &str) -> String {
    raw.trim()
        .trim_start_matches("##")
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

pub fn extract_vitals(sentence: &str) -> Vec<ExtractedFact> {
    let mut facts = Vec::new();
    for (vital, re) in patterns::vital_patterns() {
        for caps in re.captures_iter(sentence) {
            if let Some(value) = caps.get(1) {
                facts.push(ExtractedFact::vital(*vital, value.as_str()));
            }
        }
    }
    facts
}

pub fn extract_measurements(sentence: &str) -> Vec<ExtractedFact> {
    let mut facts = Vec::new();
    for (kind, re) in patterns::measurement_patterns() {
        for caps in re.captures_iter(sentence) {
            let Some(value) = caps.get(1) else { continue };
            facts.push(ExtractedFact::Measurement(Measurement {
                name: *kind,
                value: value.as_str().to_string(),
                unit: caps.get(2).map(|u| u.as_str().to_string()),
            }));
        }
    }
    facts
}

pub fn extract_medications(sentence: &str) -> Vec<ExtractedFact> {
    patterns::medication_pattern()
        .captures_iter(sentence)
        .filter_map(|caps| {
            let dosage = caps.get(1)?.as_str();
            let name = caps.get(2)?.as_str();
            patterns::is_drug_name(name).then(|| ExtractedFact::medication(name, dosage))
        })
        .collect()
}

pub fn extract_follow_up(sentence: &str) -> Vec<ExtractedFact> {
    patterns::follow_up_pattern()
        .captures_iter(sentence)
        .filter_map(|caps| {
            let duration = caps.get(1)?.as_str();
            let unit = caps.get(2)?.as_str().to_ascii_lowercase();
            Some(ExtractedFact::follow_up(duration, unit))
        })
        .collect()
}
