//! Dictionary-backed entity recognition.
//!
//! A model-free [`EntityRecognizer`] over a curated list of common symptom
//! and condition terms. Entity types follow the biomedical NER label set
//! (`Sign_symptom`, `Disease_disorder`) so the extractor treats lexicon hits
//! and model hits alike.

use std::sync::LazyLock;

use regex::Regex;
use soapnote_core::{CapabilityError, Entity, EntityRecognizer};

pub const SYMPTOM_TYPE: &str = "Sign_symptom";
pub const CONDITION_TYPE: &str = "Disease_disorder";

const SYMPTOMS: &[&str] = &[
    "abdominal pain",
    "back pain",
    "chest pain",
    "chills",
    "constipation",
    "cough",
    "diarrhea",
    "dizziness",
    "fatigue",
    "fever",
    "headache",
    "insomnia",
    "joint pain",
    "nausea",
    "palpitations",
    "rash",
    "shortness of breath",
    "sore throat",
    "swelling",
    "vomiting",
    "weakness",
    "wheezing",
];

const CONDITIONS: &[&str] = &[
    "anemia",
    "anxiety",
    "asthma",
    "bronchitis",
    "copd",
    "depression",
    "diabetes",
    "gastroenteritis",
    "hypertension",
    "hypothyroidism",
    "influenza",
    "migraine",
    "osteoarthritis",
    "otitis media",
    "pharyngitis",
    "pneumonia",
    "sinusitis",
    "type 2 diabetes",
    "upper respiratory infection",
    "urinary tract infection",
    "viral infection",
];

/// Term patterns, longest terms first so "type 2 diabetes" wins over
/// "diabetes" at the same position.
static LEXICON: LazyLock<Regex> = LazyLock::new(|| {
    let mut terms: Vec<&str> = SYMPTOMS.iter().chain(CONDITIONS).copied().collect();
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let alternation = terms
        .iter()
        .map(|t| {
            t.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("lexicon compiles")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconRecognizer;

impl LexiconRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// Entities in order of appearance, with canonical lower-case text.
    pub fn recognize(&self, text: &str) -> Vec<Entity> {
        LEXICON
            .find_iter(text)
            .filter_map(|m| {
                let canonical = m
                    .as_str()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase();
                let entity_type = entity_type_of(&canonical)?;
                Some(Entity::new(canonical, entity_type))
            })
            .collect()
    }
}

fn entity_type_of(term: &str) -> Option<&'static str> {
    if SYMPTOMS.contains(&term) {
        Some(SYMPTOM_TYPE)
    } else if CONDITIONS.contains(&term) {
        Some(CONDITION_TYPE)
    } else {
        None
    }
}

impl EntityRecognizer for LexiconRecognizer {
    fn extract_entities(&self, text: &str) -> Result<Vec<Entity>, CapabilityError> {
        Ok(self.recognize(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symptoms_and_conditions_typed() {
        let found = LexiconRecognizer::new().recognize("Headache and FEVER, likely influenza");
        assert_eq!(
            found,
            vec![
                Entity::new("headache", SYMPTOM_TYPE),
                Entity::new("fever", SYMPTOM_TYPE),
                Entity::new("influenza", CONDITION_TYPE),
            ]
        );
    }

    #[test]
    fn longest_term_wins() {
        let found = LexiconRecognizer::new().recognize("Known type 2   diabetes");
        assert_eq!(found, vec![Entity::new("type 2 diabetes", CONDITION_TYPE)]);
    }

    #[test]
    fn whole_words_only() {
        assert!(LexiconRecognizer::new().recognize("Feverish and coughing").is_empty());
    }

    #[test]
    fn term_lists_do_not_overlap() {
        for s in SYMPTOMS {
            assert!(!CONDITIONS.contains(s), "{s} listed twice");
        }
    }
}
