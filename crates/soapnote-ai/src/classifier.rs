//! Section classification for consultation sentences.
//!
//! Keyword vocabularies from the pattern library decide first, in the fixed
//! priority order Plan > Subjective > Objective > Assessment. Plan is checked
//! before the others because treatment instructions often mention tests or
//! imaging. Sentences with no keyword hit go to the zero-shot capability,
//! and to the configured default section when that is unavailable.

use std::sync::Arc;

use soapnote_core::patterns;
use soapnote_core::{CapabilityError, SectionLabel, ZeroShotClassifier, ZeroShotOutput};
use tracing::{debug, warn};

/// Zero-shot candidate descriptions, one per section.
pub const CANDIDATES: [(SectionLabel, &str); 4] = [
    (
        SectionLabel::Subjective,
        "subjective patient complaints and history",
    ),
    (
        SectionLabel::Objective,
        "objective medical findings and measurements",
    ),
    (SectionLabel::Assessment, "assessment and diagnosis"),
    (SectionLabel::Plan, "treatment plan and recommendations"),
];

const CAPABILITY: &str = "zero-shot";

/// How a section was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    /// A pattern-library keyword matched.
    Keyword,
    /// The zero-shot capability scored the candidates.
    ZeroShot,
    /// No signal; the configured default was used.
    Default,
}

impl ClassificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::ZeroShot => "zero-shot",
            Self::Default => "default",
        }
    }
}

/// Classification result for a single sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub section: SectionLabel,
    pub source: ClassificationSource,
    /// Zero-shot score of the chosen section, when one was computed.
    pub confidence: Option<f32>,
}

/// Assigns each sentence exactly one [`SectionLabel`].
#[derive(Clone)]
pub struct SectionClassifier {
    zero_shot: Option<Arc<dyn ZeroShotClassifier>>,
    default_section: SectionLabel,
}

impl SectionClassifier {
    pub fn new(
        zero_shot: Option<Arc<dyn ZeroShotClassifier>>,
        default_section: SectionLabel,
    ) -> Self {
        Self {
            zero_shot,
            default_section,
        }
    }

    /// Keyword-only classifier with the given fallback section.
    pub fn keywords_only(default_section: SectionLabel) -> Self {
        Self::new(None, default_section)
    }

    pub fn default_section(&self) -> SectionLabel {
        self.default_section
    }

    pub fn classify(&self, sentence: &str) -> SectionLabel {
        self.classify_detailed(sentence).section
    }

    /// Classify and report which signal decided.
    pub fn classify_detailed(&self, sentence: &str) -> Classification {
        if let Some((section, keyword)) = patterns::keyword_match(sentence) {
            debug!(%section, keyword, "classified by keyword");
            return Classification {
                section,
                source: ClassificationSource::Keyword,
                confidence: None,
            };
        }

        match self.zero_shot_section(sentence) {
            Ok(Some((section, score))) => {
                debug!(%section, score, "classified by zero-shot");
                return Classification {
                    section,
                    source: ClassificationSource::ZeroShot,
                    confidence: Some(score),
                };
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "zero-shot classification degraded to default section"),
        }

        debug!(section = %self.default_section, "no classification signal, using default");
        Classification {
            section: self.default_section,
            source: ClassificationSource::Default,
            confidence: None,
        }
    }

    /// `Ok(None)` when no zero-shot capability is configured.
    fn zero_shot_section(
        &self,
        sentence: &str,
    ) -> Result<Option<(SectionLabel, f32)>, CapabilityError> {
        let Some(zero_shot) = &self.zero_shot else {
            return Ok(None);
        };

        let labels: Vec<&str> = CANDIDATES.iter().map(|(_, desc)| *desc).collect();
        let output = zero_shot.classify(sentence, &labels)?;
        output.validate(CAPABILITY)?;

        best_section(&output)
            .map(Some)
            .ok_or_else(|| CapabilityError::malformed(CAPABILITY, "no candidate label returned"))
    }
}

/// Map a candidate description back to its section.
pub fn section_for_candidate(label: &str) -> Option<SectionLabel> {
    CANDIDATES
        .iter()
        .find(|(_, desc)| *desc == label)
        .map(|(section, _)| *section)
}

/// Highest-scoring known candidate. Exact ties go to the section ranked
/// first in [`SectionLabel::PRIORITY`]; unknown labels are ignored.
pub fn best_section(output: &ZeroShotOutput) -> Option<(SectionLabel, f32)> {
    let mut best: Option<(SectionLabel, f32)> = None;

    for (label, &score) in output.labels.iter().zip(&output.scores) {
        let Some(section) = section_for_candidate(label) else {
            continue;
        };
        best = match best {
            Some((current, current_score))
                if score < current_score
                    || (score == current_score
                        && current.priority_rank() <= section.priority_rank()) =>
            {
                Some((current, current_score))
            }
            _ => Some((section, score)),
        };
    }

    best
}
