//! Note assembly: group classified sentences by section and merge their facts.

use chrono::Utc;
use soapnote_core::note::Sections;
use soapnote_core::{ClassifiedSentence, ExtractedFact, NO_INFORMATION, SectionLabel, SoapNote};

/// Build a [`SoapNote`] from classified sentences in document order.
///
/// Every section is present. Section text is the member sentences, each
/// closed with a period and joined by single spaces, or
/// [`NO_INFORMATION`] when nothing was routed there. Diagnoses and key
/// findings are sets; vitals, measurements and medications keep every
/// occurrence in order. When several follow-up instructions appear, the
/// last one wins.
pub fn assemble(sentences: impl IntoIterator<Item = ClassifiedSentence>) -> SoapNote {
    let mut sections = Sections::default();

    for classified in sentences {
        let ClassifiedSentence {
            sentence,
            section,
            facts,
        } = classified;

        match section {
            SectionLabel::Subjective => sections.subjective.sentences.push(sentence.text),
            SectionLabel::Objective => sections.objective.sentences.push(sentence.text),
            SectionLabel::Assessment => sections.assessment.sentences.push(sentence.text),
            SectionLabel::Plan => sections.plan.sentences.push(sentence.text),
        }

        for fact in facts {
            merge_fact(&mut sections, fact);
        }
    }

    sections.subjective.text = section_text(&sections.subjective.sentences);
    sections.objective.text = section_text(&sections.objective.sentences);
    sections.assessment.text = section_text(&sections.assessment.sentences);
    sections.plan.text = section_text(&sections.plan.sentences);

    SoapNote {
        timestamp: Utc::now(),
        sections,
    }
}

fn merge_fact(sections: &mut Sections, fact: ExtractedFact) {
    match fact {
        ExtractedFact::Vital(vital) => sections.objective.vitals.push(vital),
        ExtractedFact::Measurement(m) => sections.objective.measurements.push(m),
        ExtractedFact::Medication(med) => sections.plan.medications.push(med),
        ExtractedFact::FollowUp(follow_up) => sections.plan.follow_up = Some(follow_up),
        ExtractedFact::Diagnosis { text } => {
            sections.assessment.diagnoses.insert(text);
        }
        ExtractedFact::KeyFinding { text } => {
            sections.subjective.key_findings.insert(text);
        }
    }
}

fn section_text(sentences: &[String]) -> String {
    if sentences.is_empty() {
        return NO_INFORMATION.to_string();
    }
    sentences
        .iter()
        .map(|s| format!("{s}."))
        .collect::<Vec<_>>()
        .join(" ")
}
