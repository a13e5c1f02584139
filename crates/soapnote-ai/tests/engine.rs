use std::sync::Arc;
use std::thread;

use soapnote_ai::{LexiconRecognizer, NoteEngine};
use soapnote_core::{
    Capabilities, CapabilityError, NO_INFORMATION, SectionLabel, SentenceBoundary, SoapError,
    ZeroShotClassifier, ZeroShotOutput,
};

const CONSULTATION: &str = "Patient reports a sore throat and fever since Monday. \
    Denies cough. Vital signs: BP 118/76, HR 88, T 38.2. Weight 64 kg. \
    Throat erythematous with tonsillar exudate. Impression is likely pharyngitis. \
    Prescribe 500 mg amoxicillin three times daily. Follow up in 10 days.";

/// Zero-shot stub that always prefers the assessment description.
struct AlwaysAssessment;

impl ZeroShotClassifier for AlwaysAssessment {
    fn classify(&self, _: &str, labels: &[&str]) -> Result<ZeroShotOutput, CapabilityError> {
        let scores = labels
            .iter()
            .map(|l| if l.starts_with("assessment") { 0.9 } else { 0.1 / 3.0 })
            .collect();
        Ok(ZeroShotOutput {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            scores,
        })
    }
}

struct Unreachable;

impl SentenceBoundary for Unreachable {
    fn segment(&self, _: &str) -> Result<Vec<String>, CapabilityError> {
        Err(CapabilityError::failed("sentence boundary", "connection refused"))
    }
}

#[test]
fn every_section_has_text() {
    let note = NoteEngine::default().process("Lungs clear").unwrap();
    for label in SectionLabel::DOCUMENT_ORDER {
        assert!(!note.text(label).is_empty(), "{label} text empty");
    }
    assert_eq!(note.text(SectionLabel::Plan), NO_INFORMATION);
}

#[test]
fn empty_input_is_an_error() {
    let engine = NoteEngine::default();
    assert_eq!(engine.process(""), Err(SoapError::EmptyInput));
    assert_eq!(engine.process("   "), Err(SoapError::EmptyInput));
}

#[test]
fn idempotent_apart_from_timestamp() {
    let engine = NoteEngine::new(Capabilities::none().with_entities(Arc::new(LexiconRecognizer)));
    let a = engine.process(CONSULTATION).unwrap();
    let b = engine.process(CONSULTATION).unwrap();
    assert!(a.same_content(&b));
}

#[test]
fn every_sentence_lands_in_exactly_one_section() {
    let engine = NoteEngine::default();
    let classified = engine.classify_sentences(CONSULTATION).unwrap();
    let note = engine.process(CONSULTATION).unwrap();

    let mut placed: Vec<&String> = SectionLabel::DOCUMENT_ORDER
        .iter()
        .flat_map(|&label| note.sentences(label))
        .collect();
    placed.sort();
    let mut expected: Vec<&String> = classified.iter().map(|c| &c.sentence.text).collect();
    expected.sort();

    assert_eq!(placed, expected);
    assert_eq!(classified.len(), 8);
}

#[test]
fn plan_priority_over_objective() {
    let note = NoteEngine::default()
        .process("Prescribe amlodipine for elevated blood pressure.")
        .unwrap();
    assert_eq!(
        note.sentences(SectionLabel::Plan),
        ["Prescribe amlodipine for elevated blood pressure"]
    );
    assert!(note.is_empty(SectionLabel::Objective));
}

#[test]
fn standalone_vital_readings_reach_objective() {
    let note = NoteEngine::default()
        .process("Temp 38.5. Pulse 88. O2 sat 95% on room air. Resp rate 18. T 37.9. HR 72bpm.")
        .unwrap();

    assert!(note.is_empty(SectionLabel::Subjective));
    let vitals: Vec<(&str, &str)> = note
        .sections
        .objective
        .vitals
        .iter()
        .map(|v| (v.name.as_str(), v.value.as_str()))
        .collect();
    assert_eq!(
        vitals,
        [
            ("temperature", "38.5"),
            ("heart_rate", "88"),
            ("oxygen_saturation", "95%"),
            ("respiratory_rate", "18"),
            ("temperature", "37.9"),
            ("heart_rate", "72"),
        ]
    );
}

#[test]
fn take_without_a_dose_is_not_a_plan() {
    let note = NoteEngine::default()
        .process("Patient does not take her inhaler. Seen by the pt. Take 5 mg of amlodipine daily.")
        .unwrap();
    assert_eq!(
        note.sentences(SectionLabel::Subjective),
        ["Patient does not take her inhaler", "Seen by the pt"]
    );
    assert_eq!(
        note.sentences(SectionLabel::Plan),
        ["Take 5 mg of amlodipine daily"]
    );
}

#[test]
fn consultation_facts() {
    let engine = NoteEngine::new(Capabilities::none().with_entities(Arc::new(LexiconRecognizer)));
    let note = engine.process(CONSULTATION).unwrap();

    let vitals: Vec<(&str, &str)> = note
        .sections
        .objective
        .vitals
        .iter()
        .map(|v| (v.name.as_str(), v.value.as_str()))
        .collect();
    assert_eq!(
        vitals,
        [
            ("blood_pressure", "118/76"),
            ("heart_rate", "88"),
            ("temperature", "38.2"),
        ]
    );
    assert_eq!(note.sections.objective.measurements[0].value, "64");
    assert_eq!(note.sections.plan.medications[0].name, "amoxicillin");
    assert_eq!(
        note.sections.plan.follow_up.as_ref().map(|f| f.unit.as_str()),
        Some("days")
    );
    assert!(note.sections.assessment.diagnoses.contains("pharyngitis"));
    assert!(note.sections.subjective.key_findings.contains("sore throat"));
}

#[test]
fn zero_shot_used_only_without_keywords() {
    let caps = Capabilities::none().with_zero_shot(Arc::new(AlwaysAssessment));
    let note = NoteEngine::new(caps)
        .process("Throat erythematous with exudate. Patient reports fever.")
        .unwrap();
    assert_eq!(
        note.sentences(SectionLabel::Assessment),
        ["Throat erythematous with exudate"]
    );
    assert_eq!(note.sentences(SectionLabel::Subjective), ["Patient reports fever"]);
}

#[test]
fn failing_capabilities_never_fail_processing() {
    let caps = Capabilities::none().with_sentence_boundary(Arc::new(Unreachable));
    let note = NoteEngine::new(caps).process("Denies fever. BP 120/80.").unwrap();
    assert_eq!(note.sentences(SectionLabel::Subjective), ["Denies fever"]);
    assert_eq!(note.sections.objective.vitals[0].value, "120/80");
}

#[test]
fn shared_across_threads() {
    let engine = Arc::new(NoteEngine::new(
        Capabilities::none().with_entities(Arc::new(LexiconRecognizer)),
    ));
    let reference = engine.process(CONSULTATION).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.process(CONSULTATION).unwrap())
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().same_content(&reference));
    }
}
