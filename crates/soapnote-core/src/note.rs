//! SOAP note data model: sentences, section labels, extracted facts, and the
//! assembled note.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder text for a section that received no sentences.
pub const NO_INFORMATION: &str = "No information found";

/// A trimmed sentence and its position in the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub index: usize,
    pub text: String,
}

impl Sentence {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// The four SOAP sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionLabel {
    Subjective,
    Objective,
    Assessment,
    Plan,
}

impl SectionLabel {
    /// Document order: S, O, A, P.
    pub const DOCUMENT_ORDER: [SectionLabel; 4] = [
        Self::Subjective,
        Self::Objective,
        Self::Assessment,
        Self::Plan,
    ];

    /// Classification priority. A sentence that matches several keyword sets
    /// is assigned to whichever of them comes first here.
    pub const PRIORITY: [SectionLabel; 4] = [
        Self::Plan,
        Self::Subjective,
        Self::Objective,
        Self::Assessment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subjective => "subjective",
            Self::Objective => "objective",
            Self::Assessment => "assessment",
            Self::Plan => "plan",
        }
    }

    /// Display title, as used for the section keys on the wire.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Subjective => "Subjective",
            Self::Objective => "Objective",
            Self::Assessment => "Assessment",
            Self::Plan => "Plan",
        }
    }

    /// Position in [`SectionLabel::PRIORITY`]; lower wins.
    pub fn priority_rank(&self) -> usize {
        match self {
            Self::Plan => 0,
            Self::Subjective => 1,
            Self::Objective => 2,
            Self::Assessment => 3,
        }
    }
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SectionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subjective" | "s" => Ok(Self::Subjective),
            "objective" | "o" => Ok(Self::Objective),
            "assessment" | "a" => Ok(Self::Assessment),
            "plan" | "p" => Ok(Self::Plan),
            other => Err(format!("unknown SOAP section: {other:?}")),
        }
    }
}

/// Standard physiological measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalSign {
    BloodPressure,
    HeartRate,
    Temperature,
    RespiratoryRate,
    OxygenSaturation,
}

impl VitalSign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BloodPressure => "blood_pressure",
            Self::HeartRate => "heart_rate",
            Self::Temperature => "temperature",
            Self::RespiratoryRate => "respiratory_rate",
            Self::OxygenSaturation => "oxygen_saturation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    Weight,
    Height,
    Bmi,
}

impl MeasurementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Height => "height",
            Self::Bmi => "bmi",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vital {
    pub name: VitalSign,
    /// Raw matched text, e.g. `120/80` or `98%`.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: MeasurementKind,
    pub value: String,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    /// Quantity and unit as written, e.g. `500 mg`.
    pub dosage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub duration: String,
    pub unit: String,
}

/// A structured fact pulled from one sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractedFact {
    Vital(Vital),
    Measurement(Measurement),
    Medication(Medication),
    FollowUp(FollowUp),
    Diagnosis { text: String },
    KeyFinding { text: String },
}

impl ExtractedFact {
    pub fn vital(name: VitalSign, value: impl Into<String>) -> Self {
        Self::Vital(Vital {
            name,
            value: value.into(),
        })
    }

    pub fn medication(name: impl Into<String>, dosage: impl Into<String>) -> Self {
        Self::Medication(Medication {
            name: name.into(),
            dosage: dosage.into(),
        })
    }

    pub fn follow_up(duration: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::FollowUp(FollowUp {
            duration: duration.into(),
            unit: unit.into(),
        })
    }
}

/// A sentence after classification and extraction, ready for assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedSentence {
    pub sentence: Sentence,
    pub section: SectionLabel,
    pub facts: Vec<ExtractedFact>,
}

// ── Sections ──

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectiveSection {
    pub text: String,
    pub sentences: Vec<String>,
    pub key_findings: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveSection {
    pub text: String,
    pub sentences: Vec<String>,
    pub vitals: Vec<Vital>,
    pub measurements: Vec<Measurement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentSection {
    pub text: String,
    pub sentences: Vec<String>,
    pub diagnoses: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSection {
    pub text: String,
    pub sentences: Vec<String>,
    pub medications: Vec<Medication>,
    pub follow_up: Option<FollowUp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    #[serde(rename = "Subjective")]
    pub subjective: SubjectiveSection,
    #[serde(rename = "Objective")]
    pub objective: ObjectiveSection,
    #[serde(rename = "Assessment")]
    pub assessment: AssessmentSection,
    #[serde(rename = "Plan")]
    pub plan: PlanSection,
}

/// A structured SOAP note. Produced fresh for every input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoapNote {
    pub timestamp: DateTime<Utc>,
    pub sections: Sections,
}

impl SoapNote {
    pub fn text(&self, section: SectionLabel) -> &str {
        match section {
            SectionLabel::Subjective => &self.sections.subjective.text,
            SectionLabel::Objective => &self.sections.objective.text,
            SectionLabel::Assessment => &self.sections.assessment.text,
            SectionLabel::Plan => &self.sections.plan.text,
        }
    }

    pub fn sentences(&self, section: SectionLabel) -> &[String] {
        match section {
            SectionLabel::Subjective => &self.sections.subjective.sentences,
            SectionLabel::Objective => &self.sections.objective.sentences,
            SectionLabel::Assessment => &self.sections.assessment.sentences,
            SectionLabel::Plan => &self.sections.plan.sentences,
        }
    }

    /// True when no sentence was routed to `section`.
    pub fn is_empty(&self, section: SectionLabel) -> bool {
        self.sentences(section).is_empty()
    }

    /// Content equality, ignoring the creation timestamp.
    pub fn same_content(&self, other: &SoapNote) -> bool {
        self.sections == other.sections
    }
}
