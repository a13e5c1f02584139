//! Pattern library: section keyword vocabularies and fact extractors.
//!
//! Everything here is a static table compiled once on first use and shared
//! read-only. Lookups are pure.
//!
//! # Keyword matching
//!
//! Keywords match case-insensitively on whole words, so `test` does not fire
//! on "latest" and `plan` does not fire on "explanation". Multi-word keywords
//! tolerate any run of whitespace between words. Inflections that should
//! count are listed explicitly.
//!
//! Two sections also accept a cue pattern in place of a keyword: any vital
//! reading ("T 37.9", "Pulse 88") counts for Objective, and a dose
//! instruction ("take 500 mg") counts for Plan.

use std::sync::LazyLock;

use regex::Regex;

use crate::note::{MeasurementKind, SectionLabel, VitalSign};

const SUBJECTIVE_KEYWORDS: &[&str] = &[
    "reports",
    "patient reports",
    "report",
    "reported",
    "complains of",
    "complains",
    "complaint",
    "states",
    "patient states",
    "stated",
    "describes",
    "feels",
    "feel",
    "feeling",
    "denies",
    "denied",
    "admits",
    "history",
    "symptoms",
    "symptom",
    "pain scale",
    "pain",
];

const OBJECTIVE_KEYWORDS: &[&str] = &[
    "vital signs",
    "vitals",
    "vital",
    "examination reveals",
    "examination",
    "exam",
    "observed",
    "observe",
    "auscultation",
    "palpation",
    "measured",
    "measure",
    "test results",
    "test",
    "tests",
    "lab values",
    "labs",
    "findings",
    "blood pressure",
    "temperature",
    "heart rate",
    "respiratory rate",
    "oxygen saturation",
    "o2 sat",
    "saturation",
    "pulse",
    "temp",
    "resp rate",
    "bp",
    "hr",
    "rr",
    "spo2",
    "bmi",
    "weight",
    "height",
];

const ASSESSMENT_KEYWORDS: &[&str] = &[
    "diagnosis",
    "diagnosed",
    "diagnose",
    "impression",
    "likely",
    "suspected",
    "suspect",
    "differential",
    "consistent with",
    "suggests",
    "suggestive of",
    "indicates",
    "assessment",
    "condition",
    "rule out",
];

const PLAN_KEYWORDS: &[&str] = &[
    "recommend",
    "recommended",
    "recommends",
    "prescribe",
    "prescribed",
    "plan",
    "treatment",
    "treat",
    "follow up",
    "follow-up",
    "refer",
    "referral",
    "referred",
    "order",
    "ordered",
    "schedule",
    "scheduled",
    "instructions",
    "instructed",
    "education",
    "therapy",
    "medication",
];

/// Words that can follow a dose but are not a drug name
/// ("500 mg twice daily", "10 mg tablet").
const NON_DRUG_WORDS: &[&str] = &[
    "a", "and", "at", "bid", "by", "cap", "caps", "capsule", "capsules", "daily", "each", "every",
    "for", "im", "in", "iv", "x", "once", "oral", "orally", "per", "po", "prn", "qd", "qid",
    "tab", "tabs", "tablet", "tablets", "the", "three", "tid", "to", "twice", "with",
];

/// Vocabulary for `section`, as listed (not lower-cased or compiled).
pub fn section_keywords(section: SectionLabel) -> &'static [&'static str] {
    match section {
        SectionLabel::Subjective => SUBJECTIVE_KEYWORDS,
        SectionLabel::Objective => OBJECTIVE_KEYWORDS,
        SectionLabel::Assessment => ASSESSMENT_KEYWORDS,
        SectionLabel::Plan => PLAN_KEYWORDS,
    }
}

struct KeywordSet {
    section: SectionLabel,
    regex: Regex,
}

impl KeywordSet {
    fn find<'a>(&self, sentence: &'a str) -> Option<&'a str> {
        self.regex
            .find(sentence)
            .or_else(|| cue_match(self.section, sentence))
            .map(|m| m.as_str())
    }
}

/// "take 500 mg": an instruction, unlike "does not take her inhaler".
static DOSE_INSTRUCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\btake\s+\d+(?:\.\d+)?\s*(?:mg/ml|mcg/ml|mg|mcg|ml|g)\b")
        .expect("dose instruction pattern compiles")
});

fn cue_match<'a>(section: SectionLabel, sentence: &'a str) -> Option<regex::Match<'a>> {
    match section {
        SectionLabel::Objective => VITAL_PATTERNS.iter().find_map(|(_, re)| re.find(sentence)),
        SectionLabel::Plan => DOSE_INSTRUCTION.find(sentence),
        _ => None,
    }
}

/// Compiled keyword sets, in [`SectionLabel::PRIORITY`] order.
static KEYWORD_SETS: LazyLock<Vec<KeywordSet>> = LazyLock::new(|| {
    SectionLabel::PRIORITY
        .iter()
        .map(|&section| KeywordSet {
            section,
            regex: keyword_regex(section_keywords(section)),
        })
        .collect()
});

fn keyword_regex(keywords: &[&str]) -> Regex {
    let alternation = keywords
        .iter()
        .map(|k| {
            k.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("keyword table compiles")
}

/// First keyword hit in priority order: the section and the matched text.
pub fn keyword_match(sentence: &str) -> Option<(SectionLabel, &str)> {
    KEYWORD_SETS
        .iter()
        .find_map(|set| set.find(sentence).map(|m| (set.section, m)))
}

/// Section whose keywords match `sentence`, resolved by priority order.
pub fn matching_section(sentence: &str) -> Option<SectionLabel> {
    keyword_match(sentence).map(|(section, _)| section)
}

/// Every section whose keyword set matches, in priority order.
pub fn matching_sections(sentence: &str) -> Vec<SectionLabel> {
    KEYWORD_SETS
        .iter()
        .filter(|set| set.find(sentence).is_some())
        .map(|set| set.section)
        .collect()
}

// ── Fact extractors ──

/// Optional connective between a label and its reading: "BP of 120/80".
const CONNECTIVE: &str = r"[:\s]*(?:(?i:of|is|was)\s+)?";

static VITAL_PATTERNS: LazyLock<Vec<(VitalSign, Regex)>> = LazyLock::new(|| {
    let table = [
        (
            VitalSign::BloodPressure,
            r"\b(?i:bp|blood\s+pressure)\b",
            r"(\d{2,3}/\d{2,3})",
        ),
        (
            VitalSign::HeartRate,
            r"\b(?i:hr|heart\s+rate|pulse)\b",
            r"(\d{2,3})(?:\s*(?i:bpm|/min))?\b",
        ),
        // A bare `T` is only an abbreviation in upper case.
        (
            VitalSign::Temperature,
            r"\b(?:T|(?i:temp|temperature))\b",
            r"(\d{2,3}(?:\.\d+)?)",
        ),
        (
            VitalSign::RespiratoryRate,
            r"\b(?i:rr|resp(?:iratory)?\s+rate)\b",
            r"(\d{1,2})(?:\s*(?i:bpm|/min))?\b",
        ),
        (
            VitalSign::OxygenSaturation,
            r"\b(?i:spo2|o2\s+sat(?:uration)?|oxygen\s+saturation)\b",
            r"(\d{2,3}%?)",
        ),
    ];
    table
        .into_iter()
        .map(|(vital, label, value)| {
            let re = Regex::new(&format!("{label}{CONNECTIVE}{value}")).expect("vital pattern compiles");
            (vital, re)
        })
        .collect()
});

static MEASUREMENT_PATTERNS: LazyLock<Vec<(MeasurementKind, Regex)>> = LazyLock::new(|| {
    [
        (
            MeasurementKind::Weight,
            r"(?i)\b(\d+(?:\.\d+)?)\s*(kg|kgs|lbs?|pounds)\b".to_string(),
        ),
        (
            MeasurementKind::Height,
            r"(?i)\b(\d+(?:\.\d+)?)\s*(cm|m|meters|metres)\b".to_string(),
        ),
        (
            MeasurementKind::Bmi,
            format!(r"\b(?i:bmi)\b{CONNECTIVE}(\d+(?:\.\d+)?)"),
        ),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(&pattern).expect("measurement pattern compiles")))
    .collect()
});

static MEDICATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?\s*(?:mg/ml|mcg/ml|mg|mcg|ml|g))\b\s*(?:of\s+)?([a-z][a-z-]*)")
        .expect("medication pattern compiles")
});

static FOLLOW_UP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfollow[\s-]*up\s+in\s+(\d+)\s+(days?|weeks?|months?)\b")
        .expect("follow-up pattern compiles")
});

/// Vital-sign extractors. Capture group 1 is the reading.
pub fn vital_patterns() -> &'static [(VitalSign, Regex)] {
    &VITAL_PATTERNS
}

/// Weight, height, and BMI extractors. Group 1 is the value, group 2 the
/// unit where the pattern has one.
pub fn measurement_patterns() -> &'static [(MeasurementKind, Regex)] {
    &MEASUREMENT_PATTERNS
}

/// Dose followed by a drug name. Group 1 is quantity+unit, group 2 the name.
pub fn medication_pattern() -> &'static Regex {
    &MEDICATION_PATTERN
}

/// "follow up in N days/weeks/months". Group 1 is N, group 2 the unit.
pub fn follow_up_pattern() -> &'static Regex {
    &FOLLOW_UP_PATTERN
}

/// Whether a word following a dose can be taken as the drug name.
pub fn is_drug_name(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    lower.len() > 1 && !NON_DRUG_WORDS.contains(&lower.as_str())
}
