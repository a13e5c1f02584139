//! Clean-up for speech-to-text output before structuring.
//!
//! Recognisers regularly mishear clinical vocabulary and spell readings out
//! in words ("120 over 80"). [`normalize`] rewrites those forms into what a
//! typed note would contain so the pattern library can pick them up.
//! Case is preserved.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Correct term → misheard variants.
const CORRECTIONS: &[(&str, &[&str])] = &[
    ("blood pressure", &["blood fresher", "blood presser"]),
    ("hypertension", &["high pertension", "high tension"]),
    ("diabetes", &["diabetics", "diabeties"]),
];

static CORRECTION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    CORRECTIONS
        .iter()
        .map(|(correct, variants)| {
            let alternation = variants
                .iter()
                .map(|v| regex::escape(v))
                .collect::<Vec<_>>()
                .join("|");
            let re = Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
                .expect("correction pattern compiles");
            (re, *correct)
        })
        .collect()
});

static READING_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\b(\d+)\s*over\s*(\d+)\b", "${1}/${2}"),
        (r"(?i)\b(\d+)\s*bpm\b", "${1} BPM"),
        (r"(?i)\b(\d+(?:\.\d+)?)\s*degrees?\b", "${1}°"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("reading pattern compiles"),
            replacement,
        )
    })
    .collect()
});

/// Apply misheard-term corrections and reading rewrites to a transcript.
pub fn normalize(text: &str) -> String {
    let mut out = Cow::Borrowed(text);

    for (re, correct) in CORRECTION_PATTERNS.iter() {
        if re.is_match(&out) {
            out = Cow::Owned(re.replace_all(&out, *correct).into_owned());
        }
    }

    for (re, replacement) in READING_PATTERNS.iter() {
        if re.is_match(&out) {
            out = Cow::Owned(re.replace_all(&out, *replacement).into_owned());
        }
    }

    out.into_owned()
}
