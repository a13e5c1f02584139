//! Sentence segmentation.
//!
//! Uses the injected [`SentenceBoundary`] capability when one is configured
//! and falls back to splitting on terminal punctuation when it is absent or
//! fails. Either way the result is a cloneable iterator, so a caller can
//! walk the sentences more than once.

use std::borrow::Cow;
use std::sync::Arc;

use soapnote_core::{SentenceBoundary, Sentence};
use tracing::warn;

const TERMINALS: [char; 3] = ['.', '!', '?'];

/// Lower-cased titles and connectives that never close a sentence.
/// Clinical shorthand such as "pt" or "hx" often does, so it is not listed.
const ABBREVIATIONS: &[&str] = &["dr", "mr", "mrs", "prof", "vs", "approx", "e.g", "i.e"];

#[derive(Clone, Default)]
pub struct Segmenter {
    boundary: Option<Arc<dyn SentenceBoundary>>,
}

impl Segmenter {
    pub fn new(boundary: Option<Arc<dyn SentenceBoundary>>) -> Self {
        Self { boundary }
    }

    /// Split `text` into trimmed, non-empty sentences in document order.
    pub fn segment<'a>(&self, text: &'a str) -> Sentences<'a> {
        if text.trim().is_empty() {
            return Sentences::new(Source::Spans(Vec::new().into_iter()));
        }

        if let Some(boundary) = &self.boundary {
            match boundary.segment(text) {
                Ok(spans) => return Sentences::new(Source::Spans(spans.into_iter())),
                Err(e) => warn!(error = %e, "sentence boundary capability failed, splitting on punctuation"),
            }
        }

        Sentences::new(Source::Punctuation(Fragments { text, pos: 0 }))
    }
}

/// Lazy sentence sequence. Clone it to iterate again from the current point.
#[derive(Clone)]
pub struct Sentences<'a> {
    source: Source<'a>,
    next_index: usize,
}

#[derive(Clone)]
enum Source<'a> {
    Punctuation(Fragments<'a>),
    Spans(std::vec::IntoIter<String>),
}

impl<'a> Sentences<'a> {
    fn new(source: Source<'a>) -> Self {
        Self {
            source,
            next_index: 0,
        }
    }
}

impl Iterator for Sentences<'_> {
    type Item = Sentence;

    fn next(&mut self) -> Option<Sentence> {
        loop {
            let raw: Cow<'_, str> = match &mut self.source {
                Source::Punctuation(fragments) => Cow::Borrowed(fragments.next()?),
                Source::Spans(spans) => Cow::Owned(spans.next()?),
            };
            let cleaned = clean(&raw);
            if cleaned.is_empty() {
                continue;
            }
            let sentence = Sentence::new(self.next_index, cleaned);
            self.next_index += 1;
            return Some(sentence);
        }
    }
}

/// Trim a fragment and drop its terminal punctuation.
fn clean(fragment: &str) -> &str {
    fragment.trim().trim_end_matches(TERMINALS).trim_end()
}

/// Raw punctuation-delimited fragments, terminal punctuation included.
#[derive(Clone)]
struct Fragments<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for Fragments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.pos >= self.text.len() {
            return None;
        }
        let rest = &self.text[self.pos..];
        let end = sentence_end(rest).unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }
}

/// Byte offset just past the first sentence-terminal run in `text`.
///
/// A run of `.`, `!`, `?` ends a sentence only when followed by whitespace
/// or the end of the text, so decimals ("37.5") and dotted tokens stay
/// whole. A period closing a known abbreviation never ends one.
fn sentence_end(text: &str) -> Option<usize> {
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if !TERMINALS.contains(&c) {
            continue;
        }

        let mut end = start + c.len_utf8();
        while let Some(&(i, next)) = chars.peek() {
            if !TERMINALS.contains(&next) {
                break;
            }
            end = i + next.len_utf8();
            chars.next();
        }

        let followed_by_space = text[end..].chars().next().is_none_or(char::is_whitespace);
        if !followed_by_space {
            continue;
        }
        if c == '.' && end == start + 1 && ends_with_abbreviation(&text[..start]) {
            continue;
        }
        return Some(end);
    }
    None
}

fn ends_with_abbreviation(before: &str) -> bool {
    let word = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    ABBREVIATIONS.contains(&word.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use soapnote_core::CapabilityError;

    fn texts(segmenter: &Segmenter, input: &str) -> Vec<String> {
        segmenter.segment(input).map(|s| s.text).collect()
    }

    struct Lines;

    impl SentenceBoundary for Lines {
        fn segment(&self, text: &str) -> Result<Vec<String>, CapabilityError> {
            Ok(text.lines().map(str::to_string).collect())
        }
    }

    struct Broken;

    impl SentenceBoundary for Broken {
        fn segment(&self, _text: &str) -> Result<Vec<String>, CapabilityError> {
            Err(CapabilityError::Unavailable("sentence boundary"))
        }
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let seg = Segmenter::default();
        assert_eq!(
            texts(&seg, "Patient reports headache. Any fever? No!  Follow up in 2 weeks."),
            vec![
                "Patient reports headache",
                "Any fever",
                "No",
                "Follow up in 2 weeks"
            ]
        );
    }

    #[test]
    fn indexes_follow_document_order() {
        let seg = Segmenter::default();
        let indexes: Vec<usize> = seg.segment("One. . Two.  Three").map(|s| s.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn empty_and_blank_input_yield_nothing() {
        let seg = Segmenter::default();
        assert_eq!(seg.segment("").count(), 0);
        assert_eq!(seg.segment("   \n\t").count(), 0);
        assert_eq!(seg.segment("...").count(), 0);
    }

    #[test]
    fn decimals_and_abbreviations_do_not_split() {
        let seg = Segmenter::default();
        assert_eq!(
            texts(&seg, "T 37.5 this morning. Seen by Dr. Patel vs. Dr. Shah today."),
            vec!["T 37.5 this morning", "Seen by Dr. Patel vs. Dr. Shah today"]
        );
    }

    #[test]
    fn clinical_shorthand_can_end_a_sentence() {
        let seg = Segmenter::default();
        assert_eq!(
            texts(&seg, "Seen by the pt. Lungs clear. No relevant hx. Approx. 2 cm lesion."),
            vec!["Seen by the pt", "Lungs clear", "No relevant hx", "Approx. 2 cm lesion"]
        );
    }

    #[test]
    fn punctuation_runs_end_one_sentence() {
        let seg = Segmenter::default();
        assert_eq!(texts(&seg, "Really?! Yes..."), vec!["Really", "Yes"]);
    }

    #[test]
    fn reconstructs_non_whitespace_content() {
        let input = "BP: 120/80, HR: 72. Patient reports chest pain!  Refer to cardiology? ok";
        let strip = |s: &str| -> String {
            s.chars()
                .filter(|c| !c.is_whitespace() && !TERMINALS.contains(c))
                .collect()
        };
        let joined: String = texts(&Segmenter::default(), input).concat();
        assert_eq!(strip(&joined), strip(input));
    }

    #[test]
    fn sequence_is_restartable() {
        let seg = Segmenter::default();
        let sentences = seg.segment("A. B. C.");
        let first: Vec<_> = sentences.clone().collect();
        let second: Vec<_> = sentences.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn capability_spans_are_cleaned() {
        let seg = Segmenter::new(Some(Arc::new(Lines)));
        assert_eq!(
            texts(&seg, "  Denies fever.\n\nBP 130/85  \n"),
            vec!["Denies fever", "BP 130/85"]
        );
    }

    #[test]
    fn failing_capability_falls_back_to_punctuation() {
        let seg = Segmenter::new(Some(Arc::new(Broken)));
        assert_eq!(texts(&seg, "One. Two."), vec!["One", "Two"]);
    }
}
