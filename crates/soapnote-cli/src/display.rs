//! Vertical card display for structured notes.

use std::fmt::Write;

use soapnote_core::{SectionLabel, SoapNote, patterns};

const LABEL_WIDTH: usize = 26;

/// Print a note as a card: one block per section in S, O, A, P order.
pub fn print_note(note: &SoapNote) {
    print!("{}", render_note(note));
}

/// Print each section's keyword vocabulary in classification priority order.
pub fn print_keywords() {
    print!("{}", render_keywords());
}

pub fn render_note(note: &SoapNote) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== SOAP note ===");
    let _ = writeln!(out, "{}", note.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out);

    for label in SectionLabel::DOCUMENT_ORDER {
        let _ = writeln!(out, "{}", label.title());
        row(&mut out, "text", note.text(label));

        let s = &note.sections;
        match label {
            SectionLabel::Subjective => {
                list_row(&mut out, "key findings", s.subjective.key_findings.iter());
            }
            SectionLabel::Objective => {
                for vital in &s.objective.vitals {
                    row(&mut out, vital.name.as_str(), &vital.value);
                }
                for m in &s.objective.measurements {
                    let value = match &m.unit {
                        Some(unit) => format!("{} {unit}", m.value),
                        None => m.value.clone(),
                    };
                    row(&mut out, m.name.as_str(), &value);
                }
            }
            SectionLabel::Assessment => {
                list_row(&mut out, "diagnoses", s.assessment.diagnoses.iter());
            }
            SectionLabel::Plan => {
                for med in &s.plan.medications {
                    row(&mut out, "medication", &format!("{} {}", med.name, med.dosage));
                }
                if let Some(f) = &s.plan.follow_up {
                    row(&mut out, "follow up", &format!("{} {}", f.duration, f.unit));
                }
            }
        }
        let _ = writeln!(out);
    }
    out
}

pub fn render_keywords() -> String {
    let mut out = String::new();
    for (rank, label) in SectionLabel::PRIORITY.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", rank + 1, label.title());
        let _ = writeln!(out, "  {}", patterns::section_keywords(*label).join(", "));
    }
    out
}

fn row(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "  {label:<LABEL_WIDTH$} {value}");
}

fn list_row<'a>(out: &mut String, label: &str, items: impl Iterator<Item = &'a String>) {
    let items: Vec<&str> = items.map(String::as_str).collect();
    if !items.is_empty() {
        row(out, label, &items.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soapnote_ai::NoteEngine;

    #[test]
    fn card_lists_sections_and_facts() {
        let note = NoteEngine::default()
            .process("Denies fever. BP 120/80. Take 5 mg of amlodipine daily.")
            .unwrap();
        let card = render_note(&note);

        let order: Vec<usize> = ["Subjective", "Objective", "Assessment", "Plan"]
            .iter()
            .map(|t| card.find(&format!("\n{t}\n")).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(card.contains("blood_pressure"));
        assert!(card.contains("amlodipine 5 mg"));
        assert!(card.contains("No information found"));
    }

    #[test]
    fn keywords_in_priority_order() {
        let listing = render_keywords();
        assert!(listing.starts_with("1. Plan\n"));
        assert!(listing.contains("4. Assessment\n"));
    }
}
