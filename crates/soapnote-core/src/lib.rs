//! Core types for SOAP note structuring: the note model, the pattern
//! library, and the contracts for optional NLP collaborators.

pub mod capability;
pub mod error;
pub mod note;
pub mod patterns;
pub mod transcript;

pub use capability::{
    Capabilities, Entity, EntityRecognizer, SentenceBoundary, ZeroShotClassifier, ZeroShotOutput,
};
pub use error::{CapabilityError, SoapError};
pub use note::{
    ClassifiedSentence, ExtractedFact, FollowUp, Measurement, MeasurementKind, Medication,
    NO_INFORMATION, SectionLabel, Sentence, SoapNote, Vital, VitalSign,
};
