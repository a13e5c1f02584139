//! Note-structuring engine: sentence segmentation, section classification,
//! fact extraction and SOAP assembly, plus built-in capability providers.

pub mod assembler;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod extractor;
pub mod lexicon;
pub mod segmenter;

#[cfg(feature = "onnx")]
mod zero_shot;
#[cfg(feature = "onnx")]
pub use zero_shot::{EmbeddingZeroShot, SentenceEncoder};

pub use assembler::assemble;
pub use classifier::{Classification, ClassificationSource, SectionClassifier};
pub use config::EngineConfig;
pub use engine::NoteEngine;
pub use extractor::FieldExtractor;
pub use lexicon::LexiconRecognizer;
pub use segmenter::{Segmenter, Sentences};
