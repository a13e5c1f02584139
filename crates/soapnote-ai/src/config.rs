//! Engine options, loadable from a JSON file.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use soapnote_core::SectionLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Section for sentences with no keyword hit and no zero-shot answer.
    pub default_section: SectionLabel,
    /// Rewrite misheard terms and spoken readings before segmentation.
    pub normalize_transcripts: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_section: SectionLabel::Subjective,
            normalize_transcripts: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("parse engine config")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read engine config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("in {}", path.display()))
    }
}
