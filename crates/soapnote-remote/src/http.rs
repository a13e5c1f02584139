//! Blocking HTTP client for a hosted inference server.
//!
//! One client serves all three capabilities. It uses `reqwest`'s blocking
//! API, so call it from synchronous code or `spawn_blocking`, never
//! directly on an async runtime thread.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use soapnote_core::{
    CapabilityError, Entity, EntityRecognizer, SentenceBoundary, ZeroShotClassifier,
    ZeroShotOutput,
};
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RemoteError {
    fn into_capability(self, capability: &'static str) -> CapabilityError {
        match self {
            RemoteError::Json(e) => CapabilityError::malformed(capability, e.to_string()),
            other => CapabilityError::failed(capability, other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    text: &'a str,
    candidate_labels: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct SentencesResponse {
    sentences: Vec<String>,
}

/// One span of aggregated token-classification output.
#[derive(Debug, Deserialize)]
struct NerSpan {
    entity_group: String,
    word: String,
}

/// Client for `{base}/sentences`, `{base}/zero-shot` and `{base}/ner`.
pub struct InferenceClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl InferenceClient {
    /// `base_url` like `http://localhost:8000`; a trailing slash is dropped.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(base_url = %base_url, "inference client ready");
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        route: &str,
        body: &B,
    ) -> Result<R, RemoteError> {
        let url = format!("{}/{route}", self.base_url);
        debug!(url = %url, "inference request");
        let resp = self.client.post(&url).json(body).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(RemoteError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes()?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn sentences(&self, text: &str) -> Result<Vec<String>, RemoteError> {
        let resp: SentencesResponse = self.post("sentences", &TextRequest { text })?;
        Ok(resp.sentences)
    }

    pub fn zero_shot(&self, text: &str, labels: &[&str]) -> Result<ZeroShotOutput, RemoteError> {
        self.post(
            "zero-shot",
            &ZeroShotRequest {
                text,
                candidate_labels: labels,
            },
        )
    }

    pub fn ner(&self, text: &str) -> Result<Vec<Entity>, RemoteError> {
        let spans: Vec<NerSpan> = self.post("ner", &TextRequest { text })?;
        Ok(spans_to_entities(spans))
    }
}

fn spans_to_entities(spans: Vec<NerSpan>) -> Vec<Entity> {
    spans
        .into_iter()
        .map(|s| Entity::new(s.word, s.entity_group))
        .collect()
}

impl SentenceBoundary for InferenceClient {
    fn segment(&self, text: &str) -> Result<Vec<String>, CapabilityError> {
        self.sentences(text)
            .map_err(|e| e.into_capability("sentence boundary"))
    }
}

impl ZeroShotClassifier for InferenceClient {
    fn classify(
        &self,
        text: &str,
        candidate_labels: &[&str],
    ) -> Result<ZeroShotOutput, CapabilityError> {
        let output = self
            .zero_shot(text, candidate_labels)
            .map_err(|e| e.into_capability("zero-shot"))?;
        output.validate("zero-shot")?;
        Ok(output)
    }
}

impl EntityRecognizer for InferenceClient {
    fn extract_entities(&self, text: &str) -> Result<Vec<Entity>, CapabilityError> {
        self.ner(text).map_err(|e| e.into_capability("entity recognition"))
    }
}
