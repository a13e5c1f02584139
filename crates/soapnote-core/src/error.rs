use thiserror::Error;

/// Failures surfaced to callers of the note-structuring engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SoapError {
    #[error("input text is empty")]
    EmptyInput,
}

/// Failures of an optional collaborator (sentence boundaries, zero-shot
/// classification, entity recognition).
///
/// Never fatal: the engine logs these and degrades to its fallback.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("{0} capability is unavailable")]
    Unavailable(&'static str),

    #[error("{capability} call failed: {message}")]
    Failed {
        capability: &'static str,
        message: String,
    },

    #[error("malformed {capability} response: {message}")]
    Malformed {
        capability: &'static str,
        message: String,
    },
}

impl CapabilityError {
    pub fn failed(capability: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            capability,
            message: message.into(),
        }
    }

    pub fn malformed(capability: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            capability,
            message: message.into(),
        }
    }
}
