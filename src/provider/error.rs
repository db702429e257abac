//! Provider error types

use thiserror::Error;

/// Failures talking to the recording-bot provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider answered with a non-2xx status
    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, TLS or timeout failure
    #[error("Provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Body could not be decoded into the expected type
    #[error("Failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Response decoded but lacked a required field
    #[error("Provider response missing field: {0}")]
    MissingField(&'static str),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}
