//! Error types for the client SDK.

use serde::Deserialize;

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned an error envelope.
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code, e.g. `duplicate_transaction`.
        code: String,
        /// Human-readable message.
        message: String,
        /// Structured details, when present.
        details: Option<serde_json::Value>,
    },

    /// The service answered with a shape the SDK could not parse.
    #[error("unexpected response: {0}")]
    Unexpected(String),

    /// Client configuration problem.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// The service's JSON error envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
