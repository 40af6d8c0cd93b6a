//! Error types for chain operations.

/// Errors that can occur while talking to the blockchain indexer.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Malformed hash, address, or amount. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// HTTP transport failure. Hard error, aborts verification.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The indexer rejected the request (bad credentials, malformed
    /// request, server fault). Hard error, aborts verification.
    #[error("indexer error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the indexer.
        message: String,
    },

    /// The indexer answered with a shape we could not normalize.
    #[error("malformed indexer response: {0}")]
    MalformedResponse(String),
}
