//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use lootvault_core::WithdrawalStatus;

/// API error type.
///
/// The variants mirror the service's error taxonomy: validation and
/// duplicate detection resolve locally with a specific code; verification
/// pending is a 202 response, never an error; anything failing after a
/// successful ledger credit goes through the compensating path before one
/// of these surfaces.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed hash, address, or amount. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The funding hash already produced a credit event. Carries the prior
    /// outcome so the caller knows no money was lost.
    #[error("transaction already processed: {tx_hash}")]
    DuplicateTransaction {
        /// The duplicate hash.
        tx_hash: String,
        /// The prior outcome (transaction id, credits added).
        prior: serde_json::Value,
    },

    /// Verification came back as a hard mismatch or indexer fault.
    #[error("payment verification failed: {0}")]
    VerificationFailed(String),

    /// A delta would take a bucket below zero.
    #[error("insufficient funds in {bucket} bucket")]
    InsufficientFunds {
        /// The offending bucket.
        bucket: &'static str,
        /// Current bucket value.
        balance: i64,
        /// Magnitude requested.
        requested: i64,
    },

    /// Withdrawal larger than winnings plus purchased.
    #[error("insufficient withdrawable credits")]
    InsufficientWithdrawable {
        /// Currently withdrawable.
        withdrawable: i64,
        /// Requested.
        requested: i64,
    },

    /// Disallowed withdrawal status transition.
    #[error("invalid withdrawal transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current status.
        from: WithdrawalStatus,
        /// Requested status.
        to: WithdrawalStatus,
    },

    /// Game session already settled.
    #[error("session already settled: {0}")]
    SessionSettled(String),

    /// The store was unreachable; nothing was committed, safe to retry.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The purchase record could not be written after the credit; the
    /// compensating entry was applied.
    #[error("transaction log failed: {0}")]
    TransactionLogFailed(String),

    /// The compensating entry itself failed. Requires manual
    /// reconciliation.
    #[error("compensation failed: {0}")]
    CompensationFailed(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_input", msg.clone(), None)
            }
            Self::DuplicateTransaction { tx_hash, prior } => (
                StatusCode::BAD_REQUEST,
                "duplicate_transaction",
                format!("transaction {tx_hash} already funded a credit event"),
                Some(prior.clone()),
            ),
            Self::VerificationFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "verification_failed",
                msg.clone(),
                None,
            ),
            Self::InsufficientFunds {
                bucket,
                balance,
                requested,
            } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_funds",
                self.to_string(),
                Some(serde_json::json!({
                    "bucket": bucket,
                    "balance": balance,
                    "requested": requested
                })),
            ),
            Self::InsufficientWithdrawable {
                withdrawable,
                requested,
            } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_withdrawable",
                self.to_string(),
                Some(serde_json::json!({
                    "withdrawable": withdrawable,
                    "requested": requested
                })),
            ),
            Self::InvalidTransition { .. } => (
                StatusCode::CONFLICT,
                "invalid_transition",
                self.to_string(),
                None,
            ),
            Self::SessionSettled(id) => (
                StatusCode::CONFLICT,
                "session_settled",
                format!("session {id} already settled"),
                None,
            ),
            Self::StoreUnavailable(msg) => {
                tracing::error!(error = %msg, "Store unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_unavailable",
                    "Storage temporarily unavailable".to_string(),
                    None,
                )
            }
            Self::TransactionLogFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "transaction_log_failed",
                msg.clone(),
                None,
            ),
            Self::CompensationFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "compensation_failed",
                msg.clone(),
                None,
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<lootvault_store::StoreError> for ApiError {
    fn from(err: lootvault_store::StoreError) -> Self {
        use lootvault_store::StoreError;
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity}: {id}")),
            StoreError::InsufficientFunds {
                bucket,
                balance,
                requested,
            } => Self::InsufficientFunds {
                bucket,
                balance,
                requested,
            },
            StoreError::InsufficientWithdrawable {
                withdrawable,
                requested,
            } => Self::InsufficientWithdrawable {
                withdrawable,
                requested,
            },
            StoreError::DuplicateTransaction { tx_hash } => Self::DuplicateTransaction {
                tx_hash,
                prior: serde_json::Value::Null,
            },
            StoreError::SessionAlreadySettled { session_id } => Self::SessionSettled(session_id),
            StoreError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            StoreError::InvalidAmount { amount } => {
                Self::InvalidInput(format!("invalid amount: {amount}"))
            }
            StoreError::Database(msg) | StoreError::Serialization(msg) => {
                Self::StoreUnavailable(msg)
            }
        }
    }
}

impl From<lootvault_core::CoreError> for ApiError {
    fn from(err: lootvault_core::CoreError) -> Self {
        use lootvault_core::CoreError;
        match err {
            CoreError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            other => Self::InvalidInput(other.to_string()),
        }
    }
}
