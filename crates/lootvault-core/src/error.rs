//! Error types for lootvault core operations.

use crate::ids::IdError;
use crate::withdrawal::WithdrawalStatus;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in core domain logic.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A withdrawal status transition outside the allowed table.
    #[error("invalid withdrawal transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// The current status.
        from: WithdrawalStatus,
        /// The requested status.
        to: WithdrawalStatus,
    },

    /// A withdrawal smaller than the configured minimum.
    #[error("withdrawal of {credits} credits is below the minimum of {minimum}")]
    BelowMinimum {
        /// Credits requested.
        credits: i64,
        /// Configured minimum.
        minimum: i64,
    },

    /// Fees consumed the entire gross payout.
    #[error("quoted net payout is not positive: {net_micros} micro-dollars")]
    QuoteNotPositive {
        /// The non-positive net amount.
        net_micros: i64,
    },

    /// An amount failed validation.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
