//! Error types for lootvault storage.

use lootvault_core::WithdrawalStatus;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
///
/// A failed operation commits nothing: every compound mutation goes
/// through a single `WriteBatch`, so callers may retry `Database` failures
/// without risking partial state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record.
        entity: &'static str,
        /// The looked-up identifier.
        id: String,
    },

    /// A delta would take a bucket below zero.
    #[error("insufficient funds in {bucket} bucket: balance={balance}, requested={requested}")]
    InsufficientFunds {
        /// The bucket that would go negative.
        bucket: &'static str,
        /// Current bucket value.
        balance: i64,
        /// Magnitude of the attempted decrement.
        requested: i64,
    },

    /// A withdrawal larger than winnings plus purchased.
    #[error("insufficient withdrawable credits: withdrawable={withdrawable}, requested={requested}")]
    InsufficientWithdrawable {
        /// Currently withdrawable credits.
        withdrawable: i64,
        /// Credits requested.
        requested: i64,
    },

    /// A funding hash that already produced a credit event.
    #[error("transaction already funded a credit event: {tx_hash}")]
    DuplicateTransaction {
        /// The duplicate hash.
        tx_hash: String,
    },

    /// A game session that was already settled.
    #[error("session already settled: {session_id}")]
    SessionAlreadySettled {
        /// The duplicate session.
        session_id: String,
    },

    /// A withdrawal status transition outside the allowed table.
    #[error("invalid withdrawal transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// The current status.
        from: WithdrawalStatus,
        /// The requested status.
        to: WithdrawalStatus,
    },

    /// An amount that makes no sense for the operation.
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: i64,
    },
}
