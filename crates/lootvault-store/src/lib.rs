//! `RocksDB` storage layer for the lootvault credit ledger.
//!
//! This crate provides persistent storage for balances, ledger entries,
//! credit transactions, withdrawal requests, and settled game sessions
//! using `RocksDB` with column families for efficient indexing.
//!
//! # Architecture
//!
//! - `balances`: one row per user, the only mutable record
//! - `ledger_entries` + `entries_by_user`: the immutable audit log
//! - `idempotency_keys`: caller key → committed entry id
//! - `credit_transactions`: one credit event per funding hash
//! - `withdrawals` + `withdrawals_by_user`: withdrawal requests
//! - `game_sessions`: settled sessions (caller-side settlement dedup)
//! - `totals`: best-effort aggregate counters
//!
//! Every compound mutation holds a per-user lock stripe for its full
//! read-check-write-log sequence and commits through one `WriteBatch`, so
//! other callers observe it fully or not at all.
//!
//! # Example
//!
//! ```no_run
//! use lootvault_store::{RocksStore, Store};
//! use lootvault_core::{BucketDelta, UserId};
//!
//! let store = RocksStore::open("/tmp/lootvault-db").unwrap();
//!
//! let user_id = UserId::generate();
//! let applied = store
//!     .apply(&user_id, BucketDelta::winnings(250), "win:doors", None)
//!     .unwrap();
//! assert_eq!(applied.balance.winnings, 250);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
mod locks;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lootvault_core::{
    Balance, BucketBalances, BucketDelta, CreditTransaction, EntryId, LedgerEntry, UserId,
    WithdrawalId, WithdrawalRequest, WithdrawalStatus,
};

/// The result of a ledger `apply`.
#[derive(Debug, Clone)]
pub struct Applied {
    /// The committed (or replayed) ledger entry.
    pub entry: LedgerEntry,

    /// The bucket snapshot the entry recorded.
    pub balance: BucketBalances,

    /// Whether the idempotency key had already been applied; a replay
    /// mutated nothing and appended no second entry.
    pub replayed: bool,
}

/// The result of crediting a verified purchase.
#[derive(Debug, Clone)]
pub struct PurchaseCredit {
    /// The underlying ledger application.
    pub applied: Applied,

    /// Welcome bonus credits included in the delta, zero if none.
    pub bonus_granted: i64,
}

/// The result of a withdrawal decrement.
#[derive(Debug, Clone)]
pub struct WithdrawalDebit {
    /// Credits drawn from the winnings bucket.
    pub winnings_part: i64,

    /// Credits drawn from the purchased bucket.
    pub purchased_part: i64,

    /// The underlying ledger application.
    pub applied: Applied,
}

/// A settled game session record (settlement dedup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettledSession {
    /// The game that produced the session.
    pub game: String,

    /// When the session was marked settled.
    pub settled_at: DateTime<Utc>,
}

/// Best-effort aggregate counters across all users.
///
/// Not security-critical; a failed bump is logged and never rolls back a
/// credit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateTotals {
    /// Number of credited purchases.
    pub purchase_count: u64,

    /// Total credits sold.
    pub credits_purchased: i64,

    /// Total welcome bonus credits granted.
    pub bonus_granted: i64,

    /// Total credits withdrawn.
    pub credits_withdrawn: i64,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g. `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Balances
    // =========================================================================

    /// Get a balance row by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_balance(&self, user_id: &UserId) -> Result<Option<Balance>>;

    /// Get a balance row, creating a zero row if the user has none yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn ensure_balance(&self, user_id: &UserId) -> Result<Balance>;

    // =========================================================================
    // Idempotent Ledger
    // =========================================================================

    /// Apply a signed per-bucket delta and append one audit entry, as a
    /// single atomic unit.
    ///
    /// With an idempotency key that was already applied, returns the
    /// recorded result (`replayed = true`) without mutating anything.
    /// Creates the balance row if the user has none.
    ///
    /// # Errors
    ///
    /// - `StoreError::InsufficientFunds` if any bucket would go negative;
    ///   nothing is committed.
    /// - `StoreError::Database` if the store is unreachable; retryable,
    ///   nothing was committed.
    fn apply(
        &self,
        user_id: &UserId,
        delta: BucketDelta,
        reason: &str,
        idempotency_key: Option<&str>,
    ) -> Result<Applied>;

    /// Get a ledger entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>>;

    /// Get the entry committed under an idempotency key, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_entry_by_key(&self, idempotency_key: &str) -> Result<Option<LedgerEntry>>;

    /// List ledger entries for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_entries_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>>;

    // =========================================================================
    // Purchases
    // =========================================================================

    /// Credit a verified purchase, deciding the one-time welcome bonus in
    /// the same atomic unit as the credit.
    ///
    /// The bonus is granted iff the user has never claimed it and their
    /// pre-purchase balance is exactly zero; the claim flag, the bucket
    /// update, and the entry all land in one write batch, so two
    /// concurrent first purchases cannot both grant it.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` for non-positive `credits`.
    /// - `StoreError::Database` on storage failure (nothing committed).
    fn credit_purchase(
        &self,
        user_id: &UserId,
        credits: i64,
        bonus_credits: i64,
        idempotency_key: &str,
    ) -> Result<PurchaseCredit>;

    /// Insert the permanent purchase record, enforcing one credit event
    /// per funding hash.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateTransaction` if the hash already has
    /// a record.
    fn insert_credit_transaction(&self, transaction: &CreditTransaction) -> Result<()>;

    /// Get a credit transaction by funding hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_credit_transaction(&self, tx_hash: &str) -> Result<Option<CreditTransaction>>;

    // =========================================================================
    // Withdrawals
    // =========================================================================

    /// Decrement withdrawable credits, winnings first then purchased, as a
    /// single atomic unit keyed by the withdrawal ID.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` for non-positive `credits`.
    /// - `StoreError::InsufficientWithdrawable` if `credits` exceeds
    ///   winnings plus purchased; both buckets are left unchanged.
    fn decrement_withdrawable(
        &self,
        user_id: &UserId,
        credits: i64,
        withdrawal_id: &WithdrawalId,
    ) -> Result<WithdrawalDebit>;

    /// Insert a withdrawal request (also maintains the user index).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_withdrawal(&self, request: &WithdrawalRequest) -> Result<()>;

    /// Get a withdrawal request by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_withdrawal(&self, withdrawal_id: &WithdrawalId) -> Result<Option<WithdrawalRequest>>;

    /// List withdrawal requests for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_withdrawals_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<WithdrawalRequest>>;

    /// Move a withdrawal request to a new status, enforcing the
    /// transition table. An invalid transition is an error and leaves the
    /// request untouched.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the request doesn't exist.
    /// - `StoreError::InvalidTransition` for a disallowed move.
    fn update_withdrawal_status(
        &self,
        withdrawal_id: &WithdrawalId,
        to: WithdrawalStatus,
        proof_of_payment: Option<String>,
    ) -> Result<WithdrawalRequest>;

    // =========================================================================
    // Game sessions
    // =========================================================================

    /// Mark a game session settled before its win is applied.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SessionAlreadySettled` if the session was
    /// already marked.
    fn mark_session_settled(&self, session_id: &str, game: &str) -> Result<()>;

    // =========================================================================
    // Aggregates
    // =========================================================================

    /// Fold a delta into the global aggregate totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; callers treat
    /// this as best-effort and only log it.
    fn bump_totals(&self, delta: &AggregateTotals) -> Result<()>;

    /// Read the global aggregate totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_totals(&self) -> Result<AggregateTotals>;
}
