//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary balance rows, keyed by `user_id`.
    pub const BALANCES: &str = "balances";

    /// Ledger entries, keyed by `entry_id` (ULID).
    pub const LEDGER_ENTRIES: &str = "ledger_entries";

    /// Index: entries by user, keyed by `user_id || entry_id`.
    /// Value is empty (index only).
    pub const ENTRIES_BY_USER: &str = "entries_by_user";

    /// Idempotency keys, keyed by the caller-supplied key string; value is
    /// the 16-byte `entry_id` of the committed entry.
    pub const IDEMPOTENCY_KEYS: &str = "idempotency_keys";

    /// Credit transactions, keyed by `tx_hash`. The primary key doubles as
    /// the uniqueness constraint: one credit event per funding hash.
    pub const CREDIT_TRANSACTIONS: &str = "credit_transactions";

    /// Withdrawal requests, keyed by `withdrawal_id`.
    pub const WITHDRAWALS: &str = "withdrawals";

    /// Index: withdrawals by user, keyed by
    /// `user_id || created_at_millis_be || withdrawal_id`.
    pub const WITHDRAWALS_BY_USER: &str = "withdrawals_by_user";

    /// Settled game sessions, keyed by `session_id` (caller-side
    /// settlement idempotency).
    pub const GAME_SESSIONS: &str = "game_sessions";

    /// Best-effort aggregate totals, single row.
    pub const TOTALS: &str = "totals";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::BALANCES,
        cf::LEDGER_ENTRIES,
        cf::ENTRIES_BY_USER,
        cf::IDEMPOTENCY_KEYS,
        cf::CREDIT_TRANSACTIONS,
        cf::WITHDRAWALS,
        cf::WITHDRAWALS_BY_USER,
        cf::GAME_SESSIONS,
        cf::TOTALS,
    ]
}
