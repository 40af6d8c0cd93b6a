//! Ledger entry types and the reason / idempotency-key grammar.
//!
//! Every balance-affecting event appends exactly one immutable entry. The
//! entry records the signed delta, the full bucket snapshot after the
//! mutation (so an idempotent replay can return the committed result), a
//! human-readable reason, and the deduplication key when the caller
//! supplied one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::balance::{BucketBalances, BucketDelta};
use crate::ids::{EntryId, UserId};

/// An immutable audit record of a single balance mutation.
///
/// Entries are never mutated or deleted. IDs are ULIDs, so a user's trail
/// is naturally time-ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry ID (ULID for time-ordering).
    pub id: EntryId,

    /// The user whose balance was affected.
    pub user_id: UserId,

    /// Signed per-bucket delta that was applied.
    pub delta: BucketDelta,

    /// Full bucket snapshot after the mutation.
    pub balance_after: BucketBalances,

    /// Human-readable reason, e.g. `credit_purchase` or `win:doors`.
    pub reason: String,

    /// Deduplication key, when the mutation was submitted with one.
    pub idempotency_key: Option<String>,

    /// When the entry was committed.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a new entry for a just-applied mutation.
    #[must_use]
    pub fn new(
        user_id: UserId,
        delta: BucketDelta,
        balance_after: BucketBalances,
        reason: impl Into<String>,
        idempotency_key: Option<String>,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            user_id,
            delta,
            balance_after,
            reason: reason.into(),
            idempotency_key,
            created_at: Utc::now(),
        }
    }

    /// Bucket snapshot immediately before this entry was applied.
    #[must_use]
    pub fn balance_before(&self) -> BucketBalances {
        BucketBalances {
            purchased: self.balance_after.purchased - self.delta.purchased,
            winnings: self.balance_after.winnings - self.delta.winnings,
            bonus: self.balance_after.bonus - self.delta.bonus,
        }
    }
}

/// Reason strings recorded on ledger entries.
pub mod reasons {
    /// A verified on-chain purchase was credited.
    pub const CREDIT_PURCHASE: &str = "credit_purchase";

    /// A purchase credit was reversed because the purchase record could
    /// not be persisted.
    pub const PURCHASE_ROLLBACK: &str = "purchase_rollback";

    /// A game win was settled, e.g. `win:doors`.
    #[must_use]
    pub fn win(game: &str) -> String {
        format!("win:{game}")
    }

    /// Credits left the system via a withdrawal request.
    #[must_use]
    pub fn withdrawal(id: &crate::ids::WithdrawalId) -> String {
        format!("withdrawal:{id}")
    }

    /// A cancelled withdrawal's credits were restored.
    #[must_use]
    pub fn withdrawal_refund(id: &crate::ids::WithdrawalId) -> String {
        format!("withdrawal_refund:{id}")
    }
}

/// Idempotency-key grammar.
///
/// Keys uniquely identify one logical mutation attempt; applying the same
/// key twice returns the first application's committed result.
pub mod keys {
    use crate::ids::WithdrawalId;

    /// Key for crediting a verified purchase: `purchase:<tx_hash>`.
    #[must_use]
    pub fn purchase(tx_hash: &str) -> String {
        format!("purchase:{tx_hash}")
    }

    /// Key for the compensating rollback of a purchase credit.
    #[must_use]
    pub fn purchase_rollback(tx_hash: &str) -> String {
        format!("purchase:{tx_hash}:rollback")
    }

    /// Key for a withdrawal's bucket decrement.
    #[must_use]
    pub fn withdrawal(id: &WithdrawalId) -> String {
        format!("withdrawal:{id}")
    }

    /// Key for restoring a cancelled withdrawal's credits.
    #[must_use]
    pub fn withdrawal_refund(id: &WithdrawalId) -> String {
        format!("withdrawal_refund:{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::WithdrawalId;

    #[test]
    fn balance_before_reverses_delta() {
        let hash = "ab".repeat(32);
        let entry = LedgerEntry::new(
            UserId::generate(),
            BucketDelta::purchased(1100),
            BucketBalances {
                purchased: 1100,
                winnings: 0,
                bonus: 0,
            },
            reasons::CREDIT_PURCHASE,
            Some(keys::purchase(&hash)),
        );

        assert_eq!(entry.balance_before(), BucketBalances::default());
    }

    #[test]
    fn key_grammar() {
        let hash = "a".repeat(64);
        assert_eq!(keys::purchase(&hash), format!("purchase:{hash}"));
        assert_eq!(
            keys::purchase_rollback(&hash),
            format!("purchase:{hash}:rollback")
        );

        let id = WithdrawalId::generate();
        assert_eq!(keys::withdrawal(&id), format!("withdrawal:{id}"));
        assert_eq!(
            keys::withdrawal_refund(&id),
            format!("withdrawal_refund:{id}")
        );
    }
}
