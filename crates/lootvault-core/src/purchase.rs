//! Purchase types: the ephemeral payment claim and the permanent credit
//! transaction record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EntryId, UserId};

/// An ephemeral claim that an on-chain payment happened.
///
/// Not persisted; consumed by the payment verifier and, only on success,
/// turned into a [`CreditTransaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentClaim {
    /// The claimed transaction hash (64 hex characters).
    pub tx_hash: String,

    /// The on-chain amount expected to have been paid, in base units.
    pub expected_amount: u128,

    /// The destination address expected to have received the payment.
    pub expected_address: String,

    /// The wallet address making the claim.
    pub wallet_address: String,
}

/// The permanent record of a purchase that funded a credit event.
///
/// Keyed uniquely by `tx_hash`: a given transaction hash may fund exactly
/// one credit event, enforced by the store before the credit is allowed to
/// stand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// The funding transaction hash (unique).
    pub tx_hash: String,

    /// The credited user.
    pub user_id: UserId,

    /// The wallet address the claim came from.
    pub wallet_address: String,

    /// Credits purchased (excluding bonus).
    pub credits: i64,

    /// Welcome bonus credits granted alongside the purchase, zero if none.
    pub bonus_credits: i64,

    /// The ledger entry that applied the credit.
    pub entry_id: EntryId,

    /// The verified on-chain amount in base units, as a decimal string to
    /// avoid precision loss.
    pub amount_paid: String,

    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    /// Build the record for a just-credited purchase.
    #[must_use]
    pub fn new(
        claim: &PaymentClaim,
        user_id: UserId,
        credits: i64,
        bonus_credits: i64,
        entry_id: EntryId,
    ) -> Self {
        Self {
            tx_hash: claim.tx_hash.clone(),
            user_id,
            wallet_address: claim.wallet_address.clone(),
            credits,
            bonus_credits,
            entry_id,
            amount_paid: claim.expected_amount.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Total credits this transaction added (purchase plus bonus).
    #[must_use]
    pub const fn credits_added(&self) -> i64 {
        self.credits + self.bonus_credits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_transaction_from_claim() {
        let claim = PaymentClaim {
            tx_hash: "c".repeat(64),
            expected_amount: 340_282_366_920_938_463_463_374_607_431_768_211_455,
            expected_address: format!("0x{}", "d".repeat(40)),
            wallet_address: format!("0x{}", "e".repeat(40)),
        };

        let tx = CreditTransaction::new(&claim, UserId::generate(), 1000, 100, EntryId::generate());
        assert_eq!(tx.credits_added(), 1100);
        // u128::MAX survives the string encoding untouched.
        assert_eq!(tx.amount_paid.parse::<u128>().unwrap(), claim.expected_amount);
    }
}
