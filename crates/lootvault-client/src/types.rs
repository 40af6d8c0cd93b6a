//! Request and response types for the lootvault API.

use serde::{Deserialize, Serialize};

use lootvault_core::{BucketBalances, PayoutQuote};

/// Purchase request payload.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseRequest {
    /// The funding transaction hash (64 hex characters).
    pub tx_hash: String,
    /// Credits being purchased.
    pub credits: i64,
    /// The claiming wallet address.
    pub wallet_address: String,
    /// The on-chain amount in base units, as a decimal string.
    pub expected_amount: String,
    /// The destination address expected to have received the payment.
    pub expected_address: String,
}

/// A credited purchase.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseReceipt {
    /// The funding hash.
    pub tx_hash: String,
    /// The ledger entry that applied the credit.
    pub entry_id: String,
    /// Credits added, including any welcome bonus.
    pub credits_added: i64,
    /// Welcome bonus portion, zero if none.
    pub bonus_granted: i64,
    /// Total balance before the credit.
    pub old_balance: i64,
    /// Total balance after the credit.
    pub new_balance: i64,
    /// Bucket snapshot after the credit.
    pub buckets: BucketBalances,
}

/// Outcome of a purchase call.
#[derive(Debug, Clone)]
pub enum PurchaseOutcome {
    /// Verified and credited.
    Credited(PurchaseReceipt),

    /// Not indexed yet; poll again after the suggested interval.
    Pending {
        /// Suggested poll interval in seconds.
        retry_after_secs: u64,
    },
}

/// Current balance buckets.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceInfo {
    /// Purchased credits.
    pub purchased: i64,
    /// Winnings credits.
    pub winnings: i64,
    /// Bonus credits.
    pub bonus: i64,
    /// Total across all buckets.
    pub total: i64,
    /// Credits currently eligible for withdrawal.
    pub withdrawable: i64,
    /// Whether the welcome bonus was ever granted.
    pub welcome_bonus_claimed: bool,
}

/// Withdrawal submit payload.
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawRequest {
    /// Credits to withdraw.
    pub credits: i64,
    /// Destination blockchain address.
    pub destination_address: String,
}

/// A withdrawal request as the service reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalInfo {
    /// Request ID.
    pub id: String,
    /// Current status (`pending`, `processing`, `completed`, `cancelled`).
    pub status: String,
    /// Credits requested.
    pub credits: i64,
    /// Credits drawn from winnings.
    pub winnings_part: i64,
    /// Credits drawn from purchased.
    pub purchased_part: i64,
    /// Destination address.
    pub destination_address: String,
    /// The quote snapshotted at submit time.
    pub quote: PayoutQuote,
    /// Proof-of-payment, present once completed.
    #[serde(default)]
    pub proof_of_payment: Option<String>,
}

/// Settlement payload for game engines.
#[derive(Debug, Clone, Serialize)]
pub struct SettleRequest {
    /// One-time session ID.
    pub session_id: String,
    /// The game that produced the outcome.
    pub game: String,
    /// The winning user.
    pub user_id: String,
    /// Payout in credits; zero for a loss.
    pub payout_credits: i64,
}

/// Settlement result.
#[derive(Debug, Clone, Deserialize)]
pub struct SettleReceipt {
    /// Always true on success.
    pub settled: bool,
    /// The settled session.
    pub session_id: String,
    /// Total balance after the win; absent for zero payouts.
    #[serde(default)]
    pub new_balance: Option<i64>,
}
