//! Balance types for lootvault.
//!
//! A user's balance is split into three independently tracked buckets with
//! different withdrawal eligibility. Every bucket is non-negative at all
//! times; no committed operation may leave a bucket below zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

// ============================================================================
// Constants
// ============================================================================

/// One-time welcome bonus granted alongside a new user's first purchase.
pub const WELCOME_BONUS_CREDITS: i64 = 100;

/// One of the three credit buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Credits bought with an on-chain payment. Withdrawable only after
    /// winnings are exhausted.
    Purchased,

    /// Credits won from gameplay. Drawn first on withdrawal.
    Winnings,

    /// Promotional credits. Never withdrawable.
    Bonus,
}

impl Bucket {
    /// Stable lowercase name used in error payloads and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Purchased => "purchased",
            Self::Winnings => "winnings",
            Self::Bonus => "bonus",
        }
    }
}

/// The three bucket values of a balance at one point in time.
///
/// Used both as the live balance inside [`Balance`] and as the
/// `balance_after` snapshot recorded on every ledger entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketBalances {
    /// Purchased credits.
    pub purchased: i64,
    /// Winnings credits.
    pub winnings: i64,
    /// Bonus credits.
    pub bonus: i64,
}

impl BucketBalances {
    /// Total credits across all buckets.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.purchased + self.winnings + self.bonus
    }

    /// Credits eligible to leave the system: winnings plus purchased.
    /// Bonus credits never count.
    #[must_use]
    pub const fn withdrawable(&self) -> i64 {
        self.winnings + self.purchased
    }

    /// Value of one named bucket.
    #[must_use]
    pub const fn bucket(&self, bucket: Bucket) -> i64 {
        match bucket {
            Bucket::Purchased => self.purchased,
            Bucket::Winnings => self.winnings,
            Bucket::Bonus => self.bonus,
        }
    }

    /// Apply a signed delta, failing with the first bucket that would go
    /// negative.
    ///
    /// # Errors
    ///
    /// Returns the offending [`Bucket`] when any resulting bucket would be
    /// below zero.
    pub fn checked_apply(&self, delta: &BucketDelta) -> Result<Self, Bucket> {
        let purchased = self.purchased + delta.purchased;
        if purchased < 0 {
            return Err(Bucket::Purchased);
        }
        let winnings = self.winnings + delta.winnings;
        if winnings < 0 {
            return Err(Bucket::Winnings);
        }
        let bonus = self.bonus + delta.bonus;
        if bonus < 0 {
            return Err(Bucket::Bonus);
        }
        Ok(Self {
            purchased,
            winnings,
            bonus,
        })
    }
}

/// A signed per-bucket delta.
///
/// Most mutations touch one bucket; the withdrawal decrement touches two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketDelta {
    /// Delta applied to the purchased bucket.
    pub purchased: i64,
    /// Delta applied to the winnings bucket.
    pub winnings: i64,
    /// Delta applied to the bonus bucket.
    pub bonus: i64,
}

impl BucketDelta {
    /// A delta touching only the purchased bucket.
    #[must_use]
    pub const fn purchased(amount: i64) -> Self {
        Self {
            purchased: amount,
            winnings: 0,
            bonus: 0,
        }
    }

    /// A delta touching only the winnings bucket.
    #[must_use]
    pub const fn winnings(amount: i64) -> Self {
        Self {
            purchased: 0,
            winnings: amount,
            bonus: 0,
        }
    }

    /// A delta touching only the bonus bucket.
    #[must_use]
    pub const fn bonus(amount: i64) -> Self {
        Self {
            purchased: 0,
            winnings: 0,
            bonus: amount,
        }
    }

    /// A delta for a single named bucket.
    #[must_use]
    pub const fn single(bucket: Bucket, amount: i64) -> Self {
        match bucket {
            Bucket::Purchased => Self::purchased(amount),
            Bucket::Winnings => Self::winnings(amount),
            Bucket::Bonus => Self::bonus(amount),
        }
    }

    /// Delta of one named bucket.
    #[must_use]
    pub const fn bucket(&self, bucket: Bucket) -> i64 {
        match bucket {
            Bucket::Purchased => self.purchased,
            Bucket::Winnings => self.winnings,
            Bucket::Bonus => self.bonus,
        }
    }

    /// Signed sum across all buckets.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.purchased + self.winnings + self.bonus
    }

    /// Whether the delta changes nothing.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.purchased == 0 && self.winnings == 0 && self.bonus == 0
    }

    /// The exact reversing delta, used for compensating entries.
    #[must_use]
    pub const fn negated(&self) -> Self {
        Self {
            purchased: -self.purchased,
            winnings: -self.winnings,
            bonus: -self.bonus,
        }
    }
}

/// A user's balance row.
///
/// One row per user; the only writer is the ledger's `apply` path, which
/// persists the row together with its audit entry in one atomic unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    /// The owning user.
    pub user_id: UserId,

    /// Current bucket values.
    pub credits: BucketBalances,

    /// Whether the one-time welcome bonus was ever granted to this user.
    /// Set in the same atomic unit as the crediting mutation.
    pub welcome_bonus_claimed: bool,

    /// Lifetime credits bought.
    pub lifetime_purchased: i64,

    /// Lifetime credits won from gameplay.
    pub lifetime_won: i64,

    /// Lifetime credits withdrawn.
    pub lifetime_withdrawn: i64,

    /// When the row was created.
    pub created_at: DateTime<Utc>,

    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// Create a fresh zero balance.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            credits: BucketBalances::default(),
            welcome_bonus_claimed: false,
            lifetime_purchased: 0,
            lifetime_won: 0,
            lifetime_withdrawn: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total credits across all buckets.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.credits.total()
    }

    /// Credits currently eligible for withdrawal.
    #[must_use]
    pub const fn withdrawable(&self) -> i64 {
        self.credits.withdrawable()
    }

    /// Whether this user qualifies for the welcome bonus right now: never
    /// claimed before and an exactly-zero balance. The zero-balance rule is
    /// the literal production condition; a veteran who spent down to zero
    /// before their first purchase qualifies.
    #[must_use]
    pub const fn welcome_bonus_eligible(&self) -> bool {
        !self.welcome_bonus_claimed && self.total() == 0
    }
}
