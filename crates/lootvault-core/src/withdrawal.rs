//! Withdrawal request types and the status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{UserId, WithdrawalId};
use crate::payout::PayoutQuote;

/// Status of a withdrawal request.
///
/// Valid transitions:
/// `pending → processing` (admin claims it),
/// `processing → completed` (payout confirmed),
/// `processing → pending` (reverted),
/// `pending → cancelled` (rejected).
/// `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    /// Awaiting an admin to claim it.
    Pending,

    /// An admin is executing the payout.
    Processing,

    /// Payout confirmed with proof-of-payment attached.
    Completed,

    /// Rejected before processing; the decremented credits are restored.
    Cancelled,
}

impl WithdrawalStatus {
    /// Whether the request can move from `self` to `to`.
    #[must_use]
    pub const fn can_transition_to(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Pending)
                | (Self::Pending, Self::Cancelled)
        )
    }

    /// Whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A request to withdraw credits to a blockchain address.
///
/// The bucket split recorded at submit time (`winnings_part` /
/// `purchased_part`) is what a cancellation restores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Unique request ID.
    pub id: WithdrawalId,

    /// The withdrawing user.
    pub user_id: UserId,

    /// Total credits requested.
    pub credits: i64,

    /// Credits drawn from the winnings bucket.
    pub winnings_part: i64,

    /// Credits drawn from the purchased bucket.
    pub purchased_part: i64,

    /// Destination blockchain address.
    pub destination_address: String,

    /// The fee breakdown quoted at submit time.
    pub quote: PayoutQuote,

    /// Current status.
    pub status: WithdrawalStatus,

    /// Proof-of-payment attached when the payout completed.
    pub proof_of_payment: Option<String>,

    /// When the request was submitted.
    pub created_at: DateTime<Utc>,

    /// When the request was last updated.
    pub updated_at: DateTime<Utc>,
}

impl WithdrawalRequest {
    /// Create a new `pending` request for an already-applied decrement.
    ///
    /// The ID is caller-supplied because it doubles as the decrement's
    /// idempotency key and must exist before the decrement runs.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: WithdrawalId,
        user_id: UserId,
        credits: i64,
        winnings_part: i64,
        purchased_part: i64,
        destination_address: impl Into<String>,
        quote: PayoutQuote,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            credits,
            winnings_part,
            purchased_part,
            destination_address: destination_address.into(),
            quote,
            status: WithdrawalStatus::Pending,
            proof_of_payment: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the request to a new status, enforcing the transition table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] for a disallowed move; the
    /// request is left untouched in that case.
    pub fn transition_to(&mut self, to: WithdrawalStatus) -> Result<(), CoreError> {
        if !self.status.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payout::{PayoutConfig, PayoutQuote};

    fn request() -> WithdrawalRequest {
        let quote = PayoutQuote::compute(&PayoutConfig::default(), 500).unwrap();
        WithdrawalRequest::new(
            WithdrawalId::generate(),
            UserId::generate(),
            500,
            300,
            200,
            format!("0x{}", "a".repeat(40)),
            quote,
        )
    }

    #[test]
    fn happy_path_transitions() {
        let mut req = request();
        req.transition_to(WithdrawalStatus::Processing).unwrap();
        req.transition_to(WithdrawalStatus::Completed).unwrap();
        assert!(req.status.is_terminal());
    }

    #[test]
    fn processing_can_revert_to_pending() {
        let mut req = request();
        req.transition_to(WithdrawalStatus::Processing).unwrap();
        req.transition_to(WithdrawalStatus::Pending).unwrap();
        assert_eq!(req.status, WithdrawalStatus::Pending);
    }

    #[test]
    fn invalid_transitions_leave_state_unchanged() {
        let mut req = request();

        // pending cannot jump straight to completed
        let err = req.transition_to(WithdrawalStatus::Completed).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert_eq!(req.status, WithdrawalStatus::Pending);

        // terminal states admit nothing
        req.transition_to(WithdrawalStatus::Cancelled).unwrap();
        assert!(req.transition_to(WithdrawalStatus::Pending).is_err());
        assert_eq!(req.status, WithdrawalStatus::Cancelled);
    }

    #[test]
    fn processing_cannot_cancel() {
        let mut req = request();
        req.transition_to(WithdrawalStatus::Processing).unwrap();
        assert!(req.transition_to(WithdrawalStatus::Cancelled).is_err());
    }
}
