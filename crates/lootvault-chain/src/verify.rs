//! The payment verifier.
//!
//! Confirms that a claimed on-chain transaction paid the expected amount
//! to the expected address, tolerating indexer lag via bounded retry.

use std::sync::Arc;

use lootvault_core::PaymentClaim;

use crate::backoff::{BackoffPolicy, Sleeper, TokioSleeper};
use crate::error::ChainError;
use crate::indexer::{IndexerClient, TxStatus};
use crate::validate::{validate_tx_hash, validate_wallet_address};

/// Why a looked-up transaction failed verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    /// The confirmed output amount does not match the claim.
    #[error("amount mismatch: expected {expected}, chain shows {actual}")]
    AmountMismatch {
        /// The claimed amount.
        expected: u128,
        /// The amount on chain.
        actual: u128,
    },

    /// The confirmed destination does not match the claim.
    #[error("destination mismatch: expected {expected}, chain shows {actual}")]
    AddressMismatch {
        /// The claimed destination.
        expected: String,
        /// The destination on chain.
        actual: String,
    },
}

/// The verifier's verdict on a payment claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The transaction is confirmed and matches the claim.
    Confirmed {
        /// The verified on-chain amount in base units.
        amount: u128,
    },

    /// Not indexed within the retry budget; the caller should ask the
    /// client to poll later. Not a failure.
    Pending {
        /// Lookup attempts made.
        attempts: u32,
    },

    /// Confirmed on chain but contradicting the claim. Never retried.
    Failed(VerificationFailure),
}

impl Verification {
    /// Whether the claim was positively verified.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Verifies payment claims against a blockchain indexer.
///
/// Pure oracle: never credits anything. The retry sleeps run through the
/// injected [`Sleeper`]; dropping the returned future between attempts
/// cancels the loop, and no background work survives the caller.
pub struct PaymentVerifier {
    indexer: IndexerClient,
    backoff: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl PaymentVerifier {
    /// Create a verifier with the real tokio sleeper.
    #[must_use]
    pub fn new(indexer: IndexerClient, backoff: BackoffPolicy) -> Self {
        Self {
            indexer,
            backoff,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeper (tests inject a recording sleeper here).
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Verify a payment claim.
    ///
    /// Outcome classes:
    /// - confirmed match → [`Verification::Confirmed`]
    /// - not yet indexed after the full retry budget →
    ///   [`Verification::Pending`]
    /// - confirmed mismatch → [`Verification::Failed`], no retry
    ///
    /// # Errors
    ///
    /// - [`ChainError::InvalidInput`] for malformed or sentinel hashes and
    ///   addresses, before any network call.
    /// - [`ChainError::Http`] / [`ChainError::Api`] /
    ///   [`ChainError::MalformedResponse`] on hard indexer errors,
    ///   surfaced immediately and never retried.
    pub async fn verify(&self, claim: &PaymentClaim) -> Result<Verification, ChainError> {
        validate_tx_hash(&claim.tx_hash)?;
        validate_wallet_address(&claim.expected_address)?;
        validate_wallet_address(&claim.wallet_address)?;

        for attempt in 0..self.backoff.max_attempts {
            let lookup = self.indexer.lookup(&claim.tx_hash).await?;

            match lookup.status {
                TxStatus::Confirmed => {
                    if lookup.amount != claim.expected_amount {
                        tracing::warn!(
                            tx_hash = %claim.tx_hash,
                            expected = %claim.expected_amount,
                            actual = %lookup.amount,
                            "Confirmed transaction amount mismatch"
                        );
                        return Ok(Verification::Failed(VerificationFailure::AmountMismatch {
                            expected: claim.expected_amount,
                            actual: lookup.amount,
                        }));
                    }
                    if !lookup
                        .to_address
                        .eq_ignore_ascii_case(&claim.expected_address)
                    {
                        tracing::warn!(
                            tx_hash = %claim.tx_hash,
                            expected = %claim.expected_address,
                            actual = %lookup.to_address,
                            "Confirmed transaction destination mismatch"
                        );
                        return Ok(Verification::Failed(VerificationFailure::AddressMismatch {
                            expected: claim.expected_address.clone(),
                            actual: lookup.to_address,
                        }));
                    }

                    tracing::debug!(
                        tx_hash = %claim.tx_hash,
                        amount = %lookup.amount,
                        attempt,
                        "Payment verified"
                    );
                    return Ok(Verification::Confirmed {
                        amount: lookup.amount,
                    });
                }
                TxStatus::Pending | TxStatus::NotFound => {
                    // Indexer lag, not failure; wait out the schedule.
                    if attempt + 1 < self.backoff.max_attempts {
                        let delay = self.backoff.delay_for(attempt);
                        tracing::debug!(
                            tx_hash = %claim.tx_hash,
                            attempt,
                            delay_secs = delay.as_secs_f64(),
                            "Transaction not indexed yet, backing off"
                        );
                        self.sleeper.sleep(delay).await;
                    }
                }
            }
        }

        Ok(Verification::Pending {
            attempts: self.backoff.max_attempts,
        })
    }
}
