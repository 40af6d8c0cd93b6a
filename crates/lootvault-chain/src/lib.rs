//! On-chain payment verification for lootvault.
//!
//! This crate answers one question: did the claimed transaction actually
//! pay the expected amount to the expected address? It never credits
//! anything itself: verification is a boolean oracle over an external
//! blockchain indexer.
//!
//! Because indexers lag behind submission, "not found yet" is not a
//! failure: the [`PaymentVerifier`] retries under a [`BackoffPolicy`]
//! (default five attempts, delay doubling from one second and capped at
//! sixteen), then surfaces a distinguishable pending status so the caller
//! can ask the client to poll later. Hard errors (bad credentials,
//! malformed requests, transport failures) abort immediately without
//! retry.
//!
//! # Example
//!
//! ```no_run
//! use lootvault_chain::{BackoffPolicy, IndexerClient, PaymentVerifier};
//! use lootvault_core::PaymentClaim;
//!
//! # async fn example() -> Result<(), lootvault_chain::ChainError> {
//! let indexer = IndexerClient::new("https://indexer.example.com", None);
//! let verifier = PaymentVerifier::new(indexer, BackoffPolicy::default());
//!
//! let claim = PaymentClaim {
//!     tx_hash: "ab".repeat(32),
//!     expected_amount: 1_000_000_000_000_000_000,
//!     expected_address: format!("0x{}", "1".repeat(40)),
//!     wallet_address: format!("0x{}", "2".repeat(40)),
//! };
//! let verdict = verifier.verify(&claim).await?;
//! println!("verified: {}", verdict.is_confirmed());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod backoff;
pub mod error;
pub mod indexer;
pub mod validate;
pub mod verify;

pub use backoff::{BackoffPolicy, Sleeper, TokioSleeper};
pub use error::ChainError;
pub use indexer::{IndexerClient, TxLookup, TxStatus};
pub use validate::{validate_tx_hash, validate_wallet_address};
pub use verify::{PaymentVerifier, Verification, VerificationFailure};
