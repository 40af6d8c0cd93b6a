//! Core types and utilities for lootvault.
//!
//! This crate provides the foundational types used throughout the lootvault
//! credit platform:
//!
//! - **Identifiers**: `UserId`, `EntryId`, `WithdrawalId`
//! - **Balances**: `Balance`, `BucketBalances`, `BucketDelta`
//! - **Ledger**: `LedgerEntry` plus the reason and idempotency-key grammar
//! - **Purchases**: `CreditTransaction`, `PaymentClaim`
//! - **Withdrawals**: `WithdrawalRequest`, `WithdrawalStatus`, `PayoutQuote`
//! - **Config**: `PayoutConfig`, `ConfigCache`
//!
//! # Credit Unit
//!
//! A credit is the site's internal currency, stored as `i64`. Every credit
//! belongs to exactly one of three buckets with different withdrawal
//! eligibility:
//!
//! - `purchased`: bought with an on-chain payment
//! - `winnings`: won from gameplay, withdrawable first
//! - `bonus`: promotional, never withdrawable
//!
//! On-chain amounts are base units (`u128`) transmitted as decimal strings
//! to avoid precision loss.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod balance;
pub mod config;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod payout;
pub mod purchase;
pub mod withdrawal;

pub use balance::{Balance, Bucket, BucketBalances, BucketDelta, WELCOME_BONUS_CREDITS};
pub use config::{Clock, ConfigCache, SystemClock};
pub use error::{CoreError, Result};
pub use ids::{EntryId, IdError, UserId, WithdrawalId};
pub use ledger::{keys, reasons, LedgerEntry};
pub use payout::{PayoutConfig, PayoutQuote};
pub use purchase::{CreditTransaction, PaymentClaim};
pub use withdrawal::{WithdrawalRequest, WithdrawalStatus};
