//! Lootvault Client SDK.
//!
//! This crate provides a client library for the storefront backend and
//! game engines to interact with the lootvault API.
//!
//! # Example
//!
//! ```no_run
//! use lootvault_client::{ClientOptions, LootvaultClient, PurchaseOutcome, PurchaseRequest};
//!
//! # async fn example() -> Result<(), lootvault_client::ClientError> {
//! let client = LootvaultClient::new(
//!     "http://lootvault.games.svc:8080",
//!     ClientOptions {
//!         user_token: Some("test-token:5f0c…".into()),
//!         ..ClientOptions::default()
//!     },
//! )?;
//!
//! let outcome = client
//!     .purchase(&PurchaseRequest {
//!         tx_hash: "ab".repeat(32),
//!         credits: 1000,
//!         wallet_address: format!("0x{}", "2".repeat(40)),
//!         expected_amount: "1000000000000000000".into(),
//!         expected_address: format!("0x{}", "1".repeat(40)),
//!     })
//!     .await?;
//!
//! match outcome {
//!     PurchaseOutcome::Credited(receipt) => {
//!         println!("new balance: {}", receipt.new_balance);
//!     }
//!     PurchaseOutcome::Pending { retry_after_secs } => {
//!         println!("poll again in {retry_after_secs}s");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, LootvaultClient};
pub use error::ClientError;
pub use types::*;
