//! HTTP API service for the lootvault credit ledger.
//!
//! Exposes the purchase, withdrawal, settlement, and balance operations
//! over an axum router. The service owns the orchestration logic, most
//! importantly the purchase saga: verify the on-chain payment, credit the
//! ledger, record the purchase, and issue a compensating entry if the
//! record step fails.

#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
