//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{credits, games, health, purchase, withdrawals};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Credits (user auth)
/// - `GET /v1/credits/balance` - Current balance buckets
/// - `GET /v1/credits/ledger` - Audit-log history
/// - `POST /v1/credits/purchase` - Credit an on-chain purchase
///
/// ## Credits (service API key auth)
/// - `POST /v1/credits/adjust` - Generic signed ledger delta
///
/// ## Withdrawals (user auth)
/// - `POST /v1/withdrawals/quote` - Fee quote, no mutation
/// - `POST /v1/withdrawals` - Submit a withdrawal
/// - `GET /v1/withdrawals` - List own withdrawals
///
/// ## Withdrawals (service API key auth)
/// - `POST /v1/withdrawals/{id}/status` - Drive the status machine
///
/// ## Games (service API key auth)
/// - `POST /v1/games/settle` - Settle a game session
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state.
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Credits
        .route("/v1/credits/balance", get(credits::get_balance))
        .route("/v1/credits/ledger", get(credits::list_ledger))
        .route("/v1/credits/purchase", post(purchase::purchase_credits))
        .route("/v1/credits/adjust", post(credits::adjust))
        // Withdrawals
        .route("/v1/withdrawals/quote", post(withdrawals::quote))
        .route(
            "/v1/withdrawals",
            post(withdrawals::submit).get(withdrawals::list),
        )
        .route("/v1/withdrawals/:id/status", post(withdrawals::update_status))
        // Games
        .route("/v1/games/settle", post(games::settle))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
