//! Game settlement handler.
//!
//! Outcome resolvers compute payouts with their own rules and settle here.
//! The session is marked settled before the ledger call; settlement
//! idempotency is session-level and enforced by this caller, not the
//! ledger, so wins need no ledger-level idempotency key.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use lootvault_core::ledger::reasons;
use lootvault_core::{BucketDelta, UserId};
use lootvault_store::Store;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Settlement request.
#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    /// One-time session ID from the game engine.
    pub session_id: String,
    /// The game that produced the outcome, e.g. `doors`.
    pub game: String,
    /// The winning user.
    pub user_id: UserId,
    /// Payout in credits; zero for a loss.
    pub payout_credits: i64,
}

/// Settlement response.
#[derive(Debug, Serialize)]
pub struct SettleResponse {
    /// Always true on success.
    pub settled: bool,
    /// The settled session.
    pub session_id: String,
    /// Total balance after the win; absent for zero payouts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<i64>,
}

/// Settle a game session (service auth).
pub async fn settle(
    State(state): State<Arc<AppState>>,
    service: ServiceAuth,
    Json(body): Json<SettleRequest>,
) -> Result<Json<SettleResponse>, ApiError> {
    if body.payout_credits < 0 {
        return Err(ApiError::InvalidInput(
            "payout_credits must not be negative".into(),
        ));
    }
    if body.session_id.is_empty() {
        return Err(ApiError::InvalidInput("session_id must not be empty".into()));
    }

    // Mark first: a replayed settlement dies here, before any credit.
    state
        .store
        .mark_session_settled(&body.session_id, &body.game)?;

    let new_balance = if body.payout_credits > 0 {
        let applied = state.store.apply(
            &body.user_id,
            BucketDelta::winnings(body.payout_credits),
            &reasons::win(&body.game),
            None,
        )?;
        Some(applied.balance.total())
    } else {
        None
    };

    tracing::info!(
        session_id = %body.session_id,
        game = %body.game,
        user_id = %body.user_id,
        service = %service.service_name,
        payout = %body.payout_credits,
        "Game session settled"
    );

    Ok(Json(SettleResponse {
        settled: true,
        session_id: body.session_id,
        new_balance,
    }))
}
