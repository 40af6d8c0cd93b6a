//! Withdrawal handlers: quote, submit, list, and the admin status
//! machine.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use lootvault_chain::validate_wallet_address;
use lootvault_core::ledger::{keys, reasons};
use lootvault_core::{
    BucketDelta, PayoutQuote, WithdrawalId, WithdrawalRequest, WithdrawalStatus,
};
use lootvault_store::Store;

use crate::auth::{AuthUser, ServiceAuth};
use crate::error::ApiError;
use crate::state::AppState;

/// Quote request.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    /// Credits to quote.
    pub credits: i64,
}

/// Quote a payout without mutating anything.
pub async fn quote(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Json(body): Json<QuoteRequest>,
) -> Result<Json<PayoutQuote>, ApiError> {
    let config = state.payout_config();
    let quote = PayoutQuote::compute(&config, body.credits)?;
    Ok(Json(quote))
}

/// Withdrawal submit request.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Credits to withdraw.
    pub credits: i64,
    /// Destination blockchain address.
    pub destination_address: String,
}

/// Withdrawal response (also used for listing and status updates).
#[derive(Debug, Serialize)]
pub struct WithdrawalResponse {
    /// Request ID.
    pub id: String,
    /// Current status.
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_of_payment: Option<String>,
    /// Submission timestamp.
    pub created_at: String,
}

impl From<&WithdrawalRequest> for WithdrawalResponse {
    fn from(request: &WithdrawalRequest) -> Self {
        Self {
            id: request.id.to_string(),
            status: request.status.as_str().to_string(),
            credits: request.credits,
            winnings_part: request.winnings_part,
            purchased_part: request.purchased_part,
            destination_address: request.destination_address.clone(),
            quote: request.quote,
            proof_of_payment: request.proof_of_payment.clone(),
            created_at: request.created_at.to_rfc3339(),
        }
    }
}

/// Submit a withdrawal: decrement the buckets (winnings first) and create
/// a pending request, then hand off to the payout executor.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<SubmitRequest>,
) -> Result<Json<WithdrawalResponse>, ApiError> {
    validate_wallet_address(&body.destination_address)
        .map_err(|err| ApiError::InvalidInput(err.to_string()))?;

    let config = state.payout_config();
    let quote = PayoutQuote::compute(&config, body.credits)?;

    // The ID exists before the decrement so it can serve as the
    // decrement's idempotency key.
    let withdrawal_id = WithdrawalId::generate();
    let debit = state
        .store
        .decrement_withdrawable(&auth.user_id, body.credits, &withdrawal_id)?;

    let request = WithdrawalRequest::new(
        withdrawal_id,
        auth.user_id,
        body.credits,
        debit.winnings_part,
        debit.purchased_part,
        body.destination_address,
        quote,
    );
    state.store.put_withdrawal(&request)?;

    // Fire-and-forget handoff; the payout executor owns delivery from
    // here.
    tracing::info!(
        withdrawal_id = %request.id,
        user_id = %auth.user_id,
        credits = %body.credits,
        net_micros = %quote.net_micros,
        "Withdrawal queued for payout executor"
    );

    Ok(Json(WithdrawalResponse::from(&request)))
}

/// Withdrawal list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListWithdrawalsQuery {
    /// Maximum number of requests to return (default: 50, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Withdrawal list response.
#[derive(Debug, Serialize)]
pub struct ListWithdrawalsResponse {
    /// Requests, newest first.
    pub withdrawals: Vec<WithdrawalResponse>,
    /// Whether there are more requests.
    pub has_more: bool,
}

/// List the user's withdrawal requests.
pub async fn list(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListWithdrawalsQuery>,
) -> Result<Json<ListWithdrawalsResponse>, ApiError> {
    let limit = query.limit.min(100);
    let requests = state
        .store
        .list_withdrawals_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = requests.len() > limit;
    let withdrawals: Vec<_> = requests
        .iter()
        .take(limit)
        .map(WithdrawalResponse::from)
        .collect();

    Ok(Json(ListWithdrawalsResponse {
        withdrawals,
        has_more,
    }))
}

/// Status update request (admin).
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    /// Target status.
    pub status: WithdrawalStatus,
    /// Proof-of-payment, required when completing.
    pub proof_of_payment: Option<String>,
}

/// Drive a withdrawal through its status machine (service auth).
///
/// `processing → completed` requires proof-of-payment. A cancellation
/// refunds the recorded bucket split through the ledger.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    service: ServiceAuth,
    Path(withdrawal_id): Path<WithdrawalId>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<WithdrawalResponse>, ApiError> {
    if body.status == WithdrawalStatus::Completed && body.proof_of_payment.is_none() {
        return Err(ApiError::InvalidInput(
            "proof_of_payment is required to complete a withdrawal".into(),
        ));
    }

    let updated =
        state
            .store
            .update_withdrawal_status(&withdrawal_id, body.status, body.proof_of_payment)?;

    tracing::info!(
        withdrawal_id = %withdrawal_id,
        service = %service.service_name,
        status = %updated.status.as_str(),
        "Withdrawal status updated"
    );

    if updated.status == WithdrawalStatus::Cancelled {
        // Restore exactly the split taken at submit; the refund key makes
        // a replayed cancellation harmless.
        let refund = BucketDelta {
            purchased: updated.purchased_part,
            winnings: updated.winnings_part,
            bonus: 0,
        };
        let applied = state.store.apply(
            &updated.user_id,
            refund,
            &reasons::withdrawal_refund(&withdrawal_id),
            Some(&keys::withdrawal_refund(&withdrawal_id)),
        )?;

        tracing::info!(
            withdrawal_id = %withdrawal_id,
            user_id = %updated.user_id,
            refunded = %updated.credits,
            entry_id = %applied.entry.id,
            "Cancelled withdrawal refunded"
        );
    }

    Ok(Json(WithdrawalResponse::from(&updated)))
}
