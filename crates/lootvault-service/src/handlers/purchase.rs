//! The purchase saga: verify the on-chain payment, credit the ledger,
//! record the purchase, and issue a compensating entry if the record step
//! fails.
//!
//! Crediting the ledger and writing the purchase record are two idempotent
//! steps, not one transaction. A failure between them is healed by a
//! compensating negative delta through the same ledger path; a failure of
//! the compensation itself is the one case that cannot self-heal and is
//! escalated for manual reconciliation.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use lootvault_chain::{validate_tx_hash, validate_wallet_address, ChainError, Verification};
use lootvault_core::ledger::{keys, reasons};
use lootvault_core::{BucketBalances, CreditTransaction, PaymentClaim, UserId};
use lootvault_store::{AggregateTotals, PurchaseCredit, Store, StoreError};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Suggested client poll interval while verification is pending.
const PENDING_RETRY_AFTER_SECS: u64 = 30;

/// Purchase request.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// The funding transaction hash (64 hex characters).
    pub tx_hash: String,
    /// Credits being purchased.
    pub credits: i64,
    /// The claiming wallet address.
    pub wallet_address: String,
    /// The on-chain amount expected, in base units as a decimal string.
    pub expected_amount: String,
    /// The destination address expected to have received the payment.
    pub expected_address: String,
}

/// Successful purchase response.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// Always `"credited"`.
    pub status: &'static str,
    /// The funding hash.
    pub tx_hash: String,
    /// The ledger entry that applied the credit.
    pub entry_id: String,
    /// Credits added, including any welcome bonus.
    pub credits_added: i64,
    /// Welcome bonus portion, zero if none.
    pub bonus_granted: i64,
    /// Total balance before the credit.
    pub old_balance: i64,
    /// Total balance after the credit.
    pub new_balance: i64,
    /// Bucket snapshot after the credit.
    pub buckets: BucketBalances,
}

/// Verification-pending response (HTTP 202).
#[derive(Debug, Serialize)]
pub struct PendingResponse {
    /// Always `"pending"`.
    pub status: &'static str,
    /// Suggested poll interval in seconds.
    pub retry_after_secs: u64,
}

/// Process a credit purchase funded by an on-chain payment.
pub async fn purchase_credits(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<PurchaseRequest>,
) -> Result<Response, ApiError> {
    // Step 1: validate everything before touching the network or store.
    if body.credits <= 0 {
        return Err(ApiError::InvalidInput("credits must be positive".into()));
    }
    validate_tx_hash(&body.tx_hash).map_err(invalid_input)?;
    validate_wallet_address(&body.wallet_address).map_err(invalid_input)?;
    validate_wallet_address(&body.expected_address).map_err(invalid_input)?;
    let expected_amount: u128 = body.expected_amount.parse().map_err(|_| {
        ApiError::InvalidInput("expected_amount must be a decimal integer string".into())
    })?;

    // Step 2: duplicate-purchase guard. Not a loss - the prior outcome
    // rides along in the error details.
    if let Some(prior) = state.store.get_credit_transaction(&body.tx_hash)? {
        return Err(duplicate(prior));
    }

    // Step 3: verify the payment on chain.
    let verifier = state
        .verifier
        .as_ref()
        .ok_or_else(|| ApiError::VerificationFailed("indexer not configured".into()))?;

    let claim = PaymentClaim {
        tx_hash: body.tx_hash.clone(),
        expected_amount,
        expected_address: body.expected_address.clone(),
        wallet_address: body.wallet_address.clone(),
    };

    let verdict = verifier.verify(&claim).await.map_err(|err| match err {
        ChainError::InvalidInput(msg) => ApiError::InvalidInput(msg),
        other => ApiError::VerificationFailed(other.to_string()),
    })?;

    match verdict {
        Verification::Confirmed { amount } => {
            tracing::info!(
                user_id = %auth.user_id,
                tx_hash = %body.tx_hash,
                amount = %amount,
                "Payment verified"
            );
        }
        Verification::Pending { attempts } => {
            tracing::info!(
                user_id = %auth.user_id,
                tx_hash = %body.tx_hash,
                attempts,
                "Payment not indexed yet, asking client to poll"
            );
            return Ok((
                StatusCode::ACCEPTED,
                Json(PendingResponse {
                    status: "pending",
                    retry_after_secs: PENDING_RETRY_AFTER_SECS,
                }),
            )
                .into_response());
        }
        Verification::Failed(reason) => {
            return Err(ApiError::VerificationFailed(reason.to_string()));
        }
    }

    // Steps 4-6: credit the ledger. The balance row is created if absent
    // and the welcome bonus decided inside the same atomic unit.
    let idempotency_key = keys::purchase(&body.tx_hash);
    let credited = state.store.credit_purchase(
        &auth.user_id,
        body.credits,
        state.config.welcome_bonus_credits,
        &idempotency_key,
    )?;

    // A replayed credit whose original attempt was rolled back must not
    // re-record: the entry it replays no longer stands. That balance can
    // only be healed by reconciliation, not by this path.
    if credited.applied.replayed {
        let rollback_key = keys::purchase_rollback(&body.tx_hash);
        if state.store.get_entry_by_key(&rollback_key)?.is_some() {
            tracing::error!(
                user_id = %auth.user_id,
                tx_hash = %body.tx_hash,
                "Retried purchase was previously rolled back - manual reconciliation required"
            );
            return Err(ApiError::TransactionLogFailed(
                "purchase was previously rolled back".into(),
            ));
        }
    }

    // Step 7: permanent purchase record, compensating on failure.
    let record = CreditTransaction::new(
        &claim,
        auth.user_id,
        body.credits,
        credited.bonus_granted,
        credited.applied.entry.id,
    );
    if let Err(err) = state.store.insert_credit_transaction(&record) {
        return Err(record_failure(&state, &auth.user_id, &body.tx_hash, &credited, err));
    }

    // Step 8: best-effort aggregates; never rolls back the credit.
    if let Err(err) = state.store.bump_totals(&AggregateTotals {
        purchase_count: 1,
        credits_purchased: body.credits,
        bonus_granted: credited.bonus_granted,
        credits_withdrawn: 0,
    }) {
        tracing::warn!(error = %err, "Failed to bump aggregate purchase totals");
    }

    let entry = &credited.applied.entry;
    let old_balance = entry.balance_before().total();
    let new_balance = credited.applied.balance.total();

    tracing::info!(
        user_id = %auth.user_id,
        tx_hash = %body.tx_hash,
        credits = %body.credits,
        bonus = %credited.bonus_granted,
        new_balance = %new_balance,
        entry_id = %entry.id,
        "Purchase credited"
    );

    Ok((
        StatusCode::OK,
        Json(PurchaseResponse {
            status: "credited",
            tx_hash: body.tx_hash,
            entry_id: entry.id.to_string(),
            credits_added: entry.delta.purchased,
            bonus_granted: credited.bonus_granted,
            old_balance,
            new_balance,
            buckets: credited.applied.balance,
        }),
    )
        .into_response())
}

fn invalid_input(err: ChainError) -> ApiError {
    ApiError::InvalidInput(err.to_string())
}

fn duplicate(prior: CreditTransaction) -> ApiError {
    ApiError::DuplicateTransaction {
        tx_hash: prior.tx_hash.clone(),
        prior: serde_json::json!({
            "entry_id": prior.entry_id.to_string(),
            "credits": prior.credits,
            "bonus_credits": prior.bonus_credits,
            "credits_added": prior.credits_added(),
        }),
    }
}

/// Resolve a failed purchase-record write.
///
/// A duplicate record means a concurrent request with the same hash won
/// the saga; the credit stands (it was applied once) and the prior
/// outcome is reported. Any other failure after a fresh credit triggers
/// the compensating entry; a replayed credit is never compensated because
/// the entry belongs to the attempt that created it.
fn record_failure(
    state: &AppState,
    user_id: &UserId,
    tx_hash: &str,
    credited: &PurchaseCredit,
    err: StoreError,
) -> ApiError {
    if matches!(err, StoreError::DuplicateTransaction { .. }) {
        return match state.store.get_credit_transaction(tx_hash) {
            Ok(Some(prior)) => duplicate(prior),
            Ok(None) | Err(_) => ApiError::TransactionLogFailed(
                "duplicate purchase record could not be read back".into(),
            ),
        };
    }

    tracing::error!(
        user_id = %user_id,
        tx_hash = %tx_hash,
        error = %err,
        "Purchase record write failed after credit"
    );

    if credited.applied.replayed {
        return ApiError::TransactionLogFailed(err.to_string());
    }

    let rollback_key = keys::purchase_rollback(tx_hash);
    match state.store.apply(
        user_id,
        credited.applied.entry.delta.negated(),
        reasons::PURCHASE_ROLLBACK,
        Some(&rollback_key),
    ) {
        Ok(rollback) => {
            tracing::warn!(
                user_id = %user_id,
                tx_hash = %tx_hash,
                rollback_entry_id = %rollback.entry.id,
                "Compensating entry applied, balance restored"
            );
            ApiError::TransactionLogFailed(err.to_string())
        }
        Err(compensation_err) => {
            tracing::error!(
                user_id = %user_id,
                tx_hash = %tx_hash,
                error = %compensation_err,
                "Compensating entry failed - manual reconciliation required"
            );
            ApiError::CompensationFailed(compensation_err.to_string())
        }
    }
}
