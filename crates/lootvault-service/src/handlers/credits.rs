//! Balance, ledger history, and internal adjustment handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use lootvault_core::{Bucket, BucketBalances, BucketDelta, LedgerEntry, UserId};
use lootvault_store::Store;

use crate::auth::{AuthUser, ServiceAuth};
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Purchased credits.
    pub purchased: i64,
    /// Winnings credits.
    pub winnings: i64,
    /// Bonus credits.
    pub bonus: i64,
    /// Total across all buckets.
    pub total: i64,
    /// Credits currently eligible for withdrawal.
    pub withdrawable: i64,
    /// Whether the welcome bonus was ever granted.
    pub welcome_bonus_claimed: bool,
}

/// Get the current balance, creating a zero row on first sight.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.store.ensure_balance(&auth.user_id)?;

    Ok(Json(BalanceResponse {
        purchased: balance.credits.purchased,
        winnings: balance.credits.winnings,
        bonus: balance.credits.bonus,
        total: balance.total(),
        withdrawable: balance.withdrawable(),
        welcome_bonus_claimed: balance.welcome_bonus_claimed,
    }))
}

/// Ledger list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListLedgerQuery {
    /// Maximum number of entries to return (default: 50, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Ledger entry response.
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    /// Entry ID.
    pub id: String,
    /// Signed per-bucket delta.
    pub delta: BucketDelta,
    /// Bucket snapshot after the mutation.
    pub balance_after: BucketBalances,
    /// Reason string.
    pub reason: String,
    /// Timestamp.
    pub created_at: String,
}

impl From<&LedgerEntry> for EntryResponse {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            delta: entry.delta,
            balance_after: entry.balance_after,
            reason: entry.reason.clone(),
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Ledger list response.
#[derive(Debug, Serialize)]
pub struct ListLedgerResponse {
    /// Entries, newest first.
    pub entries: Vec<EntryResponse>,
    /// Whether there are more entries.
    pub has_more: bool,
}

/// List the user's ledger history.
pub async fn list_ledger(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListLedgerQuery>,
) -> Result<Json<ListLedgerResponse>, ApiError> {
    // Fetch one more than requested to determine has_more.
    let limit = query.limit.min(100);
    let entries = state
        .store
        .list_entries_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = entries.len() > limit;
    let entries: Vec<_> = entries.iter().take(limit).map(EntryResponse::from).collect();

    Ok(Json(ListLedgerResponse { entries, has_more }))
}

/// Internal adjustment request: a generic signed single-bucket delta.
///
/// This is the operations path trusted collaborators use: game engines
/// debiting wagers, support crediting goodwill.
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    /// The user to adjust.
    pub user_id: UserId,
    /// The bucket to adjust.
    pub bucket: Bucket,
    /// Signed amount.
    pub amount: i64,
    /// Reason recorded on the ledger entry.
    pub reason: String,
    /// Optional deduplication key.
    pub idempotency_key: Option<String>,
}

/// Adjustment response.
#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    /// The committed (or replayed) entry ID.
    pub entry_id: String,
    /// Whether the idempotency key had already been applied.
    pub replayed: bool,
    /// Bucket snapshot after the mutation.
    pub buckets: BucketBalances,
    /// Total across all buckets.
    pub total: i64,
}

/// Apply a generic signed delta through the ledger (service auth).
pub async fn adjust(
    State(state): State<Arc<AppState>>,
    service: ServiceAuth,
    Json(body): Json<AdjustRequest>,
) -> Result<Json<AdjustResponse>, ApiError> {
    if body.amount == 0 {
        return Err(ApiError::InvalidInput("amount must be non-zero".into()));
    }

    let applied = state.store.apply(
        &body.user_id,
        BucketDelta::single(body.bucket, body.amount),
        &body.reason,
        body.idempotency_key.as_deref(),
    )?;

    tracing::info!(
        user_id = %body.user_id,
        service = %service.service_name,
        bucket = %body.bucket.as_str(),
        amount = %body.amount,
        reason = %body.reason,
        replayed = %applied.replayed,
        "Ledger adjustment applied"
    );

    Ok(Json(AdjustResponse {
        entry_id: applied.entry.id.to_string(),
        replayed: applied.replayed,
        buckets: applied.balance,
        total: applied.balance.total(),
    }))
}
