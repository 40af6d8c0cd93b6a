//! Balance, ledger, and adjustment integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

// ============================================================================
// Balance
// ============================================================================

#[tokio::test]
async fn balance_starts_at_zero() {
    let harness = TestHarness::new();

    let body = harness.balance(&harness.test_user_id).await;
    assert_eq!(body["purchased"], 0);
    assert_eq!(body["winnings"], 0);
    assert_eq!(body["bonus"], 0);
    assert_eq!(body["total"], 0);
    assert_eq!(body["withdrawable"], 0);
    assert_eq!(body["welcome_bonus_claimed"], false);
}

#[tokio::test]
async fn balance_requires_auth() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/credits/balance").await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn withdrawable_excludes_bonus() {
    let harness = TestHarness::new();
    let user = harness.test_user_id;

    harness.seed(&user, "winnings", 30, "win:doors").await;
    harness.seed(&user, "bonus", 500, "promo_grant").await;

    let body = harness.balance(&user).await;
    assert_eq!(body["total"], 530);
    assert_eq!(body["withdrawable"], 30);
}

// ============================================================================
// Ledger history
// ============================================================================

#[tokio::test]
async fn ledger_lists_newest_first() {
    let harness = TestHarness::new();
    let user = harness.test_user_id;

    harness.seed(&user, "winnings", 100, "win:doors").await;
    harness.seed(&user, "winnings", -40, "wager:doors").await;

    let response = harness
        .server
        .get("/v1/credits/ledger")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["reason"], "wager:doors");
    assert_eq!(entries[1]["reason"], "win:doors");
    assert_eq!(entries[0]["balance_after"]["winnings"], 60);
    assert_eq!(body["has_more"], false);
}

// ============================================================================
// Adjustments
// ============================================================================

#[tokio::test]
async fn adjust_requires_service_key() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/credits/adjust")
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "bucket": "winnings",
            "amount": 100,
            "reason": "win:doors",
        }))
        .await;
    response.assert_status_unauthorized();

    let response = harness
        .server
        .post("/v1/credits/adjust")
        .add_header("x-api-key", "wrong-key")
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "bucket": "winnings",
            "amount": 100,
            "reason": "win:doors",
        }))
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn adjust_with_idempotency_key_applies_once() {
    let harness = TestHarness::new();
    let user = harness.test_user_id;

    let body = json!({
        "user_id": user.to_string(),
        "bucket": "winnings",
        "amount": 250,
        "reason": "win:doors",
        "idempotency_key": "settle:session-42",
    });

    let first = harness
        .server
        .post("/v1/credits/adjust")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&body)
        .await;
    first.assert_status_ok();
    let first: serde_json::Value = first.json();
    assert_eq!(first["replayed"], false);
    assert_eq!(first["total"], 250);

    let second = harness
        .server
        .post("/v1/credits/adjust")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&body)
        .await;
    second.assert_status_ok();
    let second: serde_json::Value = second.json();
    assert_eq!(second["replayed"], true);
    assert_eq!(second["total"], 250);
    assert_eq!(second["entry_id"], first["entry_id"]);

    let balance = harness.balance(&user).await;
    assert_eq!(balance["winnings"], 250);
}

#[tokio::test]
async fn adjust_rejects_overdraw() {
    let harness = TestHarness::new();
    let user = harness.test_user_id;

    harness.seed(&user, "winnings", 50, "win:doors").await;

    let response = harness
        .server
        .post("/v1/credits/adjust")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&json!({
            "user_id": user.to_string(),
            "bucket": "winnings",
            "amount": -80,
            "reason": "wager:doors",
        }))
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_funds");
    assert_eq!(body["error"]["details"]["bucket"], "winnings");
    assert_eq!(body["error"]["details"]["balance"], 50);
    assert_eq!(body["error"]["details"]["requested"], 80);

    // Nothing was committed by the rejected delta.
    let balance = harness.balance(&user).await;
    assert_eq!(balance["winnings"], 50);
}
