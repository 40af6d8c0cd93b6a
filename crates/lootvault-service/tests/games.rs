//! Game settlement integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

async fn settle(
    harness: &TestHarness,
    session_id: &str,
    payout: i64,
) -> axum_test::TestResponse {
    harness
        .server
        .post("/v1/games/settle")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&json!({
            "session_id": session_id,
            "game": "doors",
            "user_id": harness.test_user_id.to_string(),
            "payout_credits": payout,
        }))
        .await
}

#[tokio::test]
async fn win_settles_into_winnings_bucket() {
    let harness = TestHarness::new();

    let response = settle(&harness, "session-1", 750).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["settled"], true);
    assert_eq!(body["new_balance"], 750);

    let balance = harness.balance(&harness.test_user_id).await;
    assert_eq!(balance["winnings"], 750);

    let ledger = harness
        .server
        .get("/v1/credits/ledger")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let ledger: serde_json::Value = ledger.json();
    assert_eq!(ledger["entries"][0]["reason"], "win:doors");
}

#[tokio::test]
async fn session_settles_exactly_once() {
    let harness = TestHarness::new();

    settle(&harness, "session-1", 750).await.assert_status_ok();

    let response = settle(&harness, "session-1", 750).await;
    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "session_settled");

    // The retransmitted settlement credited nothing.
    let balance = harness.balance(&harness.test_user_id).await;
    assert_eq!(balance["winnings"], 750);
}

#[tokio::test]
async fn losing_session_settles_without_ledger_entry() {
    let harness = TestHarness::new();

    let response = settle(&harness, "session-loss", 0).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["settled"], true);
    assert!(body.get("new_balance").is_none());

    let ledger = harness
        .server
        .get("/v1/credits/ledger")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let ledger: serde_json::Value = ledger.json();
    assert!(ledger["entries"].as_array().unwrap().is_empty());

    // The session is still burnt.
    settle(&harness, "session-loss", 0)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn negative_payout_rejected() {
    let harness = TestHarness::new();

    let response = settle(&harness, "session-neg", -10).await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn settlement_requires_service_key() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/games/settle")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "session_id": "session-1",
            "game": "doors",
            "user_id": harness.test_user_id.to_string(),
            "payout_credits": 100,
        }))
        .await;

    response.assert_status_unauthorized();
}
