//! Purchase saga integration tests against a mock indexer.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AMOUNT: &str = "1000000000000000000";

fn vault_address() -> String {
    format!("0x{}", "1".repeat(40))
}

fn wallet_address() -> String {
    format!("0x{}", "2".repeat(40))
}

fn purchase_body(tx_hash: &str, credits: i64) -> serde_json::Value {
    json!({
        "tx_hash": tx_hash,
        "credits": credits,
        "wallet_address": wallet_address(),
        "expected_amount": AMOUNT,
        "expected_address": vault_address(),
    })
}

/// Mount a confirmed-transaction response for the given hash.
async fn mock_confirmed(server: &MockServer, tx_hash: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/transactions/{tx_hash}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transaction": {
                "status": "confirmed",
                "amount": AMOUNT,
                "to_address": vault_address(),
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn first_purchase_credits_and_grants_welcome_bonus() {
    let indexer = MockServer::start().await;
    let harness = TestHarness::with_indexer(&indexer.uri());
    let tx_hash = "ab".repeat(32);
    mock_confirmed(&indexer, &tx_hash).await;

    let response = harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body(&tx_hash, 1000))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "credited");
    assert_eq!(body["credits_added"], 1100);
    assert_eq!(body["bonus_granted"], 100);
    assert_eq!(body["old_balance"], 0);
    assert_eq!(body["new_balance"], 1100);
    assert_eq!(body["buckets"]["purchased"], 1100);
    assert_eq!(body["buckets"]["winnings"], 0);
    assert_eq!(body["buckets"]["bonus"], 0);

    let balance = harness.balance(&harness.test_user_id).await;
    assert_eq!(balance["purchased"], 1100);
    assert_eq!(balance["welcome_bonus_claimed"], true);

    // Exactly one ledger entry, carrying the purchase reason.
    let ledger = harness
        .server
        .get("/v1/credits/ledger")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let ledger: serde_json::Value = ledger.json();
    let entries = ledger["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["reason"], "credit_purchase");
}

#[tokio::test]
async fn second_purchase_grants_no_bonus() {
    let indexer = MockServer::start().await;
    let harness = TestHarness::with_indexer(&indexer.uri());

    let first_hash = "ab".repeat(32);
    let second_hash = "cd".repeat(32);
    mock_confirmed(&indexer, &first_hash).await;
    mock_confirmed(&indexer, &second_hash).await;

    harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body(&first_hash, 1000))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body(&second_hash, 500))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["credits_added"], 500);
    assert_eq!(body["bonus_granted"], 0);
    assert_eq!(body["new_balance"], 1600);
}

#[tokio::test]
async fn duplicate_hash_returns_prior_outcome() {
    let indexer = MockServer::start().await;
    let harness = TestHarness::with_indexer(&indexer.uri());
    let tx_hash = "ef".repeat(32);
    mock_confirmed(&indexer, &tx_hash).await;

    harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body(&tx_hash, 1000))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body(&tx_hash, 1000))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "duplicate_transaction");
    assert_eq!(body["error"]["details"]["credits_added"], 1100);

    // Exactly one credit event: the balance is unchanged by the replay.
    let balance = harness.balance(&harness.test_user_id).await;
    assert_eq!(balance["purchased"], 1100);
}

#[tokio::test]
async fn unindexed_payment_returns_202_pending() {
    let indexer = MockServer::start().await;
    let harness = TestHarness::with_indexer(&indexer.uri());
    let tx_hash = "12".repeat(32);

    Mock::given(method("GET"))
        .and(path(format!("/v1/transactions/{tx_hash}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&indexer)
        .await;

    let response = harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body(&tx_hash, 1000))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "pending");
    assert!(body["retry_after_secs"].as_u64().unwrap() > 0);

    // No state change while pending.
    let balance = harness.balance(&harness.test_user_id).await;
    assert_eq!(balance["total"], 0);
}

#[tokio::test]
async fn amount_mismatch_surfaces_verification_failed() {
    let indexer = MockServer::start().await;
    let harness = TestHarness::with_indexer(&indexer.uri());
    let tx_hash = "34".repeat(32);

    Mock::given(method("GET"))
        .and(path(format!("/v1/transactions/{tx_hash}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transaction": {
                "status": "confirmed",
                "amount": "999",
                "to_address": vault_address(),
            }
        })))
        .mount(&indexer)
        .await;

    let response = harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body(&tx_hash, 1000))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "verification_failed");

    let balance = harness.balance(&harness.test_user_id).await;
    assert_eq!(balance["total"], 0);
}

#[tokio::test]
async fn malformed_inputs_rejected_before_verification() {
    let indexer = MockServer::start().await;
    let harness = TestHarness::with_indexer(&indexer.uri());

    // Bad hash.
    let response = harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body("not-a-hash", 1000))
        .await;
    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "invalid_input");

    // Sentinel hash.
    let response = harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body(&"0".repeat(64), 1000))
        .await;
    response.assert_status_bad_request();

    // Non-positive credits.
    let response = harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body(&"ab".repeat(32), 0))
        .await;
    response.assert_status_bad_request();

    // Non-numeric on-chain amount.
    let mut body = purchase_body(&"ab".repeat(32), 1000);
    body["expected_amount"] = json!("one million");
    let response = harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&body)
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn purchase_requires_auth() {
    let indexer = MockServer::start().await;
    let harness = TestHarness::with_indexer(&indexer.uri());

    let response = harness
        .server
        .post("/v1/credits/purchase")
        .json(&purchase_body(&"ab".repeat(32), 1000))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn concurrent_first_purchases_grant_one_bonus() {
    let indexer = MockServer::start().await;
    let harness = std::sync::Arc::new(TestHarness::with_indexer(&indexer.uri()));

    let hashes: Vec<String> = (0..4).map(|i| format!("{i:x}a").repeat(32)).collect();
    for hash in &hashes {
        mock_confirmed(&indexer, hash).await;
    }

    let mut tasks = Vec::new();
    for hash in hashes {
        let harness = std::sync::Arc::clone(&harness);
        tasks.push(tokio::spawn(async move {
            let response = harness
                .server
                .post("/v1/credits/purchase")
                .add_header("authorization", harness.user_auth_header())
                .json(&purchase_body(&hash, 1000))
                .await;
            response.assert_status_ok();
            let body: serde_json::Value = response.json();
            body["bonus_granted"].as_i64().unwrap()
        }));
    }

    let mut bonus_total = 0;
    for task in tasks {
        bonus_total += task.await.unwrap();
    }
    assert_eq!(bonus_total, 100);

    let balance = harness.balance(&harness.test_user_id).await;
    assert_eq!(balance["purchased"], 4 * 1000 + 100);
}
