//! Common test utilities for lootvault integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use lootvault_chain::BackoffPolicy;
use lootvault_core::UserId;
use lootvault_service::{create_router, AppState, ServiceConfig};
use lootvault_store::RocksStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
    /// The service API key for service-to-service requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and no indexer.
    pub fn new() -> Self {
        Self::with_config(Self::base_config())
    }

    /// Create a harness with the payment verifier pointed at a mock
    /// indexer, with a fast retry schedule so pending paths don't sleep.
    pub fn with_indexer(indexer_url: &str) -> Self {
        let mut config = Self::base_config();
        config.indexer_url = Some(indexer_url.to_string());
        config.verify_backoff = BackoffPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        Self::with_config(config)
    }

    fn base_config() -> ServiceConfig {
        ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            service_api_key: Some("test-service-key".to_string()),
            ..ServiceConfig::default()
        }
    }

    fn with_config(mut config: ServiceConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        config.data_dir = temp_dir.path().to_string_lossy().to_string();
        let service_api_key = config
            .service_api_key
            .clone()
            .expect("test config has a service key");

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            test_user_id,
            service_api_key,
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer test-token:{}", self.test_user_id)
    }

    /// Get the authorization header for an arbitrary user.
    pub fn auth_header_for(user_id: &UserId) -> String {
        format!("Bearer test-token:{user_id}")
    }

    /// Seed a bucket through the internal adjust endpoint.
    pub async fn seed(&self, user_id: &UserId, bucket: &str, amount: i64, reason: &str) {
        self.server
            .post("/v1/credits/adjust")
            .add_header("x-api-key", self.service_api_key.clone())
            .json(&serde_json::json!({
                "user_id": user_id.to_string(),
                "bucket": bucket,
                "amount": amount,
                "reason": reason,
            }))
            .await
            .assert_status_ok();
    }

    /// Read a user's balance as JSON.
    pub async fn balance(&self, user_id: &UserId) -> serde_json::Value {
        let response = self
            .server
            .get("/v1/credits/balance")
            .add_header("authorization", Self::auth_header_for(user_id))
            .await;
        response.assert_status_ok();
        response.json()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
