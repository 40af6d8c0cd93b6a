//! Lootvault API client implementation.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use lootvault_core::PayoutQuote;

use crate::error::{ClientError, ErrorEnvelope};
use crate::types::{
    BalanceInfo, PurchaseOutcome, PurchaseReceipt, PurchaseRequest, SettleReceipt, SettleRequest,
    WithdrawRequest, WithdrawalInfo,
};

/// Client configuration options.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Bearer token for user endpoints.
    pub user_token: Option<String>,

    /// API key for service endpoints (settlement).
    pub service_api_key: Option<String>,

    /// Request timeout; defaults to 30 seconds.
    pub timeout: Option<Duration>,
}

/// Client for the lootvault API.
#[derive(Debug, Clone)]
pub struct LootvaultClient {
    client: Client,
    base_url: String,
    user_token: Option<String>,
    service_api_key: Option<String>,
}

impl LootvaultClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the HTTP client cannot be
    /// built.
    pub fn new(base_url: impl Into<String>, options: ClientOptions) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(options.timeout.unwrap_or(Duration::from_secs(30)))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_token: options.user_token,
            service_api_key: options.service_api_key,
        })
    }

    fn user_request(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self
            .user_token
            .as_ref()
            .ok_or_else(|| ClientError::Configuration("user_token not configured".into()))?;
        Ok(builder.header("Authorization", format!("Bearer {token}")))
    }

    fn service_request(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let key = self
            .service_api_key
            .as_ref()
            .ok_or_else(|| ClientError::Configuration("service_api_key not configured".into()))?;
        Ok(builder.header("x-api-key", key))
    }

    /// Get the current balance.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a service error envelope.
    pub async fn balance(&self) -> Result<BalanceInfo, ClientError> {
        let url = format!("{}/v1/credits/balance", self.base_url);
        let response = self.user_request(self.client.get(&url))?.send().await?;
        Self::handle_response(response).await
    }

    /// Process a credit purchase funded by an on-chain payment.
    ///
    /// A 202 from the service becomes [`PurchaseOutcome::Pending`]; the
    /// caller should retransmit the same claim after the suggested
    /// interval.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a service error envelope
    /// (including `duplicate_transaction`, whose details carry the prior
    /// outcome).
    pub async fn purchase(
        &self,
        request: &PurchaseRequest,
    ) -> Result<PurchaseOutcome, ClientError> {
        let url = format!("{}/v1/credits/purchase", self.base_url);
        let response = self
            .user_request(self.client.post(&url))?
            .json(request)
            .send()
            .await?;

        if response.status() == StatusCode::ACCEPTED {
            #[derive(serde::Deserialize)]
            struct Pending {
                retry_after_secs: u64,
            }
            let pending: Pending = response
                .json()
                .await
                .map_err(|e| ClientError::Unexpected(e.to_string()))?;

            tracing::debug!(
                tx_hash = %request.tx_hash,
                retry_after_secs = pending.retry_after_secs,
                "Purchase verification pending"
            );
            return Ok(PurchaseOutcome::Pending {
                retry_after_secs: pending.retry_after_secs,
            });
        }

        let receipt: PurchaseReceipt = Self::handle_response(response).await?;
        Ok(PurchaseOutcome::Credited(receipt))
    }

    /// Quote a withdrawal payout without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a service error envelope.
    pub async fn quote(&self, credits: i64) -> Result<PayoutQuote, ClientError> {
        let url = format!("{}/v1/withdrawals/quote", self.base_url);
        let response = self
            .user_request(self.client.post(&url))?
            .json(&serde_json::json!({ "credits": credits }))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Submit a withdrawal.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a service error envelope
    /// (including `insufficient_withdrawable`).
    pub async fn withdraw(&self, request: &WithdrawRequest) -> Result<WithdrawalInfo, ClientError> {
        let url = format!("{}/v1/withdrawals", self.base_url);
        let response = self
            .user_request(self.client.post(&url))?
            .json(request)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Settle a game session (service endpoints).
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a service error envelope
    /// (including `session_settled` for retransmissions).
    pub async fn settle(&self, request: &SettleRequest) -> Result<SettleReceipt, ClientError> {
        let url = format!("{}/v1/games/settle", self.base_url);
        let response = self
            .service_request(self.client.post(&url))?
            .json(request)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Decode a success body or map the service's error envelope.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ClientError::Unexpected(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(ClientError::Api {
                status: status.as_u16(),
                code: envelope.error.code,
                message: envelope.error.message,
                details: envelope.error.details,
            }),
            Err(_) => Err(ClientError::Unexpected(format!(
                "status {status}, body: {body}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user_client(server: &MockServer) -> LootvaultClient {
        LootvaultClient::new(
            server.uri(),
            ClientOptions {
                user_token: Some("test-token:user".into()),
                ..ClientOptions::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn balance_deserializes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/credits/balance"))
            .and(header("authorization", "Bearer test-token:user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "purchased": 1100,
                "winnings": 0,
                "bonus": 0,
                "total": 1100,
                "withdrawable": 1100,
                "welcome_bonus_claimed": true,
            })))
            .mount(&server)
            .await;

        let balance = user_client(&server).balance().await.unwrap();
        assert_eq!(balance.total, 1100);
        assert!(balance.welcome_bonus_claimed);
    }

    #[tokio::test]
    async fn purchase_maps_202_to_pending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/credits/purchase"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "status": "pending",
                "retry_after_secs": 30,
            })))
            .mount(&server)
            .await;

        let outcome = user_client(&server)
            .purchase(&PurchaseRequest {
                tx_hash: "ab".repeat(32),
                credits: 1000,
                wallet_address: format!("0x{}", "2".repeat(40)),
                expected_amount: "1000000000000000000".into(),
                expected_address: format!("0x{}", "1".repeat(40)),
            })
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            PurchaseOutcome::Pending {
                retry_after_secs: 30
            }
        ));
    }

    #[tokio::test]
    async fn error_envelope_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/withdrawals"))
            .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
                "error": {
                    "code": "insufficient_withdrawable",
                    "message": "insufficient withdrawable credits",
                    "details": { "withdrawable": 80, "requested": 90 },
                }
            })))
            .mount(&server)
            .await;

        let err = user_client(&server)
            .withdraw(&WithdrawRequest {
                credits: 90,
                destination_address: format!("0x{}", "9".repeat(40)),
            })
            .await
            .unwrap_err();

        match err {
            ClientError::Api {
                status,
                code,
                details,
                ..
            } => {
                assert_eq!(status, 402);
                assert_eq!(code, "insufficient_withdrawable");
                assert_eq!(details.unwrap()["withdrawable"], 80);
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn settle_uses_service_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/games/settle"))
            .and(header("x-api-key", "svc-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "settled": true,
                "session_id": "session-1",
                "new_balance": 750,
            })))
            .mount(&server)
            .await;

        let client = LootvaultClient::new(
            server.uri(),
            ClientOptions {
                service_api_key: Some("svc-key".into()),
                ..ClientOptions::default()
            },
        )
        .unwrap();

        let receipt = client
            .settle(&SettleRequest {
                session_id: "session-1".into(),
                game: "doors".into(),
                user_id: "user-uuid".into(),
                payout_credits: 750,
            })
            .await
            .unwrap();

        assert!(receipt.settled);
        assert_eq!(receipt.new_balance, Some(750));
    }

    #[tokio::test]
    async fn missing_token_is_a_configuration_error() {
        let server = MockServer::start().await;
        let client = LootvaultClient::new(server.uri(), ClientOptions::default()).unwrap();

        let err = client.balance().await.unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }
}
