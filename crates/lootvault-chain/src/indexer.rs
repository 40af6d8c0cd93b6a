//! Blockchain indexer client and boundary normalization.
//!
//! Indexer deployments differ in where they nest the transaction record
//! (`transaction`, `result`, or the top level) and in whether amounts come
//! back as strings or numbers. Everything is normalized into one typed
//! [`TxLookup`] immediately after the call, before any business logic
//! consumes it.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::ChainError;

/// Indexed status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Included and confirmed on chain.
    Confirmed,

    /// Seen but not yet confirmed.
    Pending,

    /// Not known to the indexer (yet).
    NotFound,
}

/// A normalized transaction lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxLookup {
    /// Indexed status.
    pub status: TxStatus,

    /// Output amount in base units; zero unless confirmed.
    pub amount: u128,

    /// Destination address; empty unless confirmed.
    pub to_address: String,
}

/// HTTP client for the blockchain indexer.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl IndexerClient {
    /// Create a new indexer client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Indexer API URL
    /// * `api_key` - Optional bearer token
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Look up a transaction by hash.
    ///
    /// An HTTP 404 means the indexer does not know the hash yet and maps
    /// to [`TxStatus::NotFound`]; any other non-success status is a hard
    /// error.
    ///
    /// # Errors
    ///
    /// - [`ChainError::Http`] on transport failure.
    /// - [`ChainError::Api`] when the indexer rejects the request.
    /// - [`ChainError::MalformedResponse`] when the body cannot be
    ///   normalized.
    pub async fn lookup(&self, tx_hash: &str) -> Result<TxLookup, ChainError> {
        let url = format!("{}/v1/transactions/{}", self.base_url, tx_hash);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(TxLookup {
                status: TxStatus::NotFound,
                amount: 0,
                to_address: String::new(),
            });
        }

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChainError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChainError::MalformedResponse(e.to_string()))?;

        normalize(&body)
    }
}

/// Raw transaction record, tolerant of field aliases.
#[derive(Debug, Deserialize)]
struct RawTx {
    status: String,
    #[serde(default)]
    amount: Option<serde_json::Value>,
    #[serde(default, alias = "to")]
    to_address: Option<String>,
}

/// Normalize an indexer response body into a [`TxLookup`].
///
/// The record may be nested under `transaction`, under `result`, or sit at
/// the top level.
fn normalize(body: &serde_json::Value) -> Result<TxLookup, ChainError> {
    let record = body
        .get("transaction")
        .or_else(|| body.get("result"))
        .unwrap_or(body);

    let raw: RawTx = serde_json::from_value(record.clone())
        .map_err(|e| ChainError::MalformedResponse(e.to_string()))?;

    let status = match raw.status.as_str() {
        "confirmed" | "success" => TxStatus::Confirmed,
        "pending" => TxStatus::Pending,
        "not_found" | "unknown" => TxStatus::NotFound,
        other => {
            return Err(ChainError::MalformedResponse(format!(
                "unrecognized transaction status: {other}"
            )))
        }
    };

    if status != TxStatus::Confirmed {
        return Ok(TxLookup {
            status,
            amount: 0,
            to_address: String::new(),
        });
    }

    let amount = parse_amount(raw.amount.as_ref())?;
    let to_address = raw.to_address.ok_or_else(|| {
        ChainError::MalformedResponse("confirmed transaction without destination".into())
    })?;

    Ok(TxLookup {
        status,
        amount,
        to_address,
    })
}

/// Amounts arrive as decimal strings (the precision-safe path) but some
/// deployments send small values as JSON numbers.
fn parse_amount(raw: Option<&serde_json::Value>) -> Result<u128, ChainError> {
    let value =
        raw.ok_or_else(|| ChainError::MalformedResponse("confirmed transaction without amount".into()))?;

    match value {
        serde_json::Value::String(s) => s
            .parse::<u128>()
            .map_err(|_| ChainError::MalformedResponse(format!("unparseable amount: {s}"))),
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| ChainError::MalformedResponse(format!("unparseable amount: {n}"))),
        other => Err(ChainError::MalformedResponse(format!(
            "unparseable amount: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_nested_transaction_shape() {
        let body = json!({
            "transaction": {
                "status": "confirmed",
                "amount": "1000000000000000000",
                "to_address": "0xabc"
            }
        });

        let lookup = normalize(&body).unwrap();
        assert_eq!(lookup.status, TxStatus::Confirmed);
        assert_eq!(lookup.amount, 1_000_000_000_000_000_000);
        assert_eq!(lookup.to_address, "0xabc");
    }

    #[test]
    fn normalizes_result_shape_with_to_alias() {
        let body = json!({
            "result": {
                "status": "success",
                "amount": 42,
                "to": "0xdef"
            }
        });

        let lookup = normalize(&body).unwrap();
        assert_eq!(lookup.status, TxStatus::Confirmed);
        assert_eq!(lookup.amount, 42);
        assert_eq!(lookup.to_address, "0xdef");
    }

    #[test]
    fn normalizes_top_level_shape() {
        let body = json!({ "status": "pending" });
        let lookup = normalize(&body).unwrap();
        assert_eq!(lookup.status, TxStatus::Pending);
    }

    #[test]
    fn amount_string_preserves_precision() {
        let body = json!({
            "status": "confirmed",
            "amount": "340282366920938463463374607431768211455",
            "to_address": "0xabc"
        });
        let lookup = normalize(&body).unwrap();
        assert_eq!(lookup.amount, u128::MAX);
    }

    #[test]
    fn unknown_status_is_malformed() {
        let body = json!({ "status": "sideways" });
        assert!(matches!(
            normalize(&body),
            Err(ChainError::MalformedResponse(_))
        ));
    }

    #[test]
    fn confirmed_without_amount_is_malformed() {
        let body = json!({ "status": "confirmed", "to_address": "0xabc" });
        assert!(matches!(
            normalize(&body),
            Err(ChainError::MalformedResponse(_))
        ));
    }
}
