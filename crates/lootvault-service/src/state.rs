//! Application state.

use std::sync::Arc;
use std::time::Duration;

use lootvault_chain::{IndexerClient, PaymentVerifier};
use lootvault_core::{ConfigCache, PayoutConfig};
use lootvault_store::RocksStore;

use crate::config::{load_payout_config, ServiceConfig};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Payment verifier (optional; purchases need it).
    pub verifier: Option<Arc<PaymentVerifier>>,

    /// TTL'd payout configuration cache.
    pub payout_cache: Arc<ConfigCache<PayoutConfig>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let verifier = config.indexer_url.as_ref().map(|url| {
            tracing::info!(indexer_url = %url, "Payment verification enabled");
            let indexer = IndexerClient::new(url.as_str(), config.indexer_api_key.clone());
            Arc::new(PaymentVerifier::new(indexer, config.verify_backoff))
        });

        if verifier.is_none() {
            tracing::warn!("Indexer not configured - purchases will not be available");
        }

        let payout_cache = Arc::new(ConfigCache::new(Duration::from_secs(
            config.payout_ttl_seconds,
        )));

        Self {
            store,
            config,
            verifier,
            payout_cache,
        }
    }

    /// Current payout configuration, reloaded when the cache TTL lapses.
    #[must_use]
    pub fn payout_config(&self) -> Arc<PayoutConfig> {
        self.payout_cache
            .get_or_load(|| load_payout_config(&self.config.payout))
    }
}
