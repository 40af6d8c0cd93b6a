//! Service configuration.

use std::time::Duration;

use lootvault_chain::BackoffPolicy;
use lootvault_core::{PayoutConfig, WELCOME_BONUS_CREDITS};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/lootvault").
    pub data_dir: String,

    /// Blockchain indexer API URL (optional; purchases are unavailable
    /// without it).
    pub indexer_url: Option<String>,

    /// Blockchain indexer API key (optional).
    pub indexer_api_key: Option<String>,

    /// Service API key for service-to-service auth (settlement, adjust,
    /// withdrawal status).
    pub service_api_key: Option<String>,

    /// Welcome bonus credits granted on a qualifying first purchase.
    pub welcome_bonus_credits: i64,

    /// Payment verification retry policy.
    pub verify_backoff: BackoffPolicy,

    /// Payout knobs used as the fallback when no environment override is
    /// present at reload time.
    pub payout: PayoutConfig,

    /// Payout config cache TTL in seconds.
    pub payout_ttl_seconds: u64,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            indexer_url: std::env::var("INDEXER_URL").ok(),
            indexer_api_key: std::env::var("INDEXER_API_KEY").ok(),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            welcome_bonus_credits: env_i64("WELCOME_BONUS_CREDITS")
                .unwrap_or(defaults.welcome_bonus_credits),
            verify_backoff: BackoffPolicy {
                max_attempts: env_u32("VERIFY_MAX_ATTEMPTS")
                    .unwrap_or(defaults.verify_backoff.max_attempts),
                base_delay: env_u64("VERIFY_BASE_DELAY_MS")
                    .map_or(defaults.verify_backoff.base_delay, Duration::from_millis),
                max_delay: env_u64("VERIFY_MAX_DELAY_MS")
                    .map_or(defaults.verify_backoff.max_delay, Duration::from_millis),
            },
            payout: load_payout_config(&defaults.payout),
            payout_ttl_seconds: env_u64("PAYOUT_TTL_SECONDS")
                .unwrap_or(defaults.payout_ttl_seconds),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_u64("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/lootvault".into(),
            indexer_url: None,
            indexer_api_key: None,
            service_api_key: None,
            welcome_bonus_credits: WELCOME_BONUS_CREDITS,
            verify_backoff: BackoffPolicy::default(),
            payout: PayoutConfig::default(),
            payout_ttl_seconds: 5 * 60,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

/// Load the payout knobs from the environment, falling back to the given
/// config per field.
///
/// Called again on every cache reload, so a published rate change takes
/// effect within one TTL without a restart.
#[must_use]
pub fn load_payout_config(fallback: &PayoutConfig) -> PayoutConfig {
    PayoutConfig {
        rate_micros_per_credit: env_i64("PAYOUT_RATE_MICROS")
            .unwrap_or(fallback.rate_micros_per_credit),
        platform_fee_bps: env_i64("PAYOUT_PLATFORM_FEE_BPS").unwrap_or(fallback.platform_fee_bps),
        network_fee_micros: env_i64("PAYOUT_NETWORK_FEE_MICROS")
            .unwrap_or(fallback.network_fee_micros),
        min_withdrawal_credits: env_i64("PAYOUT_MIN_WITHDRAWAL_CREDITS")
            .unwrap_or(fallback.min_withdrawal_credits),
    }
}

fn env_i64(name: &str) -> Option<i64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
