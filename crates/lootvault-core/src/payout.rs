//! Payout configuration and the withdrawal fee quote.
//!
//! Quotes are pure integer arithmetic in micro-dollars: credits convert at
//! a published rate that already carries the house spread, then a
//! fixed-percentage platform fee and an estimated flat network fee come
//! off the top.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Constants
// ============================================================================

/// Face value of one credit in micro-dollars ($0.01).
pub const CREDIT_FACE_MICROS: i64 = 10_000;

/// Default published cashout rate: 98% of face value.
pub const DEFAULT_RATE_MICROS_PER_CREDIT: i64 = 9_800;

/// Default platform fee in basis points (5%).
pub const DEFAULT_PLATFORM_FEE_BPS: i64 = 500;

/// Default estimated network fee in micro-dollars ($0.05).
pub const DEFAULT_NETWORK_FEE_MICROS: i64 = 50_000;

/// Default minimum withdrawal size in credits.
pub const DEFAULT_MIN_WITHDRAWAL_CREDITS: i64 = 10;

/// Payout knobs, loaded through the TTL'd config cache so a published rate
/// change takes effect without a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutConfig {
    /// Micro-dollars paid per credit (spread already applied).
    pub rate_micros_per_credit: i64,

    /// Platform fee in basis points of the gross amount.
    pub platform_fee_bps: i64,

    /// Estimated network fee in micro-dollars, charged flat.
    pub network_fee_micros: i64,

    /// Smallest withdrawal accepted, in credits.
    pub min_withdrawal_credits: i64,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            rate_micros_per_credit: DEFAULT_RATE_MICROS_PER_CREDIT,
            platform_fee_bps: DEFAULT_PLATFORM_FEE_BPS,
            network_fee_micros: DEFAULT_NETWORK_FEE_MICROS,
            min_withdrawal_credits: DEFAULT_MIN_WITHDRAWAL_CREDITS,
        }
    }
}

/// The fee breakdown for converting credits into a payout.
///
/// Pure computation; nothing is mutated until the caller submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutQuote {
    /// Credits being quoted.
    pub credits: i64,

    /// The published rate used, in micro-dollars per credit.
    pub rate_micros_per_credit: i64,

    /// Gross payout before fees, in micro-dollars.
    pub gross_micros: i64,

    /// Platform fee, in micro-dollars.
    pub platform_fee_micros: i64,

    /// Estimated network fee, in micro-dollars.
    pub network_fee_micros: i64,

    /// Net payout after fees, in micro-dollars.
    pub net_micros: i64,
}

impl PayoutQuote {
    /// Quote a payout for `credits` under `config`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::BelowMinimum`] when `credits` is under the configured
    ///   minimum (or not positive).
    /// - [`CoreError::QuoteNotPositive`] when fees consume the entire gross
    ///   amount.
    pub fn compute(config: &PayoutConfig, credits: i64) -> Result<Self, CoreError> {
        if credits < config.min_withdrawal_credits || credits <= 0 {
            return Err(CoreError::BelowMinimum {
                credits,
                minimum: config.min_withdrawal_credits,
            });
        }

        let gross_micros = credits * config.rate_micros_per_credit;
        let platform_fee_micros = gross_micros * config.platform_fee_bps / 10_000;
        let network_fee_micros = config.network_fee_micros;
        let net_micros = gross_micros - platform_fee_micros - network_fee_micros;

        if net_micros <= 0 {
            return Err(CoreError::QuoteNotPositive { net_micros });
        }

        Ok(Self {
            credits,
            rate_micros_per_credit: config.rate_micros_per_credit,
            gross_micros,
            platform_fee_micros,
            network_fee_micros,
            net_micros,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_breakdown_adds_up() {
        let quote = PayoutQuote::compute(&PayoutConfig::default(), 1000).unwrap();

        assert_eq!(quote.gross_micros, 9_800_000);
        assert_eq!(quote.platform_fee_micros, 490_000);
        assert_eq!(quote.network_fee_micros, 50_000);
        assert_eq!(quote.net_micros, 9_260_000);
        assert_eq!(
            quote.net_micros,
            quote.gross_micros - quote.platform_fee_micros - quote.network_fee_micros
        );
    }

    #[test]
    fn below_minimum_rejected() {
        let err = PayoutQuote::compute(&PayoutConfig::default(), 9).unwrap_err();
        assert!(matches!(
            err,
            CoreError::BelowMinimum {
                credits: 9,
                minimum: 10
            }
        ));
    }

    #[test]
    fn fees_swallowing_gross_rejected() {
        let config = PayoutConfig {
            rate_micros_per_credit: 100,
            platform_fee_bps: 0,
            network_fee_micros: 1_000_000,
            min_withdrawal_credits: 1,
        };
        // 100 credits gross 10_000 micros, network fee 1_000_000.
        let err = PayoutQuote::compute(&config, 100).unwrap_err();
        assert!(matches!(err, CoreError::QuoteNotPositive { .. }));
    }

    #[test]
    fn quote_never_mutates_anything() {
        // Two identical quotes agree; the computation is pure.
        let a = PayoutQuote::compute(&PayoutConfig::default(), 250).unwrap();
        let b = PayoutQuote::compute(&PayoutConfig::default(), 250).unwrap();
        assert_eq!(a, b);
    }
}
