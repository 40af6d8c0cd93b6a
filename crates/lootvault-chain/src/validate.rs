//! Input validation for hashes and addresses.
//!
//! Validation happens before any network call; malformed and
//! sentinel/test hashes are rejected outright with no retry.

use crate::error::ChainError;

/// Required transaction hash length (hex characters).
pub const TX_HASH_LEN: usize = 64;

/// Required wallet address hex length, excluding the `0x` prefix.
pub const ADDRESS_HEX_LEN: usize = 40;

/// Validate a claimed transaction hash: exactly 64 hex characters and not
/// a sentinel (a single repeated character, the shape test fixtures use).
///
/// # Errors
///
/// Returns [`ChainError::InvalidInput`] describing the rejection.
pub fn validate_tx_hash(tx_hash: &str) -> Result<(), ChainError> {
    if tx_hash.len() != TX_HASH_LEN {
        return Err(ChainError::InvalidInput(format!(
            "transaction hash must be {TX_HASH_LEN} hex characters, got {}",
            tx_hash.len()
        )));
    }
    if !tx_hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ChainError::InvalidInput(
            "transaction hash contains non-hex characters".into(),
        ));
    }
    if is_sentinel(tx_hash) {
        return Err(ChainError::InvalidInput(
            "transaction hash is a sentinel value".into(),
        ));
    }
    Ok(())
}

/// Validate a wallet address: `0x` followed by 40 hex characters.
///
/// # Errors
///
/// Returns [`ChainError::InvalidInput`] describing the rejection.
pub fn validate_wallet_address(address: &str) -> Result<(), ChainError> {
    let Some(hex_part) = address.strip_prefix("0x") else {
        return Err(ChainError::InvalidInput(
            "wallet address must start with 0x".into(),
        ));
    };
    if hex_part.len() != ADDRESS_HEX_LEN
        || !hex_part.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(ChainError::InvalidInput(format!(
            "wallet address must be 0x followed by {ADDRESS_HEX_LEN} hex characters"
        )));
    }
    Ok(())
}

/// A hash made of one repeated character (all-zero and friends).
fn is_sentinel(tx_hash: &str) -> bool {
    let mut chars = tx_hash.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    chars.all(|c| c == first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_hash() {
        let hash = "0123456789abcdef".repeat(4);
        assert!(validate_tx_hash(&hash).is_ok());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(validate_tx_hash("abc123").is_err());
        assert!(validate_tx_hash(&"a".repeat(63)).is_err());
        assert!(validate_tx_hash(&"ab".repeat(33)).is_err());
    }

    #[test]
    fn rejects_non_hex() {
        let hash = format!("{}zz", "a1".repeat(31));
        assert_eq!(hash.len(), 64);
        assert!(validate_tx_hash(&hash).is_err());
    }

    #[test]
    fn rejects_sentinel_hashes() {
        assert!(validate_tx_hash(&"0".repeat(64)).is_err());
        assert!(validate_tx_hash(&"f".repeat(64)).is_err());
    }

    #[test]
    fn address_validation() {
        assert!(validate_wallet_address(&format!("0x{}", "a".repeat(40))).is_ok());
        assert!(validate_wallet_address(&"a".repeat(42)).is_err());
        assert!(validate_wallet_address("0x123").is_err());
        assert!(validate_wallet_address(&format!("0x{}g", "a".repeat(39))).is_err());
    }
}
