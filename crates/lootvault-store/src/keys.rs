//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in
//! column families.

use chrono::{DateTime, Utc};

use lootvault_core::{EntryId, UserId, WithdrawalId};

/// Create a balance key from a user ID.
#[must_use]
pub fn balance_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a ledger entry key from an entry ID.
#[must_use]
pub fn entry_key(entry_id: &EntryId) -> Vec<u8> {
    entry_id.to_bytes().to_vec()
}

/// Create a user-entry index key.
///
/// Format: `user_id (16 bytes) || entry_id (16 bytes)`
///
/// Since ULIDs are time-ordered, a user's entries sort chronologically.
#[must_use]
pub fn user_entry_key(user_id: &UserId, entry_id: &EntryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&entry_id.to_bytes());
    key
}

/// Create a prefix for iterating all ledger entries for a user.
#[must_use]
pub fn user_entries_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the entry ID from a user-entry index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_entry_id_from_user_key(key: &[u8]) -> EntryId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    EntryId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create an idempotency key record key from the caller-supplied string.
#[must_use]
pub fn idempotency_key(key: &str) -> Vec<u8> {
    key.as_bytes().to_vec()
}

/// Create a credit transaction key from a funding hash.
#[must_use]
pub fn credit_transaction_key(tx_hash: &str) -> Vec<u8> {
    tx_hash.as_bytes().to_vec()
}

/// Create a withdrawal key from a withdrawal ID.
#[must_use]
pub fn withdrawal_key(withdrawal_id: &WithdrawalId) -> Vec<u8> {
    withdrawal_id.as_bytes().to_vec()
}

/// Create a user-withdrawal index key.
///
/// Format: `user_id (16) || created_at millis big-endian (8) ||
/// withdrawal_id (16)`. Withdrawal IDs are random UUIDs, so the
/// timestamp component supplies the chronological ordering.
#[must_use]
pub fn user_withdrawal_key(
    user_id: &UserId,
    created_at: &DateTime<Utc>,
    withdrawal_id: &WithdrawalId,
) -> Vec<u8> {
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(user_id.as_bytes());
    #[allow(clippy::cast_sign_loss)]
    let millis = created_at.timestamp_millis() as u64;
    key.extend_from_slice(&millis.to_be_bytes());
    key.extend_from_slice(withdrawal_id.as_bytes());
    key
}

/// Create a prefix for iterating all withdrawals for a user.
#[must_use]
pub fn user_withdrawals_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the withdrawal ID from a user-withdrawal index key.
///
/// # Panics
///
/// Panics if the key is not at least 40 bytes.
#[must_use]
pub fn extract_withdrawal_id_from_user_key(key: &[u8]) -> WithdrawalId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[24..40]);
    WithdrawalId::from_bytes(bytes)
}

/// Create a game session key from a session ID.
#[must_use]
pub fn game_session_key(session_id: &str) -> Vec<u8> {
    session_id.as_bytes().to_vec()
}

/// The single aggregate totals key.
#[must_use]
pub fn totals_key() -> Vec<u8> {
    b"totals".to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_key_length() {
        let user_id = UserId::generate();
        assert_eq!(balance_key(&user_id).len(), 16);
    }

    #[test]
    fn user_entry_key_format() {
        let user_id = UserId::generate();
        let entry_id = EntryId::generate();
        let key = user_entry_key(&user_id, &entry_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], user_id.as_bytes());
        assert_eq!(&key[16..], entry_id.to_bytes());
    }

    #[test]
    fn extract_entry_id_roundtrip() {
        let user_id = UserId::generate();
        let entry_id = EntryId::generate();
        let key = user_entry_key(&user_id, &entry_id);

        assert_eq!(extract_entry_id_from_user_key(&key), entry_id);
    }

    #[test]
    fn user_withdrawal_key_sorts_by_time() {
        let user_id = UserId::generate();
        let early = Utc::now();
        let late = early + chrono::Duration::milliseconds(5);

        let a = user_withdrawal_key(&user_id, &early, &WithdrawalId::generate());
        let b = user_withdrawal_key(&user_id, &late, &WithdrawalId::generate());
        assert!(a[..24] < b[..24]);
    }

    #[test]
    fn extract_withdrawal_id_roundtrip() {
        let user_id = UserId::generate();
        let withdrawal_id = WithdrawalId::generate();
        let key = user_withdrawal_key(&user_id, &Utc::now(), &withdrawal_id);

        assert_eq!(key.len(), 40);
        assert_eq!(extract_withdrawal_id_from_user_key(&key), withdrawal_id);
    }
}
