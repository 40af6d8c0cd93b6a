//! Striped locks serializing same-user mutations.
//!
//! The ledger's read-check-write-log sequence must be one atomic unit per
//! user. `RocksDB` write batches make the multi-family write atomic, but
//! the read-modify-write needs external serialization; a fixed pool of
//! mutexes indexed by key hash gives per-user exclusion without a lock per
//! row. Mutations for different users only contend on a stripe collision.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

use lootvault_core::UserId;

/// Number of stripes in the pool.
const STRIPE_COUNT: usize = 64;

/// A fixed pool of mutexes indexed by key hash.
pub(crate) struct LockStripes {
    stripes: Vec<Mutex<()>>,
}

impl LockStripes {
    pub(crate) fn new() -> Self {
        Self {
            stripes: (0..STRIPE_COUNT).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Lock the stripe owning `user_id` for the duration of the guard.
    pub(crate) fn guard_user(&self, user_id: &UserId) -> MutexGuard<'_, ()> {
        self.guard_bytes(user_id.as_bytes())
    }

    /// Lock the stripe owning an arbitrary byte key.
    pub(crate) fn guard_bytes(&self, key: &[u8]) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        #[allow(clippy::cast_possible_truncation)]
        let index = (hasher.finish() as usize) % self.stripes.len();
        self.stripes[index]
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
