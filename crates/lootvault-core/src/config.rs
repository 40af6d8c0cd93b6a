//! Process-wide cached configuration with a TTL.
//!
//! Configuration that changes out-of-band (payout rates, fee schedules) is
//! loaded once and reused until a time-to-live expires, then reloaded on
//! next access. The cache is an explicit injectable value, not a module
//! global, and time flows through the [`Clock`] trait so tests control
//! staleness deterministically.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Default TTL for cached configuration.
pub const DEFAULT_CONFIG_TTL: Duration = Duration::from_secs(5 * 60);

/// A monotonic time source.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CachedValue<T> {
    loaded_at: Instant,
    value: Arc<T>,
}

/// A cache cell holding one configuration value with a TTL.
pub struct ConfigCache<T> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    cell: RwLock<Option<CachedValue<T>>>,
}

impl<T> ConfigCache<T> {
    /// Create an empty cache with the given TTL and the system clock.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create an empty cache with an injected clock.
    #[must_use]
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            cell: RwLock::new(None),
        }
    }

    /// Return the cached value if younger than the TTL, otherwise run
    /// `load` and cache its result.
    ///
    /// # Panics
    ///
    /// Panics if the inner lock is poisoned, which only happens after a
    /// panic inside a previous `load`.
    pub fn get_or_load(&self, load: impl FnOnce() -> T) -> Arc<T> {
        let now = self.clock.now();

        if let Some(cached) = self.cell.read().expect("config cache poisoned").as_ref() {
            if now.duration_since(cached.loaded_at) < self.ttl {
                return Arc::clone(&cached.value);
            }
        }

        let value = Arc::new(load());
        let mut cell = self.cell.write().expect("config cache poisoned");
        *cell = Some(CachedValue {
            loaded_at: now,
            value: Arc::clone(&value),
        });
        value
    }

    /// Drop the cached value so the next access reloads.
    ///
    /// # Panics
    ///
    /// Panics if the inner lock is poisoned.
    pub fn invalidate(&self) {
        *self.cell.write().expect("config cache poisoned") = None;
    }
}
