//! Negative-result cache for balance checks.

use gofer_core::{Address, Clock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Short-TTL memo of addresses known to have insufficient balance.
///
/// Entries are created only on a negative balance result and expire after
/// the configured TTL; positive results are never stored. Expired entries
/// are pruned lazily on lookup.
pub struct LowBalanceCache {
    entries: Mutex<HashMap<Address, u64>>,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
}

impl LowBalanceCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_ms: ttl.as_millis() as u64,
            clock,
        }
    }

    /// Record a negative balance result with a fresh TTL.
    pub fn note_insufficient(&self, address: &Address) {
        let now = self.clock.now_ms();
        self.entries.lock().insert(address.clone(), now);
        debug!(%address, ttl_ms = self.ttl_ms, "low balance cached");
    }

    /// True if a live (non-expired) negative entry exists for `address`.
    pub fn is_marked_low(&self, address: &Address) -> bool {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        match entries.get(address) {
            Some(&checked_at) if now.saturating_sub(checked_at) < self.ttl_ms => true,
            Some(_) => {
                entries.remove(address);
                false
            }
            None => false,
        }
    }

    /// Number of live entries (expired entries may still be counted until
    /// their next lookup).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct MockClock {
        time_ms: AtomicU64,
    }

    impl MockClock {
        fn new(initial_ms: u64) -> Self {
            Self {
                time_ms: AtomicU64::new(initial_ms),
            }
        }

        fn advance(&self, delta_ms: u64) {
            self.time_ms.fetch_add(delta_ms, Ordering::AcqRel);
        }
    }

    impl Clock for MockClock {
        fn now_ms(&self) -> u64 {
            self.time_ms.load(Ordering::Acquire)
        }
    }

    const BASE_TIME: u64 = 1_700_000_000_000;
    const TTL: Duration = Duration::from_secs(600);

    #[test]
    fn test_negative_entry_lives_until_ttl() {
        let clock = Arc::new(MockClock::new(BASE_TIME));
        let cache = LowBalanceCache::new(TTL, Arc::clone(&clock) as Arc<dyn Clock>);
        let addr = Address::new("0xholder");

        assert!(!cache.is_marked_low(&addr));
        cache.note_insufficient(&addr);
        assert!(cache.is_marked_low(&addr));

        clock.advance(599_999);
        assert!(cache.is_marked_low(&addr));

        clock.advance(1);
        assert!(!cache.is_marked_low(&addr));
        // Expired entry was pruned.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fresh_negative_resets_ttl() {
        let clock = Arc::new(MockClock::new(BASE_TIME));
        let cache = LowBalanceCache::new(TTL, Arc::clone(&clock) as Arc<dyn Clock>);
        let addr = Address::new("0xholder");

        cache.note_insufficient(&addr);
        clock.advance(500_000);
        cache.note_insufficient(&addr);
        clock.advance(500_000);
        // Second negative refreshed the window.
        assert!(cache.is_marked_low(&addr));
    }
}
