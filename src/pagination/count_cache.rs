use dashmap::DashMap;
use std::time::{Duration, Instant};

/// TTL cache for approximate row counts.
///
/// An exact `COUNT(*)` over a huge append-mostly table is expensive, so
/// listings refresh the count on a fixed interval (5 minutes by default)
/// and serve the stale value in between. The cached number is only ever a
/// display hint; page existence is decided by the probe row, never by this
/// count.
#[derive(Debug)]
pub struct CountCache {
    ttl: Duration,
    entries: DashMap<&'static str, CachedCount>,
}

#[derive(Debug, Clone, Copy)]
struct CachedCount {
    value: u64,
    refreshed_at: Instant,
}

pub const DEFAULT_COUNT_TTL: Duration = Duration::from_secs(5 * 60);

impl CountCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Returns the cached count for `key` unless it has expired.
    pub fn get(&self, key: &'static str) -> Option<u64> {
        let entry = self.entries.get(key)?;
        if entry.refreshed_at.elapsed() < self.ttl {
            Some(entry.value)
        } else {
            None
        }
    }

    pub fn put(&self, key: &'static str, value: u64) {
        self.entries.insert(
            key,
            CachedCount {
                value,
                refreshed_at: Instant::now(),
            },
        );
    }
}

impl Default for CountCache {
    fn default() -> Self {
        Self::new(DEFAULT_COUNT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_cached_value_within_ttl() {
        let cache = CountCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("tickets"), None);

        cache.put("tickets", 47);
        assert_eq!(cache.get("tickets"), Some(47));
    }

    #[test]
    fn expires_after_ttl() {
        let cache = CountCache::new(Duration::from_millis(10));
        cache.put("tickets", 47);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("tickets"), None);
    }

    #[test]
    fn put_refreshes_the_clock() {
        let cache = CountCache::new(Duration::from_millis(50));
        cache.put("tickets", 1);
        std::thread::sleep(Duration::from_millis(30));
        cache.put("tickets", 2);
        std::thread::sleep(Duration::from_millis(30));
        // 60ms after the first put, 30ms after the second.
        assert_eq!(cache.get("tickets"), Some(2));
    }

    #[test]
    fn keys_are_independent() {
        let cache = CountCache::new(Duration::from_secs(60));
        cache.put("tickets", 47);
        cache.put("orders", 9);
        assert_eq!(cache.get("tickets"), Some(47));
        assert_eq!(cache.get("orders"), Some(9));
    }
}
