//! Time-bounded cache handed to whoever needs one, instead of a process-wide map.

use std::{
    collections::HashMap,
    hash::Hash,
    time::{Duration, Instant},
};

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

#[derive(Debug)]
pub struct TtlCache<K, V, C = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: HashMap<K, Entry<V>>,
}

impl<K: Eq + Hash, V> TtlCache<K, V, SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K: Eq + Hash, V, C: Clock> TtlCache<K, V, C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let entry = Entry {
            value,
            inserted_at: self.clock.now(),
        };
        self.entries.insert(key, entry).map(|e| e.value)
    }

    /// Returns the live value for `key`; an expired entry is evicted instead.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        let expired = self
            .entries
            .get(key)
            .is_some_and(|e| now.saturating_duration_since(e.inserted_at) >= self.ttl);
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    /// Drop every expired entry, returning how many were evicted.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.inserted_at) < ttl);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entry count, including entries that have expired but not yet been evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    #[derive(Clone)]
    struct ManualClock {
        start: Instant,
        offset: Rc<Cell<Duration>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                start: Instant::now(),
                offset: Rc::new(Cell::new(Duration::ZERO)),
            }
        }

        fn advance(&self, by: Duration) {
            self.offset.set(self.offset.get() + by);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.start + self.offset.get()
        }
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let clock = ManualClock::new();
        let mut cache = TtlCache::with_clock(Duration::from_secs(10), clock.clone());
        cache.insert("trend-report", 1);

        clock.advance(Duration::from_secs(9));
        assert_eq!(cache.get(&"trend-report"), Some(&1));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"trend-report"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reinsert_refreshes_entry() {
        let clock = ManualClock::new();
        let mut cache = TtlCache::with_clock(Duration::from_secs(5), clock.clone());
        cache.insert("a", "old");
        clock.advance(Duration::from_secs(4));
        assert_eq!(cache.insert("a", "new"), Some("old"));
        clock.advance(Duration::from_secs(4));
        assert_eq!(cache.get(&"a"), Some(&"new"));
    }

    #[test]
    fn test_purge_expired() {
        let clock = ManualClock::new();
        let mut cache = TtlCache::with_clock(Duration::from_secs(5), clock.clone());
        cache.insert(1, "a");
        cache.insert(2, "b");
        clock.advance(Duration::from_secs(3));
        cache.insert(3, "c");
        clock.advance(Duration::from_secs(3));

        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.remove(&3), Some("c"));
    }

    #[test]
    fn test_system_clock_cache() {
        let mut cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("k".to_string(), 7);
        assert_eq!(cache.get(&"k".to_string()), Some(&7));
        assert_eq!(cache.ttl(), Duration::from_secs(60));
    }
}
