//! In-process memory cache with TTL and LRU eviction.
//!
//! One lock per cache instance; eviction of expired entries runs
//! synchronously inline with `put`, rate-limited by a check interval so
//! the sweep cost is not paid on every call. Caches are injected as
//! explicit dependencies with `new`/`get`/`put`/`clear` lifecycle — there
//! are no module-level singletons.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::util::hash_key;

/// Hit/miss/eviction counters.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Hit rate in `[0.0, 1.0]`.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct Inner<V> {
    entries: LruCache<u64, Entry<V>>,
    last_sweep: Instant,
}

/// TTL + LRU cache keyed by string (hashed to u64 internally).
pub struct MemoryCache<V: Clone> {
    inner: Mutex<Inner<V>>,
    ttl: Duration,
    sweep_interval: Duration,
    stats: CacheStats,
}

impl<V: Clone> MemoryCache<V> {
    /// Default interval between inline expiry sweeps.
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_sweep_interval(capacity, ttl, Self::DEFAULT_SWEEP_INTERVAL)
    }

    pub fn with_sweep_interval(capacity: usize, ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(
                    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
                ),
                last_sweep: Instant::now(),
            }),
            ttl,
            sweep_interval,
            stats: CacheStats::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_hashed(hash_key(key))
    }

    pub fn get_hashed(&self, key: u64) -> Option<V> {
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(&key) {
            Some(entry) => entry.inserted_at.elapsed() > self.ttl,
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };
        if expired {
            inner.entries.pop(&key);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        self.stats.hits.fetch_add(1, Ordering::Relaxed);
        inner.entries.get(&key).map(|e| e.value.clone())
    }

    pub fn put(&self, key: &str, value: V) {
        self.put_hashed(hash_key(key), value);
    }

    pub fn put_hashed(&self, key: u64, value: V) {
        let mut inner = self.inner.lock();
        if inner.last_sweep.elapsed() >= self.sweep_interval {
            self.sweep_expired(&mut inner);
        }
        if inner.entries.len() == inner.entries.cap().get() && !inner.entries.contains(&key) {
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
        inner.entries.put(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    fn sweep_expired(&self, inner: &mut Inner<V>) {
        let ttl = self.ttl;
        let expired: Vec<u64> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.inserted_at.elapsed() > ttl)
            .map(|(k, _)| *k)
            .collect();
        for key in expired {
            inner.entries.pop(&key);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
        inner.last_sweep = Instant::now();
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
