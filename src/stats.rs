//! Statistics for the store.
//!
//! Counters are only ever written by the worker thread. They are atomic so
//! callers can read a snapshot without a round trip through the request
//! queues.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// `get` calls that found a live entry.
    hits: AtomicU64,

    /// `get` calls that found nothing, or only an expired entry.
    misses: AtomicU64,

    /// Entries evicted because their window elapsed, lazily or by a sweep.
    expirations: AtomicU64,

    creates: AtomicU64,
    updates: AtomicU64,
    ttl_sets: AtomicU64,
    removes: AtomicU64,

    /// Number of `list` sweeps performed.
    sweeps: AtomicU64,

    /// Current number of entries, including expired ones not yet evicted.
    size: AtomicU64,
}

impl StoreStats {
    /// Create a new stats instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expirations(&self, n: u64) {
        self.expirations.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_create(&self) {
        self.creates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ttl_set(&self) {
        self.ttl_sets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sweep(&self) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_size(&self, size: usize) {
        self.size.store(size as u64, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Relaxed)
    }

    pub fn creates(&self) -> u64 {
        self.creates.load(Ordering::Relaxed)
    }

    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    pub fn ttl_sets(&self) -> u64 {
        self.ttl_sets.load(Ordering::Relaxed)
    }

    pub fn removes(&self) -> u64 {
        self.removes.load(Ordering::Relaxed)
    }

    pub fn sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }

    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Relaxed)
    }

    /// Hit rate as a percentage (0.0 to 100.0).
    /// Returns 0.0 if no `get` has been performed.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            expirations: self.expirations(),
            creates: self.creates(),
            updates: self.updates(),
            ttl_sets: self.ttl_sets(),
            removes: self.removes(),
            sweeps: self.sweeps(),
            size: self.size(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// A point-in-time snapshot of store statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub creates: u64,
    pub updates: u64,
    pub ttl_sets: u64,
    pub removes: u64,
    pub sweeps: u64,
    pub size: u64,
    pub hit_rate: f64,
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hits:{} misses:{} expirations:{} creates:{} updates:{} ttl_sets:{} removes:{} sweeps:{} size:{} hit_rate:{:.1}%",
            self.hits,
            self.misses,
            self.expirations,
            self.creates,
            self.updates,
            self.ttl_sets,
            self.removes,
            self.sweeps,
            self.size,
            self.hit_rate
        )
    }
}
