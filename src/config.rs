//! Configuration for the TTL store.
//!
//! This module provides a builder for the store-wide default TTL, the
//! capacity of each request queue and the expiry rule used by `list`.

use std::time::Duration;

/// Default store-wide TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

/// Default capacity of each request queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Which TTL the `list` sweep checks entries against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SweepPolicy {
    /// Evict every entry older than the store-wide default TTL, ignoring
    /// per-entry overrides. An entry with a long override can be evicted by
    /// a sweep before its own window elapses.
    #[default]
    DefaultTtl,

    /// Evict entries whose own effective TTL has elapsed, the same rule
    /// point operations use.
    EntryTtl,
}

/// Configuration for creating a new store.
///
/// ```
/// use std::time::Duration;
/// use ttl_store::{StoreConfig, SweepPolicy};
///
/// let config = StoreConfig::new()
///     .default_ttl(Duration::from_secs(30))
///     .queue_capacity(64)
///     .sweep_policy(SweepPolicy::EntryTtl)
///     .build();
/// assert_eq!(config.get_default_ttl(), Some(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store-wide TTL for entries without an override.
    /// `None` means such entries never expire.
    pub(crate) default_ttl: Option<Duration>,

    /// Capacity of each of the six request queues.
    pub(crate) queue_capacity: usize,

    pub(crate) sweep_policy: SweepPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl: Some(DEFAULT_TTL),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            sweep_policy: SweepPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store-wide default TTL.
    ///
    /// Set to `Duration::ZERO` to disable expiry for entries without an
    /// override.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = if ttl.is_zero() { None } else { Some(ttl) };
        self
    }

    /// Set the capacity of each request queue.
    ///
    /// Callers block once a queue is full. Values below 1 are raised to 1.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the expiry rule used by the `list` sweep.
    pub fn sweep_policy(mut self, policy: SweepPolicy) -> Self {
        self.sweep_policy = policy;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> Self {
        self
    }

    /// Get the default TTL, if set.
    pub fn get_default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Get the queue capacity.
    pub fn get_queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Get the sweep policy.
    pub fn get_sweep_policy(&self) -> SweepPolicy {
        self.sweep_policy
    }
}
