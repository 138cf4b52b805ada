//! Stored entry and the expiry predicate.

use std::time::{Duration, Instant};

use crate::value::Value;

/// A single stored entry.
///
/// An entry's window starts at `created_at` and lasts for its TTL override,
/// or the store-wide default when no override is set.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored value.
    pub(crate) value: Value,

    /// Set on create, update and TTL change.
    pub(crate) created_at: Instant,

    /// Per-entry TTL. `None` means the store-wide default applies.
    pub(crate) ttl: Option<Duration>,
}

impl Entry {
    /// Create a new entry whose window started at `created_at`.
    pub fn created_at(value: Value, created_at: Instant) -> Self {
        Self {
            value,
            created_at,
            ttl: None,
        }
    }

    /// The TTL that governs this entry.
    ///
    /// `None` means the entry never expires.
    pub fn effective_ttl(&self, default_ttl: Option<Duration>) -> Option<Duration> {
        self.ttl.or(default_ttl)
    }

    /// Check if this entry has expired at `now`.
    ///
    /// An entry is expired iff `created_at + ttl <= now`.
    pub fn is_expired_at(&self, now: Instant, default_ttl: Option<Duration>) -> bool {
        window_elapsed(self.created_at, self.effective_ttl(default_ttl), now)
    }

    /// Replace the value and restart the window. The TTL override is kept.
    pub fn refresh(&mut self, value: Value, now: Instant) {
        self.value = value;
        self.created_at = now;
    }

    /// Set the TTL override and restart the window.
    ///
    /// A zero TTL clears the override.
    pub fn set_ttl(&mut self, ttl: Duration, now: Instant) {
        self.ttl = if ttl.is_zero() { None } else { Some(ttl) };
        self.created_at = now;
    }

    /// End the window at `now`, so the next check finds the entry expired.
    pub fn expire(&mut self, now: Instant) {
        self.ttl = Some(Duration::ZERO);
        self.created_at = now;
    }

    /// Get a reference to the value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// `started + ttl <= now`. A window too large to represent never elapses.
pub(crate) fn window_elapsed(started: Instant, ttl: Option<Duration>, now: Instant) -> bool {
    match ttl.and_then(|ttl| started.checked_add(ttl)) {
        Some(deadline) => deadline <= now,
        None => false,
    }
}
