//! Time-boxed cache entry for a discovered address
//!
//! Timestamps use `tokio::time::Instant` so paused-clock tests can move past
//! the TTL without sleeping.

use std::time::Duration;
use tokio::time::Instant;

/// Default validity window for a discovered address (15 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// A discovered address and when it was fetched
///
/// An entry is only ever written after a successful resolution. Failed
/// resolutions leave the previous entry (if any) untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAddress {
    /// CIDR string, absent until the first success
    pub value: Option<String>,
    /// When `value` was fetched
    pub fetched_at: Instant,
    /// How long `value` stays valid
    pub ttl: Duration,
}

impl CachedAddress {
    /// Create an entry fetched now
    pub fn new(value: impl Into<String>, ttl: Duration) -> Self {
        Self {
            value: Some(value.into()),
            fetched_at: Instant::now(),
            ttl,
        }
    }

    /// Whether the entry may be served at `now`
    pub fn is_valid_at(&self, now: Instant) -> bool {
        self.value.is_some() && now.saturating_duration_since(self.fetched_at) < self.ttl
    }

    /// The cached value if it is still valid
    pub fn get(&self) -> Option<&str> {
        if self.is_valid_at(Instant::now()) {
            self.value.as_deref()
        } else {
            None
        }
    }
}
