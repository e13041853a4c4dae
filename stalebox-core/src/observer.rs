//! Hit and miss notifications.
//!
//! The engine reports every resolved request to a [`CacheObserver`]. Observers
//! are called inline and must return quickly; they cannot change the outcome.

use tracing::debug;

use crate::key::CacheKey;

/// Receives hit and miss notifications.
///
/// `name` is the optional name configured on the cache instance, letting one
/// observer tell several stacked caches apart.
pub trait CacheObserver: Send + Sync {
    /// A request was answered from the cache (fresh or stale).
    fn on_hit(&self, key: &CacheKey, name: Option<&str>);

    /// A request missed the cache and went to the origin.
    fn on_miss(&self, key: &CacheKey, name: Option<&str>);
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CacheObserver for NoopObserver {
    fn on_hit(&self, _key: &CacheKey, _name: Option<&str>) {}

    fn on_miss(&self, _key: &CacheKey, _name: Option<&str>) {}
}

/// Observer that turns notifications into `tracing` debug events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn on_hit(&self, key: &CacheKey, name: Option<&str>) {
        debug!(key = %key, name = name.unwrap_or_default(), "cache hit");
    }

    fn on_miss(&self, key: &CacheKey, name: Option<&str>) {
        debug!(key = %key, name = name.unwrap_or_default(), "cache miss");
    }
}
