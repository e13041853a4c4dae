//! Metrics declaration.
//!
//! Metric names are registered lazily on first use together with their
//! descriptions. Cache status and lookup metrics carry a `name` label set
//! from [`CacheConfig::name`](crate::CacheConfig::name), empty when unset.
//! Offload and refresh metrics are unlabeled.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use crate::config::CacheConfig;

#[cfg(feature = "metrics")]
lazy_static! {
    // Cache status metrics

    /// Track number of cache hit events.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stalebox_cache_hit_total",
            "Total number of cache hit events."
        );
        "stalebox_cache_hit_total"
    };
    /// Track number of cache miss events.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stalebox_cache_miss_total",
            "Total number of cache miss events."
        );
        "stalebox_cache_miss_total"
    };
    /// Track number of stale entries served.
    pub static ref CACHE_STALE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stalebox_cache_stale_total",
            "Total number of stale entries served."
        );
        "stalebox_cache_stale_total"
    };

    // Lookup metrics

    /// Histogram of cache lookup duration.
    pub static ref CACHE_LOOKUP_DURATION: &'static str = {
        metrics::describe_histogram!(
            "stalebox_lookup_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of cache lookups in seconds."
        );
        "stalebox_lookup_duration_seconds"
    };
    /// Track failed or timed out cache lookups.
    pub static ref CACHE_LOOKUP_FAILURES: &'static str = {
        metrics::describe_counter!(
            "stalebox_lookup_failures_total",
            "Total number of failed or timed out cache lookups."
        );
        "stalebox_lookup_failures_total"
    };

    // Offload manager metrics

    /// Track number of offload tasks spawned.
    pub static ref OFFLOAD_TASKS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "stalebox_offload_tasks_spawned_total",
            "Total number of offload tasks spawned."
        );
        "stalebox_offload_tasks_spawned_total"
    };
    /// Track number of offload tasks deduplicated (skipped).
    pub static ref OFFLOAD_TASKS_DEDUPLICATED: &'static str = {
        metrics::describe_counter!(
            "stalebox_offload_tasks_deduplicated_total",
            "Total number of offload tasks deduplicated (skipped because already in flight)."
        );
        "stalebox_offload_tasks_deduplicated_total"
    };
    /// Gauge of currently active offload tasks.
    pub static ref OFFLOAD_TASKS_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "stalebox_offload_tasks_active",
            "Number of currently active offload tasks."
        );
        "stalebox_offload_tasks_active"
    };

    // Refresh metrics

    /// Track background refreshes that stored a fresh entry.
    pub static ref REFRESH_SUCCEEDED: &'static str = {
        metrics::describe_counter!(
            "stalebox_refresh_succeeded_total",
            "Total number of background refreshes that stored a fresh entry."
        );
        "stalebox_refresh_succeeded_total"
    };
    /// Track background refreshes that failed and evicted their entry.
    pub static ref REFRESH_FAILED: &'static str = {
        metrics::describe_counter!(
            "stalebox_refresh_failed_total",
            "Total number of background refreshes that failed and evicted their entry."
        );
        "stalebox_refresh_failed_total"
    };
}

/// Value of the `name` label for `config`.
#[cfg(feature = "metrics")]
#[inline]
pub fn name_label(config: &CacheConfig) -> String {
    config
        .name
        .as_ref()
        .map(|name| name.to_string())
        .unwrap_or_default()
}
