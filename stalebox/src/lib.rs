#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Backend-related re-exports and utilities.
///
/// This module provides access to the [`Backend`](stalebox_backend::Backend) trait
/// and related types for implementing custom storage backends.
pub mod backend;

/// Cache configuration.
///
/// Defines [`CacheConfig`] with the lookup timeout, error tolerance,
/// stale-while-revalidate switch, refresh timeout and instance name.
pub mod config;

/// Request orchestration.
///
/// [`CacheEngine`] ties lookups, origin calls, storage and background
/// refreshes together for one backend.
pub mod engine;

/// Error types for cache operations.
///
/// Defines:
/// - [`CacheError`] - lookup failures and timeouts
/// - [`ExecuteError`] - what [`CacheEngine::execute`] returns
/// - [`ConfigError`] - invalid engine setup
/// - [`RefreshError`] - why a background refresh failed
pub mod error;

/// Metrics collection for cache observability.
///
/// When the `metrics` feature is enabled, this module provides counters
/// and histograms for:
/// - Cache hits, misses, and stale responses
/// - Lookup latency and failures
/// - Background refresh outcomes
pub mod metrics;

/// Background task offloading for stale-while-revalidate.
///
/// Stale entries are served immediately while fresh data is fetched in the
/// background. This module provides the [`OffloadManager`](offload::OffloadManager)
/// that keeps at most one such task per key.
pub mod offload;

/// Bounded cache lookups.
pub mod reader;

/// Background refresh of stale entries.
pub mod revalidate;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use engine::{CacheEngine, CacheEngineBuilder, CacheResponse, NotSet};
pub use error::{CacheError, ConfigError, ExecuteError, RefreshError};
pub use reader::Lookup;
pub use revalidate::Revalidator;

pub use stalebox_core::{
    BoxError, CacheControl, CacheKey, CacheKeyBuilder, CacheObserver, CacheState, CacheStatus,
    CacheableRequest, CachedEntry, HttpResponse, NoopObserver, Raw, Refresh, RefreshFuture,
    StorageDecision, TracingObserver, Upstream,
};

/// The `stalebox` prelude.
///
/// Provides convenient access to the most commonly used types:
///
/// ```rust
/// use stalebox::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CacheConfig, CacheEngine, CacheError, CacheStatus, CacheableRequest, ExecuteError,
        HttpResponse, Upstream,
    };
}
