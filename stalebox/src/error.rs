//! Error types for cache operations.

use std::time::Duration;

use http::StatusCode;
use stalebox_backend::BackendError;
use stalebox_core::BoxError;
use thiserror::Error;

/// Cache-layer failure of a request.
///
/// Only lookups can fail a request. Whether they do is controlled by
/// [`CacheConfig::ignore_cache_errors`](crate::CacheConfig::ignore_cache_errors).
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache lookup did not finish within the configured timeout.
    #[error("cache lookup timed out after {}ms", .0.as_millis())]
    LookupTimeout(Duration),

    /// The cache store failed the lookup.
    #[error("cache lookup failed: {0}")]
    Lookup(#[source] BackendError),
}

/// Error returned by [`CacheEngine::execute`](crate::CacheEngine::execute).
#[derive(Debug, Error)]
pub enum ExecuteError<E> {
    /// The cache layer failed and the origin was not contacted.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The origin call failed; passed through unchanged.
    #[error(transparent)]
    Upstream(E),
}

/// Invalid engine configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `stale_while_revalidate` needs a refresh callback.
    #[error("stale_while_revalidate is enabled but no refresh callback was configured")]
    MissingRefresh,
}

/// Why a background refresh failed. Never surfaced to callers, only logged.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The refresh callback returned an error.
    #[error("refresh callback failed: {0}")]
    Callback(BoxError),

    /// The refresh did not finish within `refresh_timeout`.
    #[error("refresh timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The origin answered with a non-success status.
    #[error("refresh returned status {0}")]
    Status(StatusCode),

    /// The refreshed entry could not be written.
    #[error("failed to store refreshed entry: {0}")]
    Store(#[source] BackendError),
}
