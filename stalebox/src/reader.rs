//! Bounded cache lookups.
//!
//! A lookup is a single `get` on the store, optionally raced against a
//! deadline. When the deadline wins, the pending store call is dropped: the
//! caller never waits past the deadline and a late result can't leak into
//! an outcome that was already decided.

use stalebox_backend::CacheBackend;
use stalebox_core::{CacheKey, CachedEntry};
use tracing::warn;

use crate::config::CacheConfig;
use crate::error::CacheError;

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// An entry was found.
    Hit(CachedEntry),
    /// Nothing usable was found, or the failure was ignored.
    Miss,
}

/// Reads `key` from `backend` honoring `timeout` and `ignore_cache_errors`.
pub async fn lookup<B>(
    backend: &B,
    key: &CacheKey,
    config: &CacheConfig,
) -> Result<Lookup, CacheError>
where
    B: CacheBackend,
{
    let read = backend.get(key);
    let result = match config.timeout {
        Some(limit) => match tokio::time::timeout(limit, read).await {
            Ok(result) => result.map_err(CacheError::Lookup),
            Err(_) => Err(CacheError::LookupTimeout(limit)),
        },
        None => read.await.map_err(CacheError::Lookup),
    };

    match result {
        Ok(Some(entry)) => Ok(Lookup::Hit(entry)),
        Ok(None) => Ok(Lookup::Miss),
        Err(error) if config.ignore_cache_errors => {
            warn!(key = %key, %error, "ignoring cache lookup failure");
            #[cfg(feature = "metrics")]
            record_failure(&error, config);
            Ok(Lookup::Miss)
        }
        Err(error) => {
            #[cfg(feature = "metrics")]
            record_failure(&error, config);
            Err(error)
        }
    }
}

#[cfg(feature = "metrics")]
fn record_failure(error: &CacheError, config: &CacheConfig) {
    let kind = match error {
        CacheError::LookupTimeout(_) => "timeout",
        CacheError::Lookup(_) => "error",
    };
    metrics::counter!(
        *crate::metrics::CACHE_LOOKUP_FAILURES,
        "kind" => kind,
        "name" => crate::metrics::name_label(config)
    )
    .increment(1);
}
