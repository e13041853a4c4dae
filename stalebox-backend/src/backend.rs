use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use stalebox_core::{CacheKey, CachedEntry, Raw};
use tracing::trace;

use crate::{
    BackendError, DeleteStatus,
    format::{Format, JsonFormat},
};

pub type BackendResult<T> = Result<T, BackendError>;

/// Raw cache store operations.
///
/// A store keeps opaque bytes under a [`CacheKey`] and drops them once the
/// TTL given to [`write`](Backend::write) has elapsed. It is expected to be
/// safe for concurrent use; no transactional guarantees are required across
/// calls.
#[async_trait]
pub trait Backend: Sync + Send {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>>;

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Duration) -> BackendResult<()>;

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus>;

    /// Returns the name of this backend, used in logs.
    fn name(&self) -> &str {
        "backend"
    }

    fn value_format(&self) -> &dyn Format {
        &JsonFormat
    }
}

#[async_trait]
impl Backend for &dyn Backend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>> {
        (*self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Duration) -> BackendResult<()> {
        (*self).write(key, value, ttl).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (*self).remove(key).await
    }

    fn name(&self) -> &str {
        (*self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (*self).value_format()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Duration) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + Send + 'static> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Duration) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

/// Typed cache store operations on [`CachedEntry`] values.
///
/// These are the `get` / `set` / `delete` operations the caching engine
/// issues. Values are encoded with the backend's
/// [`value_format`](Backend::value_format).
pub trait CacheBackend: Backend {
    fn get(
        &self,
        key: &CacheKey,
    ) -> impl Future<Output = BackendResult<Option<CachedEntry>>> + Send {
        async move {
            match self.read(key).await? {
                Some(raw) => {
                    let entry = self.value_format().deserialize(&raw)?;
                    trace!(backend = self.name(), key = %key, bytes = raw.len(), "read entry");
                    Ok(Some(entry))
                }
                None => Ok(None),
            }
        }
    }

    fn set(
        &self,
        key: &CacheKey,
        entry: &CachedEntry,
        ttl: Duration,
    ) -> impl Future<Output = BackendResult<()>> + Send {
        async move {
            let raw = self.value_format().serialize(entry)?;
            trace!(backend = self.name(), key = %key, bytes = raw.len(), ttl_ms = ttl.as_millis() as u64, "write entry");
            self.write(key, raw, ttl).await
        }
    }

    fn delete(&self, key: &CacheKey) -> impl Future<Output = BackendResult<DeleteStatus>> + Send {
        async move { self.remove(key).await }
    }
}

// Explicit CacheBackend implementations for trait objects
// These use the default implementations from the trait
impl CacheBackend for &dyn Backend {}

impl CacheBackend for Box<dyn Backend> {}

impl CacheBackend for Arc<dyn Backend + Send + 'static> {}
