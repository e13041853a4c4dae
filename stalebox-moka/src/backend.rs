//! Moka backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use smol_str::SmolStr;
use stalebox_backend::format::{Format, JsonFormat};
use stalebox_backend::{Backend, BackendResult, CacheBackend, DeleteStatus};
use stalebox_core::{CacheKey, Raw};
use tracing::trace;

use crate::builder::{MokaBackendBuilder, NoCapacity};
use crate::metrics::record_capacity;

/// Serialized entry together with the TTL it was written with.
#[derive(Clone, Debug)]
pub struct StoredValue {
    data: Raw,
    ttl: Duration,
}

impl StoredValue {
    pub(crate) fn new(data: Raw, ttl: Duration) -> Self {
        Self { data, ttl }
    }

    /// Serialized entry.
    pub fn data(&self) -> &Raw {
        &self.data
    }

    /// TTL the entry was written with.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Approximate memory footprint of `key` and this value.
    pub(crate) fn memory_size(&self, key: &CacheKey) -> usize {
        std::mem::size_of::<CacheKey>()
            + key.segment().len()
            + key.id().len()
            + std::mem::size_of::<Self>()
            + self.data.len()
    }
}

/// In-memory cache backend powered by Moka.
///
/// Each entry expires after the TTL passed to [`Backend::write`]. Overwriting
/// a key restarts its expiration with the new TTL.
///
/// # Type Parameters
///
/// * `S` - Serialization format for cache values. Implements [`Format`].
///   Default: [`JsonFormat`].
///
/// # Examples
///
/// ```
/// use stalebox_moka::MokaBackend;
/// use stalebox_backend::format::BincodeFormat;
///
/// let backend = MokaBackend::builder()
///     .max_entries(10_000)
///     .value_format(BincodeFormat)
///     .build();
/// ```
///
/// # Caveats
///
/// - Data is **not persisted** and **not shared** across processes
/// - Expiration is **best-effort**: Moka evicts expired entries lazily, but
///   never returns them from reads
#[derive(Clone)]
pub struct MokaBackend<S = JsonFormat>
where
    S: Format,
{
    pub(crate) cache: Cache<CacheKey, StoredValue>,
    pub(crate) serializer: S,
    pub(crate) name: SmolStr,
}

impl<S> std::fmt::Debug for MokaBackend<S>
where
    S: Format,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("name", &self.name)
            .field("cache", &self.cache)
            .field("serializer", &std::any::type_name::<S>())
            .finish()
    }
}

impl MokaBackend<JsonFormat> {
    /// Creates a new builder for `MokaBackend`.
    ///
    /// Capacity must be configured with
    /// [`max_entries`](MokaBackendBuilder::max_entries) or
    /// [`max_bytes`](MokaBackendBuilder::max_bytes) before building.
    pub fn builder() -> MokaBackendBuilder<NoCapacity, JsonFormat> {
        MokaBackendBuilder::new()
    }
}

impl<S> MokaBackend<S>
where
    S: Format,
{
    /// The underlying Moka cache.
    pub fn cache(&self) -> &Cache<CacheKey, StoredValue> {
        &self.cache
    }

    /// Number of entries, including expired ones not yet evicted.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl<S> Backend for MokaBackend<S>
where
    S: Format + Send + Sync,
{
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>> {
        Ok(self.cache.get(key).await.map(|value| value.data))
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Duration) -> BackendResult<()> {
        trace!(key = %key, ttl_ms = ttl.as_millis() as u64, "moka insert");
        self.cache
            .insert(key.clone(), StoredValue::new(value, ttl))
            .await;
        record_capacity(
            &self.name,
            self.cache.entry_count(),
            self.cache.weighted_size(),
        );
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        match self.cache.remove(key).await {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn value_format(&self) -> &dyn Format {
        &self.serializer
    }
}

impl<S> CacheBackend for MokaBackend<S> where S: Format + Send + Sync {}
