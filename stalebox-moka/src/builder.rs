//! Builder for configuring [`MokaBackend`].

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use smol_str::SmolStr;
use stalebox_backend::format::{Format, JsonFormat};
use stalebox_core::CacheKey;

use crate::backend::{MokaBackend, StoredValue};

/// Expires every entry after the TTL it was written with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Expiration;

impl Expiry<CacheKey, StoredValue> for Expiration {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl())
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // The default keeps the old deadline; a refreshed entry must get its own.
        Some(value.ttl())
    }
}

/// Marker type: capacity has not been configured yet.
///
/// Call [`max_entries()`](MokaBackendBuilder::max_entries) or
/// [`max_bytes()`](MokaBackendBuilder::max_bytes) before `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`MokaBackend`].
///
/// Use [`MokaBackend::builder`] to create a new builder instance. `build()`
/// only exists once a capacity is set, and only one kind of capacity can be
/// set.
///
/// # Examples
///
/// ```
/// use stalebox_moka::MokaBackend;
///
/// // 100 MB cache
/// let backend = MokaBackend::builder()
///     .max_bytes(100 * 1024 * 1024)
///     .name("responses")
///     .build();
/// ```
pub struct MokaBackendBuilder<Cap, S = JsonFormat>
where
    S: Format,
{
    capacity: Cap,
    serializer: S,
    name: SmolStr,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaBackendBuilder<NoCapacity, JsonFormat> {
    /// Creates a new builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            serializer: JsonFormat,
            name: SmolStr::new_static("moka"),
            eviction_policy: None,
        }
    }
}

impl Default for MokaBackendBuilder<NoCapacity, JsonFormat> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MokaBackendBuilder<NoCapacity, S>
where
    S: Format,
{
    /// Sets the maximum number of entries the cache can hold.
    pub fn max_entries(self, capacity: u64) -> MokaBackendBuilder<EntryCapacity, S> {
        MokaBackendBuilder {
            capacity: EntryCapacity(capacity),
            serializer: self.serializer,
            name: self.name,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Sets the approximate memory budget in bytes.
    ///
    /// Each entry is weighed as its serialized size plus the key and a fixed
    /// per-entry overhead.
    pub fn max_bytes(self, bytes: u64) -> MokaBackendBuilder<ByteCapacity, S> {
        MokaBackendBuilder {
            capacity: ByteCapacity(bytes),
            serializer: self.serializer,
            name: self.name,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl<Cap, S> MokaBackendBuilder<Cap, S>
where
    S: Format,
{
    /// Sets the backend name used in logs and metrics.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn name(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the eviction policy for the cache.
    ///
    /// # Default
    ///
    /// - **Entry-based capacity** ([`max_entries`]): [`EvictionPolicy::tiny_lfu()`]
    /// - **Byte-based capacity** ([`max_bytes`]): [`EvictionPolicy::lru()`], since
    ///   TinyLFU admission can reject a new entry even when eviction could make room
    ///
    /// [`max_entries`]: MokaBackendBuilder::max_entries
    /// [`max_bytes`]: MokaBackendBuilder::max_bytes
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Sets the cache value serialization format.
    ///
    /// | Format | Speed | Size | Human-readable |
    /// |--------|-------|------|----------------|
    /// | [`JsonFormat`] | Slow | Large | Yes |
    /// | [`BincodeFormat`](stalebox_backend::format::BincodeFormat) | Fast | Compact | No |
    pub fn value_format<NewS>(self, serializer: NewS) -> MokaBackendBuilder<Cap, NewS>
    where
        NewS: Format,
    {
        MokaBackendBuilder {
            capacity: self.capacity,
            serializer,
            name: self.name,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl<S> MokaBackendBuilder<EntryCapacity, S>
where
    S: Format,
{
    /// Builds the [`MokaBackend`] with entry-count based capacity.
    pub fn build(self) -> MokaBackend<S> {
        let policy = self
            .eviction_policy
            .unwrap_or_else(EvictionPolicy::tiny_lfu);
        let cache: Cache<CacheKey, StoredValue> = CacheBuilder::new(self.capacity.0)
            .name(&self.name)
            .eviction_policy(policy)
            .expire_after(Expiration)
            .build();

        MokaBackend {
            cache,
            serializer: self.serializer,
            name: self.name,
        }
    }
}

impl<S> MokaBackendBuilder<ByteCapacity, S>
where
    S: Format,
{
    /// Builds the [`MokaBackend`] with byte-based capacity.
    pub fn build(self) -> MokaBackend<S> {
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let cache: Cache<CacheKey, StoredValue> = CacheBuilder::new(self.capacity.0)
            .name(&self.name)
            .weigher(byte_weigher)
            .eviction_policy(policy)
            .expire_after(Expiration)
            .build();

        MokaBackend {
            cache,
            serializer: self.serializer,
            name: self.name,
        }
    }
}

fn byte_weigher(key: &CacheKey, value: &StoredValue) -> u32 {
    value.memory_size(key).min(u32::MAX as usize) as u32
}
