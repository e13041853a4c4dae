//! Simple in-memory test backend implementation using DashMap.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use stalebox_backend::{
    Backend, BackendError, BackendResult, CacheBackend, DeleteStatus, Format, JsonFormat,
};
use stalebox_core::{CacheKey, Raw};

/// In-memory backend for testing that remembers the TTL of every write.
#[derive(Clone)]
pub struct TestBackend<F = JsonFormat> {
    store: Arc<DashMap<CacheKey, (Raw, Duration)>>,
    format: F,
}

impl TestBackend<JsonFormat> {
    pub fn new() -> Self {
        Self::with_format(JsonFormat)
    }
}

impl<F: Format> TestBackend<F> {
    pub fn with_format(format: F) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            format,
        }
    }

    pub fn ttl(&self, key: &CacheKey) -> Option<Duration> {
        self.store.get(key).map(|v| v.1)
    }
}

#[async_trait]
impl<F: Format> Backend for TestBackend<F> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>> {
        Ok(self.store.get(key).map(|v| v.0.clone()))
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Duration) -> BackendResult<()> {
        self.store.insert(key.clone(), (value, ttl));
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        Ok(match self.store.remove(key) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    fn value_format(&self) -> &dyn Format {
        &self.format
    }

    fn name(&self) -> &str {
        "test"
    }
}

impl<F: Format> CacheBackend for TestBackend<F> {}

/// Backend that always returns errors (for error testing).
#[derive(Clone, Default)]
pub struct ErrorBackend;

#[async_trait]
impl Backend for ErrorBackend {
    async fn read(&self, _key: &CacheKey) -> BackendResult<Option<Raw>> {
        Err(BackendError::InternalError(Box::new(
            std::io::Error::other("simulated error"),
        )))
    }

    async fn write(&self, _key: &CacheKey, _value: Raw, _ttl: Duration) -> BackendResult<()> {
        Err(BackendError::InternalError(Box::new(
            std::io::Error::other("simulated error"),
        )))
    }

    async fn remove(&self, _key: &CacheKey) -> BackendResult<DeleteStatus> {
        Err(BackendError::InternalError(Box::new(
            std::io::Error::other("simulated error"),
        )))
    }

    fn name(&self) -> &str {
        "error"
    }
}

impl CacheBackend for ErrorBackend {}
