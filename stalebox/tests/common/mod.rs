//! Shared fixtures: in-memory backends, canned origins and a recording observer.
#![allow(dead_code)]

use std::future::Ready;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use http::header::{CACHE_CONTROL, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use stalebox::backend::{Backend, BackendError, BackendResult, CacheBackend, DeleteStatus};
use stalebox::{CacheKey, CacheObserver, CacheableRequest, HttpResponse, Raw, Upstream};
use url::Url;

/// In-memory backend that remembers the TTL of every write.
#[derive(Clone, Default)]
pub struct TestBackend {
    store: Arc<DashMap<CacheKey, (Raw, Duration)>>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(&self, key: &CacheKey) -> Option<Duration> {
        self.store.get(key).map(|v| v.1)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.store.contains_key(key)
    }
}

#[async_trait]
impl Backend for TestBackend {
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

    fn name(&self) -> &str {
        "test"
    }
}

impl CacheBackend for TestBackend {}

fn simulated() -> BackendError {
    BackendError::InternalError(Box::new(std::io::Error::other("simulated error")))
}

/// Backend that always returns errors.
#[derive(Clone, Default)]
pub struct ErrorBackend;

#[async_trait]
impl Backend for ErrorBackend {
    async fn read(&self, _key: &CacheKey) -> BackendResult<Option<Raw>> {
        Err(simulated())
    }

    async fn write(&self, _key: &CacheKey, _value: Raw, _ttl: Duration) -> BackendResult<()> {
        Err(simulated())
    }

    async fn remove(&self, _key: &CacheKey) -> BackendResult<DeleteStatus> {
        Err(simulated())
    }

    fn name(&self) -> &str {
        "error"
    }
}

impl CacheBackend for ErrorBackend {}

/// Backend whose reads never complete.
#[derive(Clone, Default)]
pub struct PendingBackend;

#[async_trait]
impl Backend for PendingBackend {
    async fn read(&self, _key: &CacheKey) -> BackendResult<Option<Raw>> {
        futures::future::pending().await
    }

    async fn write(&self, _key: &CacheKey, _value: Raw, _ttl: Duration) -> BackendResult<()> {
        Ok(())
    }

    async fn remove(&self, _key: &CacheKey) -> BackendResult<DeleteStatus> {
        Ok(DeleteStatus::Missing)
    }

    fn name(&self) -> &str {
        "pending"
    }
}

impl CacheBackend for PendingBackend {}

/// Origin answering every call with the same response and counting calls.
#[derive(Clone)]
pub struct CountingUpstream {
    response: HttpResponse,
    calls: Arc<AtomicUsize>,
}

impl CountingUpstream {
    pub fn new(response: HttpResponse) -> Self {
        Self {
            response,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Upstream<CacheableRequest> for CountingUpstream {
    type Response = Result<HttpResponse, std::io::Error>;
    type Future = Ready<Self::Response>;

    fn call(&mut self, _req: CacheableRequest) -> Self::Future {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(Ok(self.response.clone()))
    }
}

/// Origin that always fails.
#[derive(Clone, Default)]
pub struct FailingUpstream;

impl Upstream<CacheableRequest> for FailingUpstream {
    type Response = Result<HttpResponse, std::io::Error>;
    type Future = Ready<Self::Response>;

    fn call(&mut self, _req: CacheableRequest) -> Self::Future {
        std::future::ready(Err(std::io::Error::other("connection refused")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Hit(String, Option<String>),
    Miss(String, Option<String>),
}

/// Observer collecting every notification.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl CacheObserver for RecordingObserver {
    fn on_hit(&self, key: &CacheKey, name: Option<&str>) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Hit(key.to_string(), name.map(str::to_owned)));
    }

    fn on_miss(&self, key: &CacheKey, name: Option<&str>) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Miss(key.to_string(), name.map(str::to_owned)));
    }
}

pub fn response(status: StatusCode, body: &'static str, cache_control: Option<&'static str>) -> HttpResponse {
    let mut headers = HeaderMap::new();
    if let Some(value) = cache_control {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(value));
    }
    HttpResponse::new(status, body).with_headers(headers)
}

pub fn ok(body: &'static str, cache_control: &'static str) -> HttpResponse {
    response(StatusCode::OK, body, Some(cache_control))
}

pub fn request(method: Method, url: &str) -> CacheableRequest {
    CacheableRequest::new(method, Url::parse(url).unwrap())
}

pub fn get(url: &str) -> CacheableRequest {
    request(Method::GET, url)
}
