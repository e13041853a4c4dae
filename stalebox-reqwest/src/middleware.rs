//! Cache middleware for reqwest-middleware.

use async_trait::async_trait;
use http::Extensions;
use http::header::{HeaderName, HeaderValue};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use stalebox::{
    CacheConfig, CacheEngine, CacheEngineBuilder, CacheKeyBuilder, CacheObserver, CacheStatus,
    ConfigError, ExecuteError, NotSet, Refresh,
};
use stalebox_backend::CacheBackend;
use stalebox_core::CacheableRequest;
use tracing::debug;

use crate::upstream::{ReqwestUpstream, into_reqwest};

/// Default header reporting the cache status of a response.
pub const DEFAULT_CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

/// Cache middleware for reqwest-middleware.
///
/// Answers requests from the cache when possible and stores origin responses
/// according to their `cache-control` header. Every response leaves the
/// middleware with a cache status header (`HIT`, `STALE` or `MISS`).
///
/// # Type Parameters
///
/// * `B` - Cache backend (e.g., `MokaBackend`)
pub struct CacheMiddleware<B> {
    engine: CacheEngine<B>,
    status_header: HeaderName,
}

impl<B> CacheMiddleware<B> {
    /// Create a new cache middleware around `engine`.
    pub fn new(engine: CacheEngine<B>) -> Self {
        Self {
            engine,
            status_header: DEFAULT_CACHE_STATUS_HEADER,
        }
    }

    /// The engine serving this middleware.
    pub fn engine(&self) -> &CacheEngine<B> {
        &self.engine
    }
}

impl CacheMiddleware<NotSet> {
    /// Creates a new [`CacheMiddlewareBuilder`].
    pub fn builder() -> CacheMiddlewareBuilder<NotSet> {
        CacheMiddlewareBuilder::new()
    }
}

impl<B> Clone for CacheMiddleware<B> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            status_header: self.status_header.clone(),
        }
    }
}

fn status_value(status: CacheStatus) -> HeaderValue {
    match status {
        CacheStatus::Hit => HeaderValue::from_static("HIT"),
        CacheStatus::Miss => HeaderValue::from_static("MISS"),
        CacheStatus::Stale => HeaderValue::from_static("STALE"),
    }
}

#[async_trait]
impl<B> Middleware for CacheMiddleware<B>
where
    B: CacheBackend + 'static,
{
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let request_url = req.url().clone();
        let cacheable = CacheableRequest::new(req.method().clone(), request_url.clone())
            .with_headers(req.headers().clone());
        let upstream = ReqwestUpstream::new(next, extensions.clone(), req);

        let resolved = match self.engine.execute(cacheable, upstream).await {
            Ok(resolved) => resolved,
            Err(ExecuteError::Cache(error)) => {
                return Err(reqwest_middleware::Error::Middleware(error.into()));
            }
            Err(ExecuteError::Upstream(error)) => return Err(error),
        };
        debug!(
            status = resolved.status.as_str(),
            cached = resolved.status.is_cached(),
            "cache middleware resolved request"
        );

        let mut response = resolved.response;
        response
            .headers_mut()
            .insert(self.status_header.clone(), status_value(resolved.status));
        into_reqwest(response, &request_url)
    }
}

/// Builder for [`CacheMiddleware`].
///
/// Mirrors [`CacheEngineBuilder`]; the backend is mandatory.
pub struct CacheMiddlewareBuilder<B> {
    engine: CacheEngineBuilder<B>,
    status_header: HeaderName,
}

impl CacheMiddlewareBuilder<NotSet> {
    /// Creates a new builder with no backend set.
    pub fn new() -> Self {
        Self {
            engine: CacheEngineBuilder::new(),
            status_header: DEFAULT_CACHE_STATUS_HEADER,
        }
    }
}

impl Default for CacheMiddlewareBuilder<NotSet> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> CacheMiddlewareBuilder<B> {
    /// Sets the storage backend.
    pub fn backend<NB: CacheBackend>(self, backend: NB) -> CacheMiddlewareBuilder<NB> {
        CacheMiddlewareBuilder {
            engine: self.engine.backend(backend),
            status_header: self.status_header,
        }
    }

    /// Sets the cache configuration.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.engine = self.engine.config(config);
        self
    }

    /// Sets the callback used by background refreshes.
    pub fn refresh<R>(mut self, refresh: R) -> Self
    where
        R: Refresh + 'static,
    {
        self.engine = self.engine.refresh(refresh);
        self
    }

    /// Sets the observer notified of hits and misses.
    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: CacheObserver + 'static,
    {
        self.engine = self.engine.observer(observer);
        self
    }

    /// Sets how cache keys are derived.
    pub fn key_builder(mut self, key_builder: CacheKeyBuilder) -> Self {
        self.engine = self.engine.key_builder(key_builder);
        self
    }

    /// Sets the header carrying the cache status.
    ///
    /// # Default
    ///
    /// [`DEFAULT_CACHE_STATUS_HEADER`] (`x-cache-status`)
    pub fn status_header(mut self, name: HeaderName) -> Self {
        self.status_header = name;
        self
    }
}

impl<B> CacheMiddlewareBuilder<B>
where
    B: CacheBackend + 'static,
{
    /// Builds the middleware.
    ///
    /// Fails with [`ConfigError::MissingRefresh`] when stale-while-revalidate
    /// is enabled without a refresh callback.
    pub fn build(self) -> std::result::Result<CacheMiddleware<B>, ConfigError> {
        Ok(CacheMiddleware {
            engine: self.engine.build()?,
            status_header: self.status_header,
        })
    }
}
