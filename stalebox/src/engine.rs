//! Request orchestration.
//!
//! [`CacheEngine::execute`] resolves one request against the cache:
//!
//! ```text
//! lookup ──► Hit ──► fresh? ──yes──► serve (Hit)
//!   │                  │
//!   │                  no ──► serve (Stale) + spawn refresh (at most one per key)
//!   │
//!   └──► Miss ──► origin ──► 2xx + max-age? ──► store
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use stalebox_backend::CacheBackend;
use stalebox_core::{
    CacheKey, CacheKeyBuilder, CacheObserver, CacheState, CacheStatus, CacheableRequest,
    CachedEntry, HttpResponse, NoopObserver, Refresh, StorageDecision, Upstream,
};
use tracing::{Instrument, debug, info_span, warn};

#[cfg(feature = "metrics")]
use std::time::Instant;

use crate::config::CacheConfig;
use crate::error::{ConfigError, ExecuteError};
use crate::offload::OffloadManager;
use crate::reader::{Lookup, lookup};
use crate::revalidate::Revalidator;

#[cfg(feature = "metrics")]
use crate::metrics::{
    CACHE_HIT_COUNTER, CACHE_LOOKUP_DURATION, CACHE_MISS_COUNTER, CACHE_STALE_COUNTER, name_label,
};

/// Marker type for builder fields that haven't been set yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotSet;

/// A resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheResponse {
    /// The response served to the caller.
    pub response: HttpResponse,
    /// Where the response came from.
    pub status: CacheStatus,
}

/// Caching engine bound to one backend.
///
/// Cheap to clone; clones share the backend, the observer and the set of
/// in-flight refreshes.
pub struct CacheEngine<B> {
    backend: Arc<B>,
    config: CacheConfig,
    key_builder: CacheKeyBuilder,
    observer: Arc<dyn CacheObserver>,
    revalidator: Option<Revalidator<B>>,
}

impl<B> Clone for CacheEngine<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            config: self.config.clone(),
            key_builder: self.key_builder.clone(),
            observer: self.observer.clone(),
            revalidator: self.revalidator.clone(),
        }
    }
}

impl<B> fmt::Debug for CacheEngine<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEngine")
            .field("config", &self.config)
            .field("key_builder", &self.key_builder)
            .field("revalidator", &self.revalidator)
            .finish_non_exhaustive()
    }
}

impl CacheEngine<NotSet> {
    /// Creates a new [`CacheEngineBuilder`].
    pub fn builder() -> CacheEngineBuilder<NotSet> {
        CacheEngineBuilder::new()
    }
}

impl<B> CacheEngine<B>
where
    B: CacheBackend + 'static,
{
    /// Configuration of this engine.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The backend entries are stored in.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Key derivation used for every request.
    pub fn key_builder(&self) -> &CacheKeyBuilder {
        &self.key_builder
    }

    /// Cache key of `request`.
    pub fn cache_key(&self, request: &CacheableRequest) -> CacheKey {
        request.cache_key(&self.key_builder)
    }

    /// In-flight background refreshes, `None` when stale-while-revalidate is off.
    pub fn offload(&self) -> Option<&OffloadManager> {
        self.revalidator.as_ref().map(Revalidator::offload)
    }

    /// Whether a background refresh for `key` is running.
    pub fn is_refreshing(&self, key: &CacheKey) -> bool {
        self.offload()
            .is_some_and(|offload| offload.is_in_flight(key))
    }

    /// Resolves `request`, calling `upstream` only on a miss.
    ///
    /// Errors are [`ExecuteError::Cache`] when the lookup failed and
    /// `ignore_cache_errors` is off (the origin was not contacted), or
    /// [`ExecuteError::Upstream`] with the origin's own error. Failing to
    /// store a fresh origin response never fails the request.
    pub async fn execute<U, E>(
        &self,
        request: CacheableRequest,
        upstream: U,
    ) -> Result<CacheResponse, ExecuteError<E>>
    where
        U: Upstream<CacheableRequest, Response = Result<HttpResponse, E>> + Send,
    {
        let key = self.cache_key(&request);
        let span = info_span!(
            "stalebox.execute",
            key = %key,
            method = %request.method(),
            status = tracing::field::Empty,
        );
        self.resolve(key, request, upstream)
            .instrument(span)
            .await
    }

    async fn resolve<U, E>(
        &self,
        key: CacheKey,
        request: CacheableRequest,
        mut upstream: U,
    ) -> Result<CacheResponse, ExecuteError<E>>
    where
        U: Upstream<CacheableRequest, Response = Result<HttpResponse, E>> + Send,
    {
        let name = self.config.name.as_deref();

        #[cfg(feature = "metrics")]
        let started = Instant::now();
        let found = lookup(self.backend.as_ref(), &key, &self.config).await;
        #[cfg(feature = "metrics")]
        metrics::histogram!(*CACHE_LOOKUP_DURATION, "name" => name_label(&self.config))
            .record(started.elapsed().as_secs_f64());

        match found? {
            Lookup::Hit(entry) => {
                self.observer.on_hit(&key, name);
                let (status, entry) = self.serve_cached(&key, &request, entry);
                tracing::Span::current().record("status", status.as_str());
                Ok(CacheResponse {
                    response: entry.into_response(),
                    status,
                })
            }
            Lookup::Miss => {
                self.observer.on_miss(&key, name);
                tracing::Span::current().record("status", CacheStatus::Miss.as_str());
                #[cfg(feature = "metrics")]
                metrics::counter!(*CACHE_MISS_COUNTER, "name" => name_label(&self.config))
                    .increment(1);

                let response = upstream
                    .call(request.clone())
                    .await
                    .map_err(ExecuteError::Upstream)?;
                self.store(&key, &request, &response).await;
                Ok(CacheResponse {
                    response,
                    status: CacheStatus::Miss,
                })
            }
        }
    }

    /// Classifies a cached entry and kicks off its refresh when it is stale.
    fn serve_cached(
        &self,
        key: &CacheKey,
        request: &CacheableRequest,
        entry: CachedEntry,
    ) -> (CacheStatus, CachedEntry) {
        match entry.cache_state() {
            CacheState::Actual(entry) => {
                debug!("serving fresh entry");
                #[cfg(feature = "metrics")]
                metrics::counter!(*CACHE_HIT_COUNTER, "name" => name_label(&self.config))
                    .increment(1);
                (CacheStatus::Hit, entry)
            }
            CacheState::Stale(entry) => {
                #[cfg(feature = "metrics")]
                metrics::counter!(*CACHE_STALE_COUNTER, "name" => name_label(&self.config))
                    .increment(1);
                let spawned = self
                    .revalidator
                    .as_ref()
                    .is_some_and(|revalidator| revalidator.maybe_revalidate(key, request, &entry));
                debug!(refresh_spawned = spawned, "serving stale entry");
                (CacheStatus::Stale, entry)
            }
        }
    }

    /// Stores an origin response if its status and `cache-control` allow it.
    async fn store(&self, key: &CacheKey, request: &CacheableRequest, response: &HttpResponse) {
        if !response.is_success() {
            debug!(status = %response.status(), "origin response not stored: non-success status");
            return;
        }

        let policy = response.cache_control();
        let Some(decision) = StorageDecision::compute(
            &policy,
            request.method(),
            self.config.stale_while_revalidate,
            Utc::now(),
        ) else {
            debug!("origin response not stored: no max-age");
            return;
        };

        let entry = CachedEntry::new(response.clone(), decision.revalidate_at());
        match self.backend.set(key, &entry, decision.ttl()).await {
            Ok(()) => debug!(
                ttl_ms = decision.ttl_millis() as u64,
                revalidate_at = ?decision.revalidate_at(),
                "stored origin response"
            ),
            Err(error) => warn!(%error, "failed to store origin response"),
        }
    }
}

/// Builder for [`CacheEngine`].
///
/// The backend is mandatory; everything else has a default:
/// [`CacheConfig::default`], [`NoopObserver`] and the default
/// [`CacheKeyBuilder`]. A refresh callback is required only when
/// `stale_while_revalidate` is enabled.
pub struct CacheEngineBuilder<B> {
    backend: B,
    config: CacheConfig,
    key_builder: CacheKeyBuilder,
    observer: Arc<dyn CacheObserver>,
    refresh: Option<Arc<dyn Refresh>>,
    offload: Option<OffloadManager>,
}

impl CacheEngineBuilder<NotSet> {
    /// Creates a new builder with no backend set.
    pub fn new() -> Self {
        Self {
            backend: NotSet,
            config: CacheConfig::default(),
            key_builder: CacheKeyBuilder::default(),
            observer: Arc::new(NoopObserver),
            refresh: None,
            offload: None,
        }
    }
}

impl Default for CacheEngineBuilder<NotSet> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> CacheEngineBuilder<B> {
    /// Sets the storage backend.
    pub fn backend<NB: CacheBackend>(self, backend: NB) -> CacheEngineBuilder<NB> {
        CacheEngineBuilder {
            backend,
            config: self.config,
            key_builder: self.key_builder,
            observer: self.observer,
            refresh: self.refresh,
            offload: self.offload,
        }
    }

    /// Sets the engine configuration.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the callback used by background refreshes.
    pub fn refresh<R>(mut self, refresh: R) -> Self
    where
        R: Refresh + 'static,
    {
        self.refresh = Some(Arc::new(refresh));
        self
    }

    /// Sets the observer notified of hits and misses.
    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: CacheObserver + 'static,
    {
        self.observer = Arc::new(observer);
        self
    }

    /// Sets how cache keys are derived.
    pub fn key_builder(mut self, key_builder: CacheKeyBuilder) -> Self {
        self.key_builder = key_builder;
        self
    }

    /// Shorthand for a [`CacheKeyBuilder`] with a custom namespace.
    pub fn namespace(self, namespace: &str) -> Self {
        self.key_builder(CacheKeyBuilder::with_namespace(namespace))
    }

    /// Shares an [`OffloadManager`] with other engines, so refreshes of the
    /// same key are deduplicated across them.
    pub fn offload_manager(mut self, manager: OffloadManager) -> Self {
        self.offload = Some(manager);
        self
    }
}

impl<B> CacheEngineBuilder<B>
where
    B: CacheBackend + 'static,
{
    /// Builds the engine.
    ///
    /// Fails with [`ConfigError::MissingRefresh`] when stale-while-revalidate
    /// is enabled without a refresh callback.
    pub fn build(self) -> Result<CacheEngine<B>, ConfigError> {
        let backend = Arc::new(self.backend);

        let revalidator = if self.config.stale_while_revalidate {
            let refresh = self.refresh.ok_or(ConfigError::MissingRefresh)?;
            Some(Revalidator::new(
                backend.clone(),
                refresh,
                self.offload.unwrap_or_default(),
                self.config.refresh_timeout,
            ))
        } else {
            None
        };

        Ok(CacheEngine {
            backend,
            config: self.config,
            key_builder: self.key_builder,
            observer: self.observer,
            revalidator,
        })
    }
}
