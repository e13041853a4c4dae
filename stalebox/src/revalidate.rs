//! Stale-while-revalidate background refresh.
//!
//! When a stale entry is served, [`Revalidator::maybe_revalidate`] starts a
//! detached refresh unless one is already running for the key. The refresh
//! either replaces the entry (success) or evicts it (any failure), so a key
//! never stays stale with nobody refreshing it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use stalebox_backend::{CacheBackend, DeleteStatus};
use stalebox_core::{
    CacheKey, CacheableRequest, CachedEntry, HttpResponse, Refresh, StorageDecision,
};
use tracing::{debug, warn};

use crate::error::RefreshError;
use crate::offload::OffloadManager;

#[cfg(feature = "metrics")]
use crate::metrics::{REFRESH_FAILED, REFRESH_SUCCEEDED};

/// Singleflight refresh coordinator.
pub struct Revalidator<B> {
    backend: Arc<B>,
    refresh: Arc<dyn Refresh>,
    offload: OffloadManager,
    timeout: Option<Duration>,
}

impl<B> Clone for Revalidator<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            refresh: self.refresh.clone(),
            offload: self.offload.clone(),
            timeout: self.timeout,
        }
    }
}

impl<B> std::fmt::Debug for Revalidator<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Revalidator")
            .field("offload", &self.offload)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<B> Revalidator<B>
where
    B: CacheBackend + 'static,
{
    /// Creates a coordinator refreshing entries of `backend` with `refresh`.
    pub fn new(
        backend: Arc<B>,
        refresh: Arc<dyn Refresh>,
        offload: OffloadManager,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            backend,
            refresh,
            offload,
            timeout,
        }
    }

    /// Ticket map of in-flight refreshes.
    pub fn offload(&self) -> &OffloadManager {
        &self.offload
    }

    /// Starts a background refresh of `entry` if it is due.
    ///
    /// A refresh is due when `request` is a safe read and `entry` is past its
    /// revalidation instant. Returns `true` only if this call spawned the
    /// refresh; `false` when it was not due or another one is in flight.
    /// Never waits for the refresh itself.
    pub fn maybe_revalidate(
        &self,
        key: &CacheKey,
        request: &CacheableRequest,
        entry: &CachedEntry,
    ) -> bool {
        if !request.is_safe_read() || !entry.is_stale_at(Utc::now()) {
            return false;
        }

        let task = revalidate(
            self.backend.clone(),
            self.refresh.clone(),
            self.timeout,
            key.clone(),
            request.clone(),
        );
        let spawned = self.offload.spawn_with_key(key.clone(), task);
        if spawned {
            debug!(key = %key, "background refresh started");
        }
        spawned
    }
}

async fn revalidate<B>(
    backend: Arc<B>,
    refresh: Arc<dyn Refresh>,
    timeout: Option<Duration>,
    key: CacheKey,
    request: CacheableRequest,
) where
    B: CacheBackend,
{
    let result = match fetch(refresh.as_ref(), request.clone(), timeout).await {
        Ok(response) => store(backend.as_ref(), &key, &request, response).await,
        Err(error) => Err(error),
    };

    match result {
        Ok(true) => {
            debug!(key = %key, "background refresh stored fresh entry");
            #[cfg(feature = "metrics")]
            metrics::counter!(*REFRESH_SUCCEEDED).increment(1);
        }
        Ok(false) => {
            debug!(key = %key, "refreshed response is not cacheable, evicting entry");
            #[cfg(feature = "metrics")]
            metrics::counter!(*REFRESH_FAILED).increment(1);
            evict(backend.as_ref(), &key).await;
        }
        Err(error) => {
            warn!(key = %key, %error, "background refresh failed, evicting stale entry");
            #[cfg(feature = "metrics")]
            metrics::counter!(*REFRESH_FAILED).increment(1);
            evict(backend.as_ref(), &key).await;
        }
    }
}

async fn fetch(
    refresh: &dyn Refresh,
    request: CacheableRequest,
    timeout: Option<Duration>,
) -> Result<HttpResponse, RefreshError> {
    let call = refresh.refresh(request);
    let response = match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| RefreshError::Timeout(limit))?,
        None => call.await,
    }
    .map_err(RefreshError::Callback)?;

    if !response.is_success() {
        return Err(RefreshError::Status(response.status()));
    }
    Ok(response)
}

/// Stores a refreshed response as if it were fetched for the first time.
///
/// Returns `Ok(false)` when the response no longer allows storage.
async fn store<B>(
    backend: &B,
    key: &CacheKey,
    request: &CacheableRequest,
    response: HttpResponse,
) -> Result<bool, RefreshError>
where
    B: CacheBackend,
{
    let policy = response.cache_control();
    let Some(decision) = StorageDecision::compute(&policy, request.method(), true, Utc::now())
    else {
        return Ok(false);
    };

    let entry = CachedEntry::new(response, decision.revalidate_at());
    backend
        .set(key, &entry, decision.ttl())
        .await
        .map_err(RefreshError::Store)?;
    Ok(true)
}

async fn evict<B>(backend: &B, key: &CacheKey)
where
    B: CacheBackend,
{
    match backend.delete(key).await {
        Ok(DeleteStatus::Deleted(_)) => debug!(key = %key, "evicted entry"),
        Ok(DeleteStatus::Missing) => debug!(key = %key, "entry already gone"),
        Err(error) => warn!(key = %key, %error, "failed to evict entry"),
    }
}
