//! Cached entries with revalidation metadata.
//!
//! A [`CachedEntry`] is a stored [`HttpResponse`] plus an optional
//! revalidation instant. Entries without one are fresh until the store
//! expires them. Entries with one are fresh until that instant and *stale*
//! afterwards: still served, but a background refresh is due.
//!
//! Expiry itself is the store's business, so there is no "expired" state
//! here: an expired entry is simply not returned by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::response::HttpResponse;

/// A cached response with its revalidation instant.
///
/// # Example
///
/// ```
/// use chrono::{TimeDelta, Utc};
/// use http::StatusCode;
/// use stalebox_core::{CachedEntry, HttpResponse};
///
/// let now = Utc::now();
/// let entry = CachedEntry::new(
///     HttpResponse::new(StatusCode::OK, "body"),
///     Some(now + TimeDelta::seconds(60)),
/// );
///
/// assert!(!entry.is_stale_at(now));
/// assert!(entry.is_stale_at(now + TimeDelta::seconds(60)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEntry {
    response: HttpResponse,
    revalidate: Option<DateTime<Utc>>,
}

impl CachedEntry {
    /// Creates an entry. `revalidate` is only set when stale-while-revalidate
    /// applies to the response.
    pub fn new(response: HttpResponse, revalidate: Option<DateTime<Utc>>) -> Self {
        Self {
            response,
            revalidate,
        }
    }

    /// The cached response.
    #[inline]
    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    /// Instant after which the entry is stale.
    #[inline]
    pub fn revalidate(&self) -> Option<DateTime<Utc>> {
        self.revalidate
    }

    /// Whether the entry is stale at `now`.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        self.revalidate.is_some_and(|at| at <= now)
    }

    /// Classifies the entry against the current time.
    pub fn cache_state(self) -> CacheState<Self> {
        if self.is_stale_at(Utc::now()) {
            CacheState::Stale(self)
        } else {
            CacheState::Actual(self)
        }
    }

    /// Consumes the entry and returns the cached response.
    pub fn into_response(self) -> HttpResponse {
        self.response
    }
}

/// Freshness of a value read from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState<T> {
    /// The value is fresh.
    Actual(T),
    /// The value is past its revalidation instant but still servable.
    Stale(T),
}
