//! Request view used for key derivation and background refreshes.

use http::{HeaderMap, Method};
use url::Url;

use crate::key::{CacheKey, CacheKeyBuilder};
use crate::policy::is_safe_read;

/// The parts of an outgoing request the cache cares about.
///
/// Carries no body. Only safe reads are revalidated, and the cache key is
/// derived from the URL alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheableRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
}

impl CacheableRequest {
    /// Creates a request view without headers.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Attaches the request headers, replayed by background refreshes.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute request URL with its resolved query string.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether this request may take part in stale-while-revalidate.
    pub fn is_safe_read(&self) -> bool {
        is_safe_read(&self.method)
    }

    /// Derives the cache key of this request.
    pub fn cache_key(&self, builder: &CacheKeyBuilder) -> CacheKey {
        builder.build(&self.url, std::iter::empty::<(&str, &str)>())
    }
}
