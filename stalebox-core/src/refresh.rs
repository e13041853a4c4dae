//! Background refresh callback.

use std::future::Future;
use std::pin::Pin;

use crate::request::CacheableRequest;
use crate::response::HttpResponse;

/// Boxed error returned by refresh callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by [`Refresh::refresh`].
pub type RefreshFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, BoxError>> + Send>>;

/// Fetches a fresh copy of a stale entry.
///
/// The refresh runs detached from the request that noticed the stale entry, so
/// the future must be `'static` and must not borrow the middleware chain.
/// A refresh should reach the origin directly: routing it through the caching
/// middleware again would just read the stale entry back.
///
/// Any `Fn(CacheableRequest) -> impl Future<Output = Result<HttpResponse, BoxError>>`
/// closure is a `Refresh`:
///
/// ```
/// use http::StatusCode;
/// use stalebox_core::{BoxError, CacheableRequest, HttpResponse, Refresh};
///
/// fn assert_refresh<R: Refresh>(_: R) {}
///
/// assert_refresh(|_req: CacheableRequest| async {
///     Ok::<_, BoxError>(HttpResponse::new(StatusCode::OK, "fresh"))
/// });
/// ```
pub trait Refresh: Send + Sync {
    /// Re-fetches `request` from the origin.
    fn refresh(&self, request: CacheableRequest) -> RefreshFuture;
}

impl<F, Fut> Refresh for F
where
    F: Fn(CacheableRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse, BoxError>> + Send + 'static,
{
    fn refresh(&self, request: CacheableRequest) -> RefreshFuture {
        Box::pin(self(request))
    }
}
