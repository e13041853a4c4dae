use std::future::Future;

/// Trait for calling the origin with a cacheable request.
///
/// This trait is transport-agnostic: the reqwest integration implements it
/// over the rest of the middleware chain, tests implement it with canned
/// responses.
///
/// # Examples
///
/// ```rust,ignore
/// use stalebox_core::{CacheableRequest, HttpResponse, Upstream};
/// use std::future::Ready;
///
/// struct FixedUpstream {
///     response: HttpResponse,
/// }
///
/// impl Upstream<CacheableRequest> for FixedUpstream {
///     type Response = Result<HttpResponse, std::io::Error>;
///     type Future = Ready<Self::Response>;
///
///     fn call(&mut self, _req: CacheableRequest) -> Self::Future {
///         std::future::ready(Ok(self.response.clone()))
///     }
/// }
/// ```
pub trait Upstream<Req> {
    /// The response type returned by the origin
    type Response;

    /// The future that resolves to the response
    type Future: Future<Output = Self::Response> + Send;

    /// Call the origin with the given request
    fn call(&mut self, req: Req) -> Self::Future;
}
