//! Upstream wrapper for reqwest-middleware's Next type.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use http::Extensions;
use reqwest::{ResponseBuilderExt, Url};
use reqwest_middleware::{Error, Next, Result};
use stalebox_core::{CacheableRequest, HttpResponse, Upstream};

/// Upstream wrapper that bridges reqwest-middleware's `Next<'a>` to stalebox's `Upstream` trait.
///
/// Holds the original request, so bodies and extensions reach the origin
/// untouched; the [`CacheableRequest`] handed to [`call`](Upstream::call) only
/// describes it.
pub struct ReqwestUpstream<'a> {
    next: Next<'a>,
    extensions: Extensions,
    request: Option<reqwest::Request>,
}

impl<'a> ReqwestUpstream<'a> {
    /// Create a new upstream wrapper.
    pub fn new(next: Next<'a>, extensions: Extensions, request: reqwest::Request) -> Self {
        Self {
            next,
            extensions,
            request: Some(request),
        }
    }
}

impl<'a> Upstream<CacheableRequest> for ReqwestUpstream<'a> {
    type Response = Result<HttpResponse>;
    type Future = Pin<Box<dyn Future<Output = Self::Response> + Send + 'a>>;

    fn call(&mut self, _req: CacheableRequest) -> Self::Future {
        let next = self.next.clone();
        let mut extensions = std::mem::take(&mut self.extensions);
        let request = self.request.take();

        Box::pin(async move {
            let request = request
                .ok_or_else(|| Error::middleware(std::io::Error::other("request already sent")))?;
            let started = Instant::now();
            let response = next.run(request, &mut extensions).await?;
            buffer_response(response, started).await
        })
    }
}

/// Reads `response` in full into an [`HttpResponse`].
pub async fn buffer_response(
    response: reqwest::Response,
    started: Instant,
) -> Result<HttpResponse> {
    let status = response.status();
    let headers = response.headers().clone();
    let url = response.url().to_string();
    let body = response.bytes().await.map_err(Error::Reqwest)?;

    Ok(HttpResponse::new(status, body)
        .with_headers(headers)
        .with_url(url)
        .with_elapsed(started.elapsed()))
}

/// Converts a buffered response back into a `reqwest::Response`.
///
/// The response keeps the effective URL it was fetched from. Entries without
/// a parseable URL report `request_url` instead.
pub fn into_reqwest(response: HttpResponse, request_url: &Url) -> Result<reqwest::Response> {
    let url = Url::parse(response.url()).unwrap_or_else(|_| request_url.clone());
    let (status, headers, body) = response.into_parts();

    let mut builder = http::Response::builder().status(status).url(url);
    if let Some(target) = builder.headers_mut() {
        *target = headers;
    }
    let http_response = builder
        .body(reqwest::Body::from(body))
        .map_err(Error::middleware)?;
    Ok(http_response.into())
}
