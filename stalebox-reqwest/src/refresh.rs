//! Background refresh over a plain `reqwest::Client`.

use std::time::Instant;

use stalebox_core::{BoxError, CacheableRequest, Refresh, RefreshFuture};

use crate::upstream::buffer_response;

/// Re-fetches stale entries with a `reqwest::Client`.
///
/// Use a client *without* the cache middleware: a refresh that went through
/// it would read the stale entry back instead of reaching the origin.
#[derive(Debug, Clone, Default)]
pub struct ClientRefresh {
    client: reqwest::Client,
}

impl ClientRefresh {
    /// Refresh with `client`.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Refresh for ClientRefresh {
    fn refresh(&self, request: CacheableRequest) -> RefreshFuture {
        let pending = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone())
            .send();

        Box::pin(async move {
            let started = Instant::now();
            let response = pending.await?;
            buffer_response(response, started)
                .await
                .map_err(BoxError::from)
        })
    }
}
