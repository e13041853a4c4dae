#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod middleware;
mod refresh;
mod upstream;

pub use middleware::{CacheMiddleware, CacheMiddlewareBuilder, DEFAULT_CACHE_STATUS_HEADER};
pub use refresh::ClientRefresh;
pub use upstream::ReqwestUpstream;

// Re-export common types
pub use stalebox::{CacheConfig, CacheStatus, NotSet};
