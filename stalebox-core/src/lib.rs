#![warn(missing_docs)]
//! # stalebox-core
//!
//! Core traits and types for the stalebox HTTP response cache.
//!
//! This crate holds everything the caching engine decides *with*, but nothing
//! that performs I/O:
//!
//! - **Identify** requests with a [`CacheKey`]
//! - **Store** responses as [`CachedEntry`] values
//! - **Parse** `cache-control` into a [`CacheControl`] policy
//! - **Decide** storage TTL and revalidation time with [`StorageDecision`]
//! - **Call** the origin through [`Upstream`] and background refreshes through [`Refresh`]
//! - **Report** hits and misses to a [`CacheObserver`]

pub mod context;
pub mod key;
pub mod observer;
pub mod policy;
pub mod refresh;
pub mod request;
pub mod response;
pub mod upstream;
pub mod value;

pub use context::CacheStatus;
pub use key::{CacheKey, CacheKeyBuilder, SCHEMA_VERSION};
pub use observer::{CacheObserver, NoopObserver, TracingObserver};
pub use policy::{CacheControl, StorageDecision, is_safe_read};
pub use refresh::{BoxError, Refresh, RefreshFuture};
pub use request::CacheableRequest;
pub use response::HttpResponse;
pub use upstream::Upstream;
pub use value::{CacheState, CachedEntry};

#[doc(hidden)]
pub use smol_str::SmolStr;

/// Raw byte data type used for serialized cache values.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
