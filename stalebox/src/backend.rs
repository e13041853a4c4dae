//! Backend traits and utilities for cache storage.
//!
//! This module re-exports types from `stalebox-backend` for implementing
//! custom cache storage backends:
//!
//! - `Backend` - Core trait for raw byte storage with per-entry TTL
//! - `CacheBackend` - Extended trait storing typed [`CachedEntry`](stalebox_core::CachedEntry) values
//! - `BackendError` - Error type for backend operations
//! - `DeleteStatus` - Result of cache entry deletion
//! - `Format` - Value encoding used by a backend
//!
//! The in-memory backend lives in [`stalebox-moka`].
//!
//! [`stalebox-moka`]: https://docs.rs/stalebox-moka

pub use stalebox_backend::{
    Backend, BackendError, BackendResult, BincodeFormat, CacheBackend, DeleteStatus, Format,
    FormatError, JsonFormat,
};
