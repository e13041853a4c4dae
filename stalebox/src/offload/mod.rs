//! Offload manager for background task execution.
//!
//! This module provides the singleflight ticket map behind
//! stale-while-revalidate: stale data is returned immediately while at most
//! one refresh per cache key runs in the background.
//!
//! # Example
//!
//! ```ignore
//! use stalebox::offload::OffloadManager;
//!
//! let manager = OffloadManager::new();
//!
//! // Spawned: no refresh for this key is running yet.
//! assert!(manager.spawn_with_key(key.clone(), async { /* refresh */ }));
//! // Deduplicated: the first one is still in flight.
//! assert!(!manager.spawn_with_key(key, async { /* refresh */ }));
//! ```

mod manager;

pub use manager::OffloadManager;
