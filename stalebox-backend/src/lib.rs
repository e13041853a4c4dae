//! Traits and structs for stalebox cache store interaction.
//!
//! If you want to plug in your own store, you are in the right place.
mod backend;
mod error;
pub mod format;

pub use backend::{Backend, BackendResult, CacheBackend};
pub use error::{BackendError, DeleteStatus};
pub use format::{BincodeFormat, Format, FormatError, JsonFormat};
