//! Value formats for serializing [`CachedEntry`] to bytes.
//!
//! | Format | Size | Human readable |
//! |--------|------|----------------|
//! | [`JsonFormat`] | Larger | Yes (default) |
//! | [`BincodeFormat`] | Compact | No |

use bytes::Bytes;
use stalebox_core::{CachedEntry, Raw};
use thiserror::Error;

/// Error raised while encoding or decoding a stored value.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The entry could not be encoded.
    #[error("failed to serialize cache value: {0}")]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    /// The stored bytes could not be decoded.
    #[error("failed to deserialize cache value: {0}")]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Encoding of [`CachedEntry`] values in a store.
pub trait Format: Send + Sync {
    /// Encodes an entry.
    fn serialize(&self, entry: &CachedEntry) -> Result<Raw, FormatError>;

    /// Decodes an entry previously produced by [`serialize`](Format::serialize).
    fn deserialize(&self, data: &[u8]) -> Result<CachedEntry, FormatError>;
}

/// JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn serialize(&self, entry: &CachedEntry) -> Result<Raw, FormatError> {
        serde_json::to_vec(entry)
            .map(Bytes::from)
            .map_err(|err| FormatError::Serialize(Box::new(err)))
    }

    fn deserialize(&self, data: &[u8]) -> Result<CachedEntry, FormatError> {
        serde_json::from_slice(data).map_err(|err| FormatError::Deserialize(Box::new(err)))
    }
}

/// Compact binary encoding via `bincode`'s serde support.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeFormat;

impl Format for BincodeFormat {
    fn serialize(&self, entry: &CachedEntry) -> Result<Raw, FormatError> {
        bincode::serde::encode_to_vec(entry, bincode::config::standard())
            .map(Bytes::from)
            .map_err(|err| FormatError::Serialize(Box::new(err)))
    }

    fn deserialize(&self, data: &[u8]) -> Result<CachedEntry, FormatError> {
        bincode::serde::decode_from_slice(data, bincode::config::standard())
            .map(|(entry, _)| entry)
            .map_err(|err| FormatError::Deserialize(Box::new(err)))
    }
}
