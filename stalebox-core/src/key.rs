//! Cache key types and construction.
//!
//! A [`CacheKey`] has two components:
//!
//! 1. **Segment** - namespace tag embedding the stored-value schema version
//! 2. **Id** - the canonical request URL, query string included
//!
//! Query parameters are merged into the URL with standard
//! `application/x-www-form-urlencoded` rules, so a request built as
//! `GET /path?d=ank` and one built as `GET /path` with a separate `d=ank`
//! query parameter produce byte-identical ids.
//!
//! ```
//! use stalebox_core::CacheKey;
//! use url::Url;
//!
//! let inline = Url::parse("http://example.com/path?d=ank").unwrap();
//! let base = Url::parse("http://example.com/path").unwrap();
//!
//! let builder = CacheKey::builder();
//! assert_eq!(
//!     builder.build(&inline, std::iter::empty::<(&str, &str)>()),
//!     builder.build(&base, [("d", "ank")]),
//! );
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};
use url::Url;

/// Version of the stored value layout.
///
/// Bumped whenever [`CachedEntry`](crate::CachedEntry) changes shape so that
/// entries written by an older release are never read back by a newer one.
pub const SCHEMA_VERSION: u32 = 1;

/// A cache key identifying a cached entry.
///
/// Both components are [`SmolStr`]s, so cloning a key never copies the URL
/// text. Keys are cloned into background refresh tasks and the in-flight
/// ticket map.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    segment: SmolStr,
    id: SmolStr,
}

impl CacheKey {
    /// Creates a key from an explicit segment and id.
    pub fn new(segment: impl Into<SmolStr>, id: impl Into<SmolStr>) -> Self {
        Self {
            segment: segment.into(),
            id: id.into(),
        }
    }

    /// Returns a builder using the default versioned segment.
    pub fn builder() -> CacheKeyBuilder {
        CacheKeyBuilder::default()
    }

    /// Namespace tag of this key.
    #[inline]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Canonical request URL of this key.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segment, self.id)
    }
}

/// Derives [`CacheKey`]s for outgoing requests within one segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheKeyBuilder {
    segment: SmolStr,
}

impl Default for CacheKeyBuilder {
    fn default() -> Self {
        Self {
            segment: format_smolstr!("stalebox:v{SCHEMA_VERSION}:response"),
        }
    }
}

impl CacheKeyBuilder {
    /// Creates a builder with a custom segment.
    ///
    /// The schema version is still appended so that a custom namespace
    /// cannot collide with entries of an incompatible layout.
    pub fn with_namespace(namespace: &str) -> Self {
        Self {
            segment: format_smolstr!("{namespace}:v{SCHEMA_VERSION}:response"),
        }
    }

    /// Segment shared by every key this builder produces.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Builds the key for `url` with `query` merged into its query string.
    ///
    /// The fragment is dropped, and an empty query (`/path?`) is normalized to
    /// no query at all.
    pub fn build<I, K, V>(&self, url: &Url, query: I) -> CacheKey
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut canonical = url.clone();
        canonical.set_fragment(None);

        let mut query = query.into_iter().peekable();
        if query.peek().is_some() {
            canonical.query_pairs_mut().extend_pairs(query);
        }
        if canonical.query() == Some("") {
            canonical.set_query(None);
        }

        CacheKey::new(self.segment.clone(), canonical.as_str())
    }
}
