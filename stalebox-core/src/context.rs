//! Cache status of a resolved request.

/// Whether the request was answered from the cache, from stale cached data, or
/// from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStatus {
    /// Cache hit - fresh cached data was found and returned.
    Hit,
    /// Cache miss - the origin was called.
    #[default]
    Miss,
    /// Stale data - cached data past its revalidation instant was returned.
    Stale,
}

impl CacheStatus {
    /// Returns the status as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Stale => "stale",
        }
    }

    /// Returns `true` when the response was served from the cache.
    #[inline]
    pub const fn is_cached(&self) -> bool {
        matches!(self, CacheStatus::Hit | CacheStatus::Stale)
    }
}
