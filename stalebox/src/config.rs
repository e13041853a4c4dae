//! Cache configuration.
//!
//! [`CacheConfig`] is plain data and can be loaded from any serde format:
//!
//! ```yaml
//! timeout: 50ms
//! ignore_cache_errors: true
//! stale_while_revalidate: true
//! refresh_timeout: 5s
//! name: catalog
//! ```
//!
//! Unknown keys are rejected, so a misspelt option such as
//! `stale-while-revalidate` fails loudly instead of silently leaving the
//! feature off.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Options controlling one cache instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Upper bound on a cache lookup (e.g., "50ms", "1s"). No bound when unset.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Treat cache lookup errors and timeouts as misses instead of failing the request.
    #[serde(default)]
    pub ignore_cache_errors: bool,
    /// Serve stale entries while refreshing them in the background.
    #[serde(default)]
    pub stale_while_revalidate: bool,
    /// Upper bound on a background refresh. An elapsed refresh counts as failed.
    #[serde(default, with = "humantime_serde")]
    pub refresh_timeout: Option<Duration>,
    /// Name passed to observers and used as a metrics label.
    #[serde(default)]
    pub name: Option<SmolStr>,
}

impl CacheConfig {
    /// Create a new builder for CacheConfig.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }
}

/// Builder for CacheConfig.
#[derive(Debug, Clone, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Bound cache lookups by `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Treat cache lookup failures as misses.
    pub fn ignore_cache_errors(mut self, enabled: bool) -> Self {
        self.config.ignore_cache_errors = enabled;
        self
    }

    /// Enable or disable stale-while-revalidate.
    pub fn stale_while_revalidate(mut self, enabled: bool) -> Self {
        self.config.stale_while_revalidate = enabled;
        self
    }

    /// Bound background refreshes by `timeout`.
    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.config.refresh_timeout = Some(timeout);
        self
    }

    /// Name this cache instance.
    pub fn name(mut self, name: impl Into<SmolStr>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Build the CacheConfig.
    pub fn build(self) -> CacheConfig {
        self.config
    }
}
