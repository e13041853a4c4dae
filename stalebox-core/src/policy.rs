//! Freshness policy: `cache-control` parsing and storage decisions.
//!
//! Only two directives matter here:
//!
//! - `max-age=N` - seconds a response stays fresh. Absent, non-numeric or zero
//!   means the response is not stored at all.
//! - `stale-while-revalidate=N` - extra seconds a stale response may still be
//!   served while a background refresh runs. Zero is the same as absent.
//!
//! [`StorageDecision::compute`] is the single place storage TTL and the
//! revalidation instant are decided. Fresh stores and background refresh
//! stores both go through it.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use http::{HeaderMap, Method, header::CACHE_CONTROL};

/// Whether requests with `method` take part in stale-while-revalidate.
///
/// Only GET. A HEAD entry has no body and shares its key with GET, so it
/// must not be kept alive past `max-age`.
pub fn is_safe_read(method: &Method) -> bool {
    method == Method::GET
}

/// Parsed `cache-control` directives relevant to caching.
///
/// A `CacheControl` with no `max_age` means "do not cache"; in that case
/// `stale_while_revalidate` is always `None` as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheControl {
    max_age: Option<u64>,
    stale_while_revalidate: Option<u64>,
}

impl CacheControl {
    /// Parses a raw `cache-control` header value.
    ///
    /// Directive names are matched case-insensitively and the first occurrence
    /// of a directive wins. Values may be quoted.
    pub fn parse(value: &str) -> Self {
        let mut max_age = None;
        let mut stale_while_revalidate = None;

        for directive in value.split(',') {
            let Some((name, arg)) = directive.split_once('=') else {
                continue;
            };
            let name = name.trim();
            let seconds = || arg.trim().trim_matches('"').parse::<u64>().ok();

            if name.eq_ignore_ascii_case("max-age") {
                max_age = max_age.or(Some(seconds()));
            } else if name.eq_ignore_ascii_case("stale-while-revalidate") {
                stale_while_revalidate = stale_while_revalidate.or(Some(seconds()));
            }
        }

        Self::new(max_age.flatten(), stale_while_revalidate.flatten())
    }

    /// Parses every `cache-control` header in `headers`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let joined = headers
            .get_all(CACHE_CONTROL)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(",");
        Self::parse(&joined)
    }

    /// Builds a policy from already parsed values, applying the zero rules.
    pub fn new(max_age: Option<u64>, stale_while_revalidate: Option<u64>) -> Self {
        let max_age = max_age.filter(|&seconds| seconds > 0);
        let stale_while_revalidate = max_age
            .and(stale_while_revalidate)
            .filter(|&seconds| seconds > 0);
        Self {
            max_age,
            stale_while_revalidate,
        }
    }

    /// Freshness lifetime in seconds, `None` when the response must not be stored.
    pub fn max_age(&self) -> Option<u64> {
        self.max_age
    }

    /// Stale-while-revalidate window in seconds.
    pub fn stale_while_revalidate(&self) -> Option<u64> {
        self.stale_while_revalidate
    }

    /// Whether a response carrying this policy may be stored.
    pub fn is_cacheable(&self) -> bool {
        self.max_age.is_some()
    }
}

/// How long to keep an entry and when it turns stale.
///
/// Derived once per successful origin (or refresh) response and never
/// modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageDecision {
    ttl: Duration,
    revalidate_at: Option<DateTime<Utc>>,
}

impl StorageDecision {
    /// Decides whether and how to store a response.
    ///
    /// Returns `None` when nothing must be stored. Otherwise:
    ///
    /// - with `swr_enabled`, a safe-read `method` and a stale-while-revalidate
    ///   window, the entry is kept for `max-age + stale-while-revalidate` and
    ///   turns stale at `now + max-age`;
    /// - in every other case the entry is kept for exactly `max-age` and never
    ///   turns stale.
    pub fn compute(
        policy: &CacheControl,
        method: &Method,
        swr_enabled: bool,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let max_age = policy.max_age()?;

        let window = policy
            .stale_while_revalidate()
            .filter(|_| swr_enabled && is_safe_read(method));

        let decision = match window {
            Some(stale) => Self {
                ttl: Duration::from_secs(max_age.saturating_add(stale)),
                revalidate_at: Some(seconds_after(now, max_age)),
            },
            None => Self {
                ttl: Duration::from_secs(max_age),
                revalidate_at: None,
            },
        };
        Some(decision)
    }

    /// How long the store should keep the entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Storage TTL in milliseconds.
    pub fn ttl_millis(&self) -> u128 {
        self.ttl.as_millis()
    }

    /// Instant after which the entry is served stale and refreshed.
    pub fn revalidate_at(&self) -> Option<DateTime<Utc>> {
        self.revalidate_at
    }
}

fn seconds_after(now: DateTime<Utc>, seconds: u64) -> DateTime<Utc> {
    i64::try_from(seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_max_age_and_swr() {
        let cc = CacheControl::parse("public, max-age=60, stale-while-revalidate=120");
        assert_eq!(cc.max_age(), Some(60));
        assert_eq!(cc.stale_while_revalidate(), Some(120));
        assert!(cc.is_cacheable());
    }

    #[test]
    fn absent_zero_or_garbage_max_age_is_not_cacheable() {
        for raw in ["", "no-store", "max-age=0", "max-age=abc", "max-age=-5", "max-age="] {
            let cc = CacheControl::parse(raw);
            assert!(!cc.is_cacheable(), "{raw:?} should not be cacheable");
            assert_eq!(cc.stale_while_revalidate(), None);
        }
    }

    #[test]
    fn swr_without_max_age_is_dropped() {
        let cc = CacheControl::parse("stale-while-revalidate=30");
        assert_eq!(cc, CacheControl::default());
    }

    #[test]
    fn zero_swr_is_absent() {
        let cc = CacheControl::parse("max-age=10, stale-while-revalidate=0");
        assert_eq!(cc.max_age(), Some(10));
        assert_eq!(cc.stale_while_revalidate(), None);
    }

    #[test]
    fn directive_names_are_case_insensitive_and_values_may_be_quoted() {
        let cc = CacheControl::parse(r#"Max-Age="15" , STALE-WHILE-REVALIDATE=5"#);
        assert_eq!(cc.max_age(), Some(15));
        assert_eq!(cc.stale_while_revalidate(), Some(5));
    }

    #[test]
    fn first_directive_wins() {
        let cc = CacheControl::parse("max-age=5, max-age=500");
        assert_eq!(cc.max_age(), Some(5));
    }

    #[test]
    fn reads_all_cache_control_headers() {
        let mut headers = HeaderMap::new();
        headers.append(CACHE_CONTROL, "public".parse().unwrap());
        headers.append(CACHE_CONTROL, "max-age=30".parse().unwrap());
        headers.append(CACHE_CONTROL, "stale-while-revalidate=7".parse().unwrap());
        let cc = CacheControl::from_headers(&headers);
        assert_eq!(cc.max_age(), Some(30));
        assert_eq!(cc.stale_while_revalidate(), Some(7));
    }

    #[test]
    fn missing_header_is_not_cacheable() {
        assert!(!CacheControl::from_headers(&HeaderMap::new()).is_cacheable());
    }

    #[test]
    fn plain_max_age_ttl() {
        let now = Utc::now();
        let cc = CacheControl::parse("max-age=60");
        let decision = StorageDecision::compute(&cc, &Method::GET, true, now).unwrap();
        assert_eq!(decision.ttl_millis(), 60_000);
        assert_eq!(decision.revalidate_at(), None);
    }

    #[test]
    fn swr_extends_ttl_and_sets_revalidate_at() {
        let now = Utc::now();
        let cc = CacheControl::parse("max-age=60, stale-while-revalidate=120");
        let decision = StorageDecision::compute(&cc, &Method::GET, true, now).unwrap();
        assert_eq!(decision.ttl_millis(), 180_000);
        assert_eq!(decision.revalidate_at(), Some(now + TimeDelta::seconds(60)));
    }

    #[test]
    fn swr_disabled_ignores_window() {
        let now = Utc::now();
        let cc = CacheControl::parse("max-age=60, stale-while-revalidate=120");
        let decision = StorageDecision::compute(&cc, &Method::GET, false, now).unwrap();
        assert_eq!(decision.ttl_millis(), 60_000);
        assert_eq!(decision.revalidate_at(), None);
    }

    #[test]
    fn unsafe_methods_never_get_swr() {
        let now = Utc::now();
        let cc = CacheControl::parse("max-age=60, stale-while-revalidate=120");
        for method in [Method::PUT, Method::POST, Method::DELETE] {
            let decision = StorageDecision::compute(&cc, &method, true, now).unwrap();
            assert_eq!(decision.ttl_millis(), 60_000, "{method}");
            assert_eq!(decision.revalidate_at(), None, "{method}");
        }
    }

    #[test]
    fn only_get_is_a_safe_read() {
        assert!(is_safe_read(&Method::GET));
        assert!(!is_safe_read(&Method::HEAD));

        let now = Utc::now();
        let cc = CacheControl::parse("max-age=1, stale-while-revalidate=1");
        let decision = StorageDecision::compute(&cc, &Method::HEAD, true, now).unwrap();
        assert_eq!(decision.ttl_millis(), 1_000);
        assert_eq!(decision.revalidate_at(), None);
    }

    #[test]
    fn uncacheable_policy_stores_nothing() {
        let cc = CacheControl::parse("max-age=0, stale-while-revalidate=120");
        assert_eq!(StorageDecision::compute(&cc, &Method::GET, true, Utc::now()), None);
    }
}
