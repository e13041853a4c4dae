//! Request orchestration: storage decisions, bounded lookups and notifications.

mod common;

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use http::{Method, StatusCode};
use stalebox::backend::CacheBackend;
use stalebox::{
    BoxError, CacheConfig, CacheEngine, CacheError, CacheStatus, CacheableRequest, ConfigError,
    ExecuteError,
};

use common::{
    CountingUpstream, ErrorBackend, Event, FailingUpstream, PendingBackend, RecordingObserver,
    TestBackend, get, ok, request, response,
};

const URL: &str = "http://api.test/items?page=1";

#[tokio::test]
async fn max_age_response_is_stored_and_served() {
    let backend = TestBackend::new();
    let engine = CacheEngine::builder().backend(backend.clone()).build().unwrap();
    let upstream = CountingUpstream::new(ok("items", "max-age=60"));

    let first = engine.execute(get(URL), upstream.clone()).await.unwrap();
    assert_eq!(first.status, CacheStatus::Miss);
    assert_eq!(first.response.body(), "items");

    let key = engine.cache_key(&get(URL));
    assert_eq!(backend.ttl(&key), Some(Duration::from_secs(60)));

    let second = engine.execute(get(URL), upstream.clone()).await.unwrap();
    assert_eq!(second.status, CacheStatus::Hit);
    assert_eq!(second.response.body(), "items");
    assert_eq!(second.response.status(), StatusCode::OK);
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn responses_without_freshness_are_not_stored() {
    for cache_control in [None, Some("max-age=0"), Some("no-cache"), Some("max-age=soon")] {
        let backend = TestBackend::new();
        let engine = CacheEngine::builder().backend(backend.clone()).build().unwrap();
        let upstream = CountingUpstream::new(response(StatusCode::OK, "items", cache_control));

        engine.execute(get(URL), upstream.clone()).await.unwrap();
        let again = engine.execute(get(URL), upstream.clone()).await.unwrap();

        assert_eq!(again.status, CacheStatus::Miss, "{cache_control:?}");
        assert!(!backend.contains(&engine.cache_key(&get(URL))));
        assert_eq!(upstream.calls(), 2);
    }
}

#[tokio::test]
async fn error_responses_are_returned_but_not_stored() {
    let backend = TestBackend::new();
    let engine = CacheEngine::builder().backend(backend.clone()).build().unwrap();
    let upstream = CountingUpstream::new(response(
        StatusCode::SERVICE_UNAVAILABLE,
        "down",
        Some("max-age=60"),
    ));

    let resolved = engine.execute(get(URL), upstream.clone()).await.unwrap();
    assert_eq!(resolved.status, CacheStatus::Miss);
    assert_eq!(resolved.response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(!backend.contains(&engine.cache_key(&get(URL))));
}

#[tokio::test]
async fn stale_window_extends_ttl_for_safe_reads() {
    let backend = TestBackend::new();
    let engine = CacheEngine::builder()
        .backend(backend.clone())
        .config(CacheConfig::builder().stale_while_revalidate(true).build())
        .refresh(|_req: CacheableRequest| async { Ok::<_, BoxError>(ok("fresh", "max-age=60")) })
        .build()
        .unwrap();
    let upstream = CountingUpstream::new(ok("items", "max-age=60, stale-while-revalidate=120"));

    let before = Utc::now();
    engine.execute(get(URL), upstream).await.unwrap();
    let after = Utc::now();

    let key = engine.cache_key(&get(URL));
    assert_eq!(backend.ttl(&key), Some(Duration::from_secs(180)));

    let entry = backend.get(&key).await.unwrap().unwrap();
    let revalidate = entry.revalidate().unwrap();
    assert!(revalidate >= before + TimeDelta::seconds(60));
    assert!(revalidate <= after + TimeDelta::seconds(60));
}

#[tokio::test]
async fn stale_window_is_ignored_for_unsafe_methods() {
    let backend = TestBackend::new();
    let engine = CacheEngine::builder()
        .backend(backend.clone())
        .config(CacheConfig::builder().stale_while_revalidate(true).build())
        .refresh(|_req: CacheableRequest| async { Ok::<_, BoxError>(ok("fresh", "max-age=60")) })
        .build()
        .unwrap();
    let upstream = CountingUpstream::new(ok("saved", "max-age=60, stale-while-revalidate=120"));

    let put = request(Method::PUT, URL);
    engine.execute(put.clone(), upstream).await.unwrap();

    let key = engine.cache_key(&put);
    assert_eq!(backend.ttl(&key), Some(Duration::from_secs(60)));
    assert_eq!(backend.get(&key).await.unwrap().unwrap().revalidate(), None);
}

#[tokio::test]
async fn stale_window_is_ignored_when_disabled() {
    let backend = TestBackend::new();
    let engine = CacheEngine::builder().backend(backend.clone()).build().unwrap();
    let upstream = CountingUpstream::new(ok("items", "max-age=60, stale-while-revalidate=120"));

    engine.execute(get(URL), upstream).await.unwrap();

    let key = engine.cache_key(&get(URL));
    assert_eq!(backend.ttl(&key), Some(Duration::from_secs(60)));
    assert_eq!(backend.get(&key).await.unwrap().unwrap().revalidate(), None);
}

#[tokio::test]
async fn key_ignores_fragment_but_not_query() {
    let backend = TestBackend::new();
    let engine = CacheEngine::builder().backend(backend).build().unwrap();
    let upstream = CountingUpstream::new(ok("items", "max-age=60"));

    engine.execute(get(URL), upstream.clone()).await.unwrap();

    let with_fragment = engine
        .execute(get("http://api.test/items?page=1#top"), upstream.clone())
        .await
        .unwrap();
    assert_eq!(with_fragment.status, CacheStatus::Hit);

    let other_page = engine
        .execute(get("http://api.test/items?page=2"), upstream.clone())
        .await
        .unwrap();
    assert_eq!(other_page.status, CacheStatus::Miss);
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn lookup_timeout_fails_request_without_calling_origin() {
    let engine = CacheEngine::builder()
        .backend(PendingBackend)
        .config(CacheConfig::builder().timeout(Duration::from_millis(50)).build())
        .build()
        .unwrap();
    let upstream = CountingUpstream::new(ok("items", "max-age=60"));

    let error = engine.execute(get(URL), upstream.clone()).await.unwrap_err();

    assert!(matches!(
        error,
        ExecuteError::Cache(CacheError::LookupTimeout(limit)) if limit == Duration::from_millis(50)
    ));
    assert!(error.to_string().contains("50ms"), "{error}");
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn ignored_lookup_timeout_falls_through_to_origin() {
    let engine = CacheEngine::builder()
        .backend(PendingBackend)
        .config(
            CacheConfig::builder()
                .timeout(Duration::from_millis(50))
                .ignore_cache_errors(true)
                .build(),
        )
        .build()
        .unwrap();
    let upstream = CountingUpstream::new(ok("items", "max-age=60"));

    let resolved = engine.execute(get(URL), upstream.clone()).await.unwrap();

    assert_eq!(resolved.status, CacheStatus::Miss);
    assert_eq!(resolved.response.body(), "items");
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn lookup_error_fails_request_unless_ignored() {
    let strict = CacheEngine::builder().backend(ErrorBackend).build().unwrap();
    let upstream = CountingUpstream::new(ok("items", "max-age=60"));

    let error = strict.execute(get(URL), upstream.clone()).await.unwrap_err();
    assert!(matches!(error, ExecuteError::Cache(CacheError::Lookup(_))));
    assert_eq!(upstream.calls(), 0);

    let lenient = CacheEngine::builder()
        .backend(ErrorBackend)
        .config(CacheConfig::builder().ignore_cache_errors(true).build())
        .build()
        .unwrap();

    // The write after the origin call fails too and must not surface.
    let resolved = lenient.execute(get(URL), upstream.clone()).await.unwrap();
    assert_eq!(resolved.status, CacheStatus::Miss);
    assert_eq!(resolved.response.body(), "items");
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn origin_errors_pass_through() {
    let engine = CacheEngine::builder().backend(TestBackend::new()).build().unwrap();

    let error = engine.execute(get(URL), FailingUpstream).await.unwrap_err();

    match error {
        ExecuteError::Upstream(inner) => assert_eq!(inner.to_string(), "connection refused"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn observer_is_told_about_hits_and_misses() {
    let observer = RecordingObserver::default();
    let engine = CacheEngine::builder()
        .backend(TestBackend::new())
        .config(CacheConfig::builder().name("catalog").build())
        .observer(observer.clone())
        .build()
        .unwrap();
    let upstream = CountingUpstream::new(ok("items", "max-age=60"));

    engine.execute(get(URL), upstream.clone()).await.unwrap();
    engine.execute(get(URL), upstream.clone()).await.unwrap();
    engine.execute(get(URL), upstream).await.unwrap();

    let key = engine.cache_key(&get(URL)).to_string();
    let name = Some("catalog".to_owned());
    assert_eq!(
        observer.events(),
        vec![
            Event::Miss(key.clone(), name.clone()),
            Event::Hit(key.clone(), name.clone()),
            Event::Hit(key, name),
        ]
    );
}

#[tokio::test]
async fn observer_is_not_called_when_lookup_fails() {
    let observer = RecordingObserver::default();
    let engine = CacheEngine::builder()
        .backend(ErrorBackend)
        .observer(observer.clone())
        .build()
        .unwrap();

    let upstream = CountingUpstream::new(ok("items", "max-age=60"));
    assert!(engine.execute(get(URL), upstream).await.is_err());
    assert!(observer.events().is_empty());
}

#[test]
fn stale_while_revalidate_requires_refresh() {
    let result = CacheEngine::builder()
        .backend(TestBackend::new())
        .config(CacheConfig::builder().stale_while_revalidate(true).build())
        .build();

    assert_eq!(result.unwrap_err(), ConfigError::MissingRefresh);
}

#[test]
fn refresh_is_optional_without_stale_while_revalidate() {
    let engine = CacheEngine::builder().backend(TestBackend::new()).build().unwrap();
    assert!(engine.offload().is_none());
}
