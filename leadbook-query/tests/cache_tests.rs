use futures::FutureExt;
use futures::future::BoxFuture;
use leadbook_api::{ApiError, ApiResult};
use leadbook_query::{
    QueryClient, QueryClientConfig, QueryKey, QueryObserver, QueryOptions, query_key,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// A fetcher that counts its invocations and answers `value` after `delay`.
fn counted<T>(
    calls: &Arc<AtomicUsize>,
    value: T,
    delay: Duration,
) -> impl Fn() -> BoxFuture<'static, ApiResult<T>> + Send + Sync + 'static
where
    T: Clone + Send + Sync + 'static,
{
    let calls = Arc::clone(calls);
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        let value = value.clone();
        async move {
            tokio::time::sleep(delay).await;
            Ok(value)
        }
        .boxed()
    }
}

fn failing(
    calls: &Arc<AtomicUsize>,
    err: ApiError,
) -> impl Fn() -> BoxFuture<'static, ApiResult<u32>> + Send + Sync + 'static {
    let calls = Arc::clone(calls);
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        let err = err.clone();
        async move { Err(err) }.boxed()
    }
}

fn server_error() -> ApiError {
    ApiError::Server {
        status: 503,
        message: None,
    }
}

// ── Keys ────────────────────────────────────────────────────────

#[test]
fn macro_matches_builder() {
    let built = QueryKey::new("leads").with("search").with(&"acme");
    assert_eq!(query_key!["leads", "search", "acme"], built);
    assert_eq!(built.len(), 3);
    assert_eq!(built.to_string(), r#"["leads","search","acme"]"#);
}

#[test]
fn keys_serialize_as_arrays() {
    let key = query_key!["leads", json!({"status": "new", "page": 1})];
    assert_eq!(
        serde_json::to_value(&key).unwrap(),
        json!(["leads", {"page": 1, "status": "new"}])
    );
}

#[test]
fn prefix_matching() {
    let key = query_key!["leads", "l1"];
    assert!(key.starts_with(&query_key!["leads"]));
    assert!(key.starts_with(&key));
    assert!(key.starts_with(&QueryKey::default()));
    assert!(!key.starts_with(&query_key!["clients"]));
    assert!(!query_key!["leads"].starts_with(&key));
    assert!(!query_key!["leadsStats"].starts_with(&query_key!["leads"]));
}

#[test]
fn equal_keys_hash_equal() {
    let mut set = HashSet::new();
    set.insert(query_key!["leads", json!({"page": 1, "limit": 10})]);
    set.insert(query_key!["leads", json!({"limit": 10, "page": 1})]);
    set.insert(query_key!["leads", 1]);
    assert_eq!(set.len(), 2);
}

// ── Fetching ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn concurrent_fetches_share_one_request() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = query_key!["leads"];

    let (a, b) = tokio::join!(
        client.fetch_query(key.clone(), counted(&calls, 7u32, ms(50)), Duration::ZERO),
        client.fetch_query(key.clone(), counted(&calls, 7u32, ms(50)), Duration::ZERO),
    );

    assert_eq!(*a.unwrap(), 7);
    assert_eq!(*b.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.is_fetching(), 0);
}

#[tokio::test(start_paused = true)]
async fn fresh_data_is_served_from_cache() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = query_key!["leads", "stats"];
    let stale_time = Duration::from_secs(60);

    client
        .fetch_query(key.clone(), counted(&calls, 1u32, ms(0)), stale_time)
        .await
        .unwrap();
    client
        .fetch_query(key.clone(), counted(&calls, 1u32, ms(0)), stale_time)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(61)).await;
    client
        .fetch_query(key.clone(), counted(&calls, 1u32, ms(0)), stale_time)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn zero_stale_time_always_refetches() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        client
            .fetch_query(query_key!["teams"], counted(&calls, 1u32, ms(0)), Duration::ZERO)
            .await
            .unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn prefetch_warms_the_cache() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = query_key!["dashboardStats"];

    client.prefetch_query(key.clone(), counted(&calls, 5u32, ms(10))).await;
    client.prefetch_query(key.clone(), counted(&calls, 5u32, ms(10))).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.get_query_data::<u32>(&key).as_deref(), Some(&5));
}

#[tokio::test(start_paused = true)]
async fn failed_prefetch_is_swallowed() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = query_key!["dashboardStats"];
    let forbidden = ApiError::Forbidden { message: None };

    client.prefetch_query(key.clone(), failing(&calls, forbidden.clone())).await;

    assert_eq!(client.get_query_data::<u32>(&key), None);
    assert_eq!(client.query_state(&key).unwrap().error, Some(forbidden));
}

// ── Retry ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn server_errors_retry_once_by_default() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = query_key!["leads"];

    let err = client
        .fetch_query(key.clone(), failing(&calls, server_error()), Duration::ZERO)
        .await
        .unwrap_err();

    assert_eq!(err, server_error());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(client.query_state(&key).unwrap().error, Some(server_error()));
}

#[tokio::test(start_paused = true)]
async fn retry_count_follows_config() {
    let client = QueryClient::with_config(QueryClientConfig {
        retry: 3,
        ..QueryClientConfig::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));

    let _ = client
        .fetch_query(query_key!["leads"], failing(&calls, ApiError::Timeout), Duration::ZERO)
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn client_errors_are_not_retried() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let rejected = ApiError::Rejected {
        status: 404,
        message: Some("Lead not found".into()),
        errors: Vec::new(),
    };

    let err = client
        .fetch_query(query_key!["leads", "l9"], failing(&calls, rejected), Duration::ZERO)
        .await
        .unwrap_err();

    assert_eq!(err.payload_message(), Some("Lead not found"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_recovers_from_transient_failure() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let fetcher = move || {
        let attempt = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if attempt == 0 {
                Err(ApiError::Network("connection reset".into()))
            } else {
                Ok(42u32)
            }
        }
        .boxed()
    };

    let data = client
        .fetch_query(query_key!["leads"], fetcher, Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(*data, 42);
    let state = client.query_state(&query_key!["leads"]).unwrap();
    assert_eq!(state.error, None);
    assert!(state.has_data);
}

// ── Manual data ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn set_and_get_query_data() {
    let client = QueryClient::new();
    let key = query_key!["leads", "l1"];
    let mut updates = client.subscribe();

    client.set_query_data(key.clone(), "Acme".to_string());

    assert_eq!(client.get_query_data::<String>(&key).as_deref().map(String::as_str), Some("Acme"));
    assert_eq!(updates.try_recv().unwrap(), key);
}

#[tokio::test(start_paused = true)]
async fn typed_read_with_wrong_type_is_none() {
    let client = QueryClient::new();
    let key = query_key!["leads", "l1"];
    client.set_query_data(key.clone(), 1u32);
    assert_eq!(client.get_query_data::<String>(&key), None);
}

// ── Invalidation ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn invalidation_matches_by_prefix() {
    let client = QueryClient::new();
    client.set_query_data(query_key!["leads", "l1"], 1u32);
    client.set_query_data(query_key!["leads", json!({"page": 1})], 2u32);
    client.set_query_data(query_key!["clients"], 3u32);

    assert_eq!(client.invalidate_queries(&query_key!["leads"]), 2);

    assert!(client.query_state(&query_key!["leads", "l1"]).unwrap().is_invalidated);
    assert!(!client.query_state(&query_key!["clients"]).unwrap().is_invalidated);
    assert_eq!(client.get_query_data::<u32>(&query_key!["leads", "l1"]).as_deref(), Some(&1));
}

#[tokio::test(start_paused = true)]
async fn invalidated_data_refetches_despite_stale_time() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = query_key!["leads"];
    let stale_time = Duration::from_secs(300);

    client.fetch_query(key.clone(), counted(&calls, 1u32, ms(0)), stale_time).await.unwrap();
    client.invalidate_queries(&key);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "unobserved entries refetch lazily");

    client.fetch_query(key.clone(), counted(&calls, 1u32, ms(0)), stale_time).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!client.query_state(&key).unwrap().is_invalidated);
}

#[tokio::test(start_paused = true)]
async fn invalidation_during_fetch_leaves_result_stale() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = query_key!["leads"];

    let pending = tokio::spawn({
        let client = client.clone();
        let key = key.clone();
        let fetcher = counted(&calls, 1u32, ms(100));
        async move { client.fetch_query(key, fetcher, Duration::from_secs(60)).await }
    });
    tokio::time::sleep(ms(10)).await;
    assert_eq!(client.is_fetching(), 1);
    assert_eq!(client.invalidate_queries(&key), 1);

    pending.await.unwrap().unwrap();
    let state = client.query_state(&key).unwrap();
    assert!(state.has_data);
    assert!(state.is_invalidated);
}

#[tokio::test(start_paused = true)]
async fn observed_entries_refetch_on_invalidation() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut observer = QueryObserver::new(
        &client,
        query_key!["teams"],
        counted(&calls, vec!["t1".to_string()], ms(10)),
        QueryOptions::default(),
    );
    observer.load().await;

    client.invalidate_queries(&query_key!["teams"]);
    tokio::time::sleep(ms(50)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(observer.result().data().map(Vec::len), Some(1));
    assert!(!client.query_state(&query_key!["teams"]).unwrap().is_invalidated);
}

#[tokio::test(start_paused = true)]
async fn refetch_queries_waits_for_every_match() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    for id in ["l1", "l2"] {
        client
            .fetch_query(query_key!["leads", id], counted(&calls, 1u32, ms(5)), Duration::ZERO)
            .await
            .unwrap();
    }
    client.set_query_data(query_key!["leads", "l3"], 3u32);

    assert_eq!(client.refetch_queries(&query_key!["leads"]).await, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(client.is_fetching(), 0);
}

// ── Removal and eviction ────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn removal_during_fetch_drops_the_result() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = query_key!["clients", "c1"];

    let pending = tokio::spawn({
        let client = client.clone();
        let key = key.clone();
        let fetcher = counted(&calls, 1u32, ms(100));
        async move { client.fetch_query(key, fetcher, Duration::ZERO).await }
    });
    tokio::time::sleep(ms(10)).await;
    assert_eq!(client.remove_queries(&query_key!["clients"]), 1);

    assert_eq!(*pending.await.unwrap().unwrap(), 1);
    assert!(!client.contains(&key));
}

#[tokio::test(start_paused = true)]
async fn unobserved_entries_are_evicted_after_cache_time() {
    let client = QueryClient::with_config(QueryClientConfig {
        cache_time: Duration::from_secs(60),
        ..QueryClientConfig::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));
    let key = query_key!["leads", "stats"];

    client.fetch_query(key.clone(), counted(&calls, 1u32, ms(0)), Duration::ZERO).await.unwrap();

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert!(client.contains(&key));
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!client.contains(&key));
}

#[test]
fn collect_garbage_keeps_observed_entries() {
    let client = QueryClient::with_config(QueryClientConfig {
        cache_time: Duration::ZERO,
        ..QueryClientConfig::default()
    });
    client.set_query_data(query_key!["users"], 1u32);
    let observer = QueryObserver::new(
        &client,
        query_key!["teams"],
        || async { Ok(1u32) },
        QueryOptions::default(),
    );
    client.set_query_data(query_key!["teams"], 2u32);

    assert_eq!(client.collect_garbage(), 1);
    assert!(client.contains(observer.key()));
    assert!(!client.contains(&query_key!["users"]));
}

#[tokio::test(start_paused = true)]
async fn clear_empties_the_cache() {
    let client = QueryClient::new();
    client.set_query_data(query_key!["leads"], 1u32);
    client.set_query_data(query_key!["clients"], 1u32);
    assert_eq!(client.len(), 2);

    client.clear();
    assert!(client.is_empty());
}
