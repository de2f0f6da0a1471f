//! Behavior-driven tests for the cache-first retrying fetcher
//!
//! These tests verify what a caller observes when fetching remote data:
//! which requests reach the network, what ends up on disk, and how failures
//! surface.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::tempdir;
use tickvault_core::{
    CacheStore, FetchError, FetchSource, Fetcher, FetcherConfig, FundamentalsEndpoint,
    HttpError, HttpResponse, RetryConfig, ScriptedHttpClient, Symbol, ThrottlingQueue,
};

fn fetcher_with(
    client: Arc<ScriptedHttpClient>,
    root: &std::path::Path,
    per_minute: u32,
) -> Fetcher {
    Fetcher::new(
        client,
        CacheStore::new(root),
        ThrottlingQueue::per_minute(per_minute),
        FetcherConfig {
            fundamentals_base_url: String::from("https://fmp.test/api"),
            fx_base_url: String::from("https://fx.test"),
            api_key: Some(String::from("test-key")),
            retry: RetryConfig::fixed(Duration::from_millis(5), 3),
            ..FetcherConfig::default()
        },
    )
}

fn symbol(value: &str) -> Symbol {
    Symbol::parse(value).expect("valid symbol")
}

// =============================================================================
// Retry and exhaustion
// =============================================================================

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    // Given: the upstream fails twice, then answers
    let client = Arc::new(ScriptedHttpClient::new().respond_sequence(
        "/v3/income-statement/AAPL",
        vec![
            Err(HttpError::new("connection reset")),
            Ok(HttpResponse::with_status(503, "unavailable")),
            Ok(HttpResponse::ok_json(r#"[{"revenue":1}]"#)),
        ],
    ));
    let dir = tempdir().expect("tempdir");
    let fetcher = fetcher_with(client.clone(), dir.path(), 60_000);
    let job = FundamentalsEndpoint::IncomeStatement.job(&symbol("AAPL"));

    // When: the resource is fetched
    let fetched = fetcher.fetch(&job).await.expect("third attempt succeeds");

    // Then: exactly three requests were made and the good body is cached
    assert_eq!(client.request_count(), 3);
    assert_eq!(fetched.source, FetchSource::Network);
    assert_eq!(
        fetcher.cache().read(&job.key).expect("cached"),
        br#"[{"revenue":1}]"#
    );
}

#[tokio::test]
async fn exhausted_retries_report_key_and_endpoint_and_write_nothing() {
    // Given: the upstream keeps answering with its in-band error marker
    let client = Arc::new(ScriptedHttpClient::new().respond(
        "/v3/ratios/MSFT",
        HttpResponse::ok_json(r#"{"Error Message":"Limit Reach . Please upgrade your plan"}"#),
    ));
    let dir = tempdir().expect("tempdir");
    let fetcher = fetcher_with(client.clone(), dir.path(), 60_000);
    let job = FundamentalsEndpoint::Ratios.job(&symbol("MSFT"));

    // When: the resource is fetched
    let err = fetcher.fetch(&job).await.expect_err("all attempts fail");

    // Then: the error names the key and endpoint
    match &err {
        FetchError::Exhausted {
            key,
            endpoint,
            attempts,
            ..
        } => {
            assert_eq!(key.as_str(), "fundamentals/MSFT/ratios.json");
            assert_eq!(endpoint, "/v3/ratios/MSFT");
            assert_eq!(*attempts, 3);
        }
        other => panic!("expected exhaustion, got {other}"),
    }

    // And: nothing was written
    assert_eq!(client.request_count(), 3);
    assert!(!fetcher.cache().exists(&job.key));
    assert!(!dir.path().join("fundamentals/MSFT/ratios.json").exists());
}

#[tokio::test]
async fn error_message_never_contains_the_api_key() {
    let client =
        Arc::new(ScriptedHttpClient::new().with_fallback(HttpResponse::with_status(500, "")));
    let dir = tempdir().expect("tempdir");
    let fetcher = fetcher_with(client, dir.path(), 60_000);

    let err = fetcher
        .fetch(&FundamentalsEndpoint::Profile.job(&symbol("AAPL")))
        .await
        .expect_err("server error");

    assert!(!err.to_string().contains("test-key"));
}

// =============================================================================
// Cache
// =============================================================================

#[tokio::test]
async fn cached_resource_is_served_without_network() {
    // Given: a resource already on disk
    let client = Arc::new(ScriptedHttpClient::new());
    let dir = tempdir().expect("tempdir");
    let fetcher = fetcher_with(client.clone(), dir.path(), 60_000);
    let job = FundamentalsEndpoint::Profile.job(&symbol("KO"));
    fetcher.cache().write(&job.key, b"[]").expect("seed");

    // When: it is fetched twice
    let first = fetcher.fetch(&job).await.expect("cached");
    let second = fetcher.fetch(&job).await.expect("cached");

    // Then: no request reaches the network
    assert_eq!(first.source, FetchSource::Cache);
    assert_eq!(second.body, b"[]");
    assert_eq!(client.request_count(), 0);
}

#[tokio::test]
async fn missing_api_key_fails_fast_for_uncached_fundamentals() {
    let client = Arc::new(ScriptedHttpClient::new().with_fallback(HttpResponse::ok_json("[]")));
    let dir = tempdir().expect("tempdir");
    let fetcher = Fetcher::new(
        client.clone(),
        CacheStore::new(dir.path()),
        ThrottlingQueue::per_minute(60_000),
        FetcherConfig::default(),
    );

    let err = fetcher
        .fetch(&FundamentalsEndpoint::Profile.job(&symbol("AAPL")))
        .await
        .expect_err("no key configured");

    assert!(matches!(err, FetchError::MissingApiKey { .. }));
    assert_eq!(client.request_count(), 0);
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn uncached_fetches_are_spaced_by_the_rate_limit() {
    // Given: a limit of 1200 requests per minute (one every 50ms)
    let client = Arc::new(ScriptedHttpClient::new().with_fallback(HttpResponse::ok_json("[]")));
    let dir = tempdir().expect("tempdir");
    let fetcher = fetcher_with(client.clone(), dir.path(), 1_200);

    // When: five distinct resources are fetched against an empty cache
    let started = Instant::now();
    for ticker in ["A", "B", "C", "D", "E"] {
        fetcher
            .fetch(&FundamentalsEndpoint::Profile.job(&symbol(ticker)))
            .await
            .expect("fetch");
    }

    // Then: the run takes at least (K - 1) periods
    assert!(started.elapsed() >= Duration::from_millis(195));
    assert_eq!(client.request_count(), 5);
}
