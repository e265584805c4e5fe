//! Integration tests for the search manager pipeline.
//!
//! These tests drive cache lookup → fan-out → merge → cache write with stub
//! providers that count their invocations. No network access.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use invest_search::{
    CacheEntry, FailureKind, Fingerprint, ProviderError, ProviderHits, ResultRecord,
    SearchConfig, SearchManager, SearchOptions, SearchProvider, SearchRequest,
};

enum Behaviour {
    Records(Vec<ResultRecord>),
    Degraded(Vec<ResultRecord>),
    Fail(ProviderError),
    Slow(Duration, Vec<ResultRecord>),
}

struct StubProvider {
    name: &'static str,
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl StubProvider {
    fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name,
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for StubProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(
        &self,
        _query: &str,
        max_results: usize,
        _options: &SearchOptions,
    ) -> Result<ProviderHits, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let take = |records: &Vec<ResultRecord>| -> Vec<ResultRecord> {
            records.iter().take(max_results).cloned().collect()
        };
        match &self.behaviour {
            Behaviour::Records(records) => Ok(ProviderHits::full(take(records))),
            Behaviour::Degraded(records) => Ok(ProviderHits::degraded(take(records))),
            Behaviour::Fail(err) => Err(err.clone()),
            Behaviour::Slow(delay, records) => {
                tokio::time::sleep(*delay).await;
                Ok(ProviderHits::full(take(records)))
            }
        }
    }
}

fn rec(url: &str, source: &str) -> ResultRecord {
    ResultRecord {
        title: format!("{source}: {url}"),
        url: url.to_string(),
        snippet: format!("snippet from {source}"),
        source: source.to_string(),
        published_at: None,
    }
}

fn config(dir: &Path) -> SearchConfig {
    SearchConfig {
        cache_dir: dir.join("search"),
        provider_timeout_ms: 2_000,
        overall_timeout_ms: 2_500,
        user_agent: Some("TestBot/1.0".into()),
        ..Default::default()
    }
}

fn manager(cfg: &SearchConfig, providers: Vec<Arc<StubProvider>>) -> SearchManager {
    let providers: Vec<Arc<dyn SearchProvider>> = providers
        .into_iter()
        .map(|p| p as Arc<dyn SearchProvider>)
        .collect();
    SearchManager::with_providers(cfg, providers).expect("manager")
}

fn urls(records: &[ResultRecord]) -> Vec<&str> {
    records.iter().map(|r| r.url.as_str()).collect()
}

#[tokio::test]
async fn merges_in_priority_order_then_serves_from_cache() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config(tmp.path());
    let a = StubProvider::new(
        "a",
        Behaviour::Records(vec![
            rec("https://example.com/shared", "a"),
            rec("https://a.example.com/1", "a"),
            rec("https://a.example.com/2", "a"),
        ]),
    );
    let b = StubProvider::new(
        "b",
        Behaviour::Records(vec![
            rec("https://EXAMPLE.com/shared/?utm_source=b", "b"),
            rec("https://b.example.com/1", "b"),
        ]),
    );
    let manager = manager(&cfg, vec![a.clone(), b.clone()]);

    let first = manager.union_search("acme earnings", 10).await.expect("search");
    assert!(!first.from_cache);
    assert_eq!(
        urls(&first.records),
        vec![
            "https://example.com/shared",
            "https://a.example.com/1",
            "https://a.example.com/2",
            "https://b.example.com/1",
        ]
    );
    assert_eq!(first.records[0].source, "a");
    assert_eq!(first.providers_attempted, vec!["a", "b"]);
    assert_eq!(first.providers_succeeded, vec!["a", "b"]);
    assert_eq!(first.providers_used, vec!["a", "b"]);
    assert!(first.failures.is_empty());

    let second = manager.union_search("acme earnings", 10).await.expect("search");
    assert!(second.from_cache);
    assert_eq!(second.records, first.records);
    assert!(second.providers_attempted.is_empty());
    assert_eq!(second.providers_used, vec!["a", "b"]);
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
}

#[tokio::test]
async fn equivalent_queries_share_a_cache_entry() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config(tmp.path());
    let a = StubProvider::new("a", Behaviour::Records(vec![rec("https://a.com", "a")]));
    let manager = manager(&cfg, vec![a.clone()]);

    manager.union_search("ACME  Earnings", 5).await.expect("search");
    let again = manager.union_search("  acme earnings ", 5).await.expect("search");
    assert!(again.from_cache);
    assert_eq!(a.calls(), 1);

    let other_budget = manager.union_search("acme earnings", 6).await.expect("search");
    assert!(!other_budget.from_cache);
    assert_eq!(a.calls(), 2);
}

#[tokio::test]
async fn unconfigured_provider_reports_unavailable() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config(tmp.path());
    let a = StubProvider::new(
        "a",
        Behaviour::Fail(ProviderError::Unavailable("api key not configured".into())),
    );
    let b = StubProvider::new(
        "b",
        Behaviour::Records(vec![rec("https://b.com/1", "b"), rec("https://b.com/2", "b")]),
    );
    let manager = manager(&cfg, vec![a, b]);

    let result = manager.union_search("acme earnings", 10).await.expect("search");
    assert_eq!(result.records.len(), 2);
    assert!(result.records.iter().all(|r| r.source == "b"));
    let reasons = result.failure_reasons();
    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons.get("a").map(String::as_str), Some("unavailable"));
    assert_eq!(result.providers_succeeded, vec!["b"]);
}

#[tokio::test]
async fn all_failed_returns_empty_result_and_caches_it() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config(tmp.path());
    let a = StubProvider::new("a", Behaviour::Fail(ProviderError::Http("HTTP 503".into())));
    let b = StubProvider::new(
        "b",
        Behaviour::Fail(ProviderError::Unavailable("no token".into())),
    );
    let manager = manager(&cfg, vec![a.clone(), b.clone()]);

    let result = manager.union_search("acme", 5).await.expect("search never errors");
    assert!(result.records.is_empty());
    assert!(!result.from_cache);
    assert!(result.all_failed());
    let reasons = result.failure_reasons();
    assert_eq!(reasons.get("a").map(String::as_str), Some("error"));
    assert_eq!(reasons.get("b").map(String::as_str), Some("unavailable"));

    let again = manager.union_search("acme", 5).await.expect("search");
    assert!(again.from_cache);
    assert!(again.records.is_empty());
    assert!(again.providers_attempted.is_empty());
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
    assert!(manager.cache().entry_path(&Fingerprint::of(&SearchRequest::new("acme", 5))).exists());
}

#[tokio::test]
async fn validation_rejects_before_providers_or_disk() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config(tmp.path());
    let a = StubProvider::new("a", Behaviour::Records(vec![rec("https://a.com", "a")]));
    let manager = manager(&cfg, vec![a.clone()]);

    assert!(manager.union_search("acme", 0).await.is_err());
    assert!(manager.union_search("", 5).await.is_err());
    assert!(manager.union_search(" \t\n", 5).await.is_err());

    assert_eq!(a.calls(), 0);
    assert!(!cfg.cache_dir.exists());
}

#[tokio::test]
async fn stale_entry_triggers_fan_out_and_is_not_deleted_by_read() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = SearchConfig {
        cache_ttl_seconds: 60,
        ..config(tmp.path())
    };
    let a = StubProvider::new("a", Behaviour::Records(vec![rec("https://fresh.com", "a")]));
    let manager = manager(&cfg, vec![a.clone()]);

    let request = SearchRequest::new("acme", 5);
    let fingerprint = Fingerprint::of(&request);
    let stale = CacheEntry {
        fingerprint: fingerprint.clone(),
        query: "acme".into(),
        records: vec![rec("https://old.com", "a")],
        created_at: Utc::now() - chrono::Duration::hours(3),
        providers_used: vec!["a".into()],
        degraded_providers: vec![],
    };
    manager.cache().put_entry(&stale).await.expect("seed");
    let path = manager.cache().entry_path(&fingerprint);

    // Reading a stale entry directly leaves the file in place.
    assert!(manager.cache().get(&fingerprint).await.is_none());
    assert!(path.exists());

    let result = manager.search(&request).await.expect("search");
    assert!(!result.from_cache);
    assert_eq!(urls(&result.records), vec!["https://fresh.com"]);
    assert_eq!(a.calls(), 1);
    assert!(path.exists());
}

#[tokio::test]
async fn sweep_removes_stale_entries() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = SearchConfig {
        cache_ttl_seconds: 60,
        ..config(tmp.path())
    };
    let a = StubProvider::new("a", Behaviour::Records(vec![rec("https://a.com", "a")]));
    let manager = manager(&cfg, vec![a]);

    manager.union_search("fresh", 5).await.expect("search");
    let stale_fp = Fingerprint::of(&SearchRequest::new("stale", 5));
    manager
        .cache()
        .put_entry(&CacheEntry {
            fingerprint: stale_fp.clone(),
            query: "stale".into(),
            records: vec![],
            created_at: Utc::now() - chrono::Duration::days(1),
            providers_used: vec![],
            degraded_providers: vec![],
        })
        .await
        .expect("seed");

    assert_eq!(manager.sweep_cache().await.expect("sweep"), 1);
    assert!(!manager.cache().entry_path(&stale_fp).exists());
    let fresh_fp = Fingerprint::of(&SearchRequest::new("fresh", 5));
    assert!(manager.cache().entry_path(&fresh_fp).exists());
}

#[tokio::test]
async fn slow_provider_times_out_without_losing_others() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = SearchConfig {
        provider_timeout_ms: 100,
        overall_timeout_ms: 1_000,
        ..config(tmp.path())
    };
    let fast = StubProvider::new("fast", Behaviour::Records(vec![rec("https://fast.com", "fast")]));
    let slow = StubProvider::new(
        "slow",
        Behaviour::Slow(Duration::from_secs(5), vec![rec("https://slow.com", "slow")]),
    );
    let manager = manager(&cfg, vec![slow, fast]);

    let started = std::time::Instant::now();
    let result = manager.union_search("acme", 5).await.expect("search");
    assert!(started.elapsed() < Duration::from_secs(3));

    assert_eq!(urls(&result.records), vec!["https://fast.com"]);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].provider, "slow");
    assert_eq!(result.failures[0].kind, FailureKind::Timeout);
    assert!(result.failures[0].message.contains("100 ms"));
}

#[tokio::test]
async fn overall_deadline_bounds_every_provider() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = SearchConfig {
        provider_timeout_ms: 5_000,
        overall_timeout_ms: 100,
        ..config(tmp.path())
    };
    let slow = StubProvider::new(
        "slow",
        Behaviour::Slow(Duration::from_secs(5), vec![rec("https://slow.com", "slow")]),
    );
    let manager = manager(&cfg, vec![slow]);

    let result = manager.union_search("acme", 5).await.expect("search");
    assert!(result.records.is_empty());
    assert_eq!(result.failures[0].kind, FailureKind::Timeout);
    assert!(result.failures[0].message.contains("overall"));
}

#[tokio::test]
async fn degraded_provider_is_flagged_and_cached_as_such() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config(tmp.path());
    let feed = StubProvider::new(
        "gateway",
        Behaviour::Degraded(vec![rec("https://feed.example.com/1", "news-feed")]),
    );
    let manager = manager(&cfg, vec![feed]);

    let first = manager.union_search("acme", 5).await.expect("search");
    assert!(first.is_degraded());
    assert_eq!(first.degraded_providers, vec!["gateway"]);

    let cached = manager.union_search("acme", 5).await.expect("search");
    assert!(cached.from_cache);
    assert!(cached.is_degraded());
}

#[tokio::test]
async fn partial_results_are_cached() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config(tmp.path());
    let a = StubProvider::new("a", Behaviour::Fail(ProviderError::Malformed("bad json".into())));
    let b = StubProvider::new("b", Behaviour::Records(vec![rec("https://b.com", "b")]));
    let manager = manager(&cfg, vec![a.clone(), b.clone()]);

    let first = manager.union_search("acme", 5).await.expect("search");
    assert_eq!(first.failure_reasons().get("a").map(String::as_str), Some("error"));

    let second = manager.union_search("acme", 5).await.expect("search");
    assert!(second.from_cache);
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
}

#[tokio::test]
async fn merged_result_respects_max_results() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config(tmp.path());
    let a = StubProvider::new(
        "a",
        Behaviour::Records((0..4).map(|i| rec(&format!("https://a.com/{i}"), "a")).collect()),
    );
    let b = StubProvider::new(
        "b",
        Behaviour::Records((0..4).map(|i| rec(&format!("https://b.com/{i}"), "b")).collect()),
    );
    let manager = manager(&cfg, vec![a, b]);

    let result = manager.union_search("acme", 3).await.expect("search");
    assert_eq!(result.records.len(), 3);
    assert!(result.records.iter().all(|r| r.source == "a"));
    assert_eq!(result.providers_used, vec!["a"]);
}
