//! End-to-end tests for the feed API.
//!
//! These drive the full router with scripted providers and summary backends,
//! exercising collection, sampling, summarization, and the HTTP contract.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use researchnow_feed::cache::TieredCache;
use researchnow_feed::config::{CacheConfig, FeedConfig, SummarizerConfig};
use researchnow_feed::feed::{Aggregator, FeedService, QueryPlanner};
use researchnow_feed::models::{ProviderId, SummarySections};
use researchnow_feed::providers::mock::{make_paper, MockProvider};
use researchnow_feed::providers::ProviderRegistry;
use researchnow_feed::server::router;
use researchnow_feed::summarizer::{BackendError, SummaryBackend, SummaryGenerator};
use researchnow_feed::utils::RetryPolicy;
use researchnow_feed::CanonicalPaper;

#[derive(Debug)]
struct CountingBackend {
    calls: AtomicU32,
    healthy: bool,
}

#[async_trait]
impl SummaryBackend for CountingBackend {
    fn model(&self) -> &str {
        "counting"
    }

    async fn generate(
        &self,
        title: &str,
        _abstract_text: &str,
    ) -> Result<SummarySections, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.healthy {
            return Err(BackendError::Http("backend offline".to_string()));
        }
        Ok(SummarySections {
            key_findings: vec![format!("Main result of {title}")],
            methodology: "Empirical evaluation.".to_string(),
            impact: "Broad applicability.".to_string(),
            conclusion: "The approach works.".to_string(),
        })
    }
}

fn build_router(papers: Vec<CanonicalPaper>, backend: Option<Arc<dyn SummaryBackend>>) -> Router {
    let mut registry = ProviderRegistry::empty();
    registry.register(Arc::new(MockProvider::returning(
        ProviderId::Other("mock".to_string()),
        papers,
    )));

    let config = FeedConfig::default();
    let cache = TieredCache::new(&CacheConfig::default());
    let aggregator = Aggregator::new(
        Arc::new(registry),
        QueryPlanner::new(),
        cache.clone(),
        &config,
    );
    let summarizer = match backend {
        Some(backend) => SummaryGenerator::with_backend(
            backend,
            cache,
            50,
            RetryPolicy {
                max_attempts: 2,
                initial_delay: Duration::from_millis(1),
                backoff_multiplier: 2.0,
            },
        ),
        None => SummaryGenerator::from_config(&SummarizerConfig::default(), cache),
    };
    router(Arc::new(FeedService::new(aggregator, summarizer, &config)))
}

fn paper_set(n: usize) -> Vec<CanonicalPaper> {
    (0..n)
        .map(|i| make_paper(&format!("{i}"), &format!("Integration Paper {i}"), 100 + i as u32))
        .collect()
}

async fn get_json(router: Router, uri: &str, session: Option<&str>) -> serde_json::Value {
    let mut builder = Request::builder().uri(uri);
    if let Some(id) = session {
        builder = builder.header("x-session-id", id);
    }
    let response = router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_feed_with_healthy_backend_is_complete() {
    let backend = Arc::new(CountingBackend {
        calls: AtomicU32::new(0),
        healthy: true,
    });
    let router = build_router(paper_set(20), Some(backend.clone()));

    let json = get_json(router, "/papers/random?count=4&field=Computer%20Science", None).await;
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 4);

    for item in items {
        assert_eq!(item["summary"]["status"], "complete");
        assert_eq!(item["summary"]["model"], "counting");
        assert!(item["summary"]["sections"]["key_findings"]
            .as_array()
            .unwrap()
            .len()
            > 0);
        assert!(item["title"].as_str().unwrap().starts_with("Integration"));
        assert!(item["citation_count"].as_u64().unwrap() >= 100);
    }
    assert_eq!(backend.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_feed_with_broken_backend_degrades_every_item() {
    let backend = Arc::new(CountingBackend {
        calls: AtomicU32::new(0),
        healthy: false,
    });
    let router = build_router(paper_set(10), Some(backend));

    let json = get_json(router, "/papers/random?count=3", None).await;
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 3);

    for item in items {
        assert_eq!(item["summary"]["status"], "degraded");
        // Placeholder sections are still fully populated
        assert!(!item["summary"]["sections"]["methodology"]
            .as_str()
            .unwrap()
            .is_empty());
        assert!(item["summary"]["model"].is_null());
    }
}

#[tokio::test]
async fn test_session_header_makes_draws_non_repeating() {
    let router = build_router(paper_set(12), None);

    let mut titles = std::collections::HashSet::new();
    for _ in 0..3 {
        let json = get_json(
            router.clone(),
            "/papers/random?count=4",
            Some("integration-session"),
        )
        .await;
        for item in json.as_array().unwrap() {
            let title = item["title"].as_str().unwrap().to_string();
            assert!(titles.insert(title), "session repeated a paper");
        }
    }
    assert_eq!(titles.len(), 12);

    // Pool exhausted for this session: empty array, still 200
    let json = get_json(
        router,
        "/papers/random?count=4",
        Some("integration-session"),
    )
    .await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let router = build_router(paper_set(6), None);

    let first = get_json(router.clone(), "/papers/random?count=6", Some("alpha")).await;
    assert_eq!(first.as_array().unwrap().len(), 6);

    // A different session still sees the full pool
    let second = get_json(router, "/papers/random?count=6", Some("beta")).await;
    assert_eq!(second.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_repeat_request_reuses_cached_summaries() {
    let backend = Arc::new(CountingBackend {
        calls: AtomicU32::new(0),
        healthy: true,
    });
    let router = build_router(paper_set(5), Some(backend.clone()));

    // Two sessionless requests over a 5-paper pool cover the same papers
    let first = get_json(router.clone(), "/papers/random?count=5", None).await;
    assert_eq!(first.as_array().unwrap().len(), 5);
    let after_first = backend.calls.load(Ordering::SeqCst);
    assert_eq!(after_first, 5);

    let second = get_json(router, "/papers/random?count=5", None).await;
    assert_eq!(second.as_array().unwrap().len(), 5);
    assert_eq!(backend.calls.load(Ordering::SeqCst), after_first);
}

#[tokio::test]
async fn test_unknown_field_yields_empty_array() {
    // The mock provider returns papers for any query, so use an empty
    // registry to model a field with no results
    let registry = ProviderRegistry::empty();
    let config = FeedConfig::default();
    let cache = TieredCache::new(&CacheConfig::default());
    let aggregator = Aggregator::new(
        Arc::new(registry),
        QueryPlanner::new(),
        cache.clone(),
        &config,
    );
    let summarizer = SummaryGenerator::from_config(&SummarizerConfig::default(), cache);
    let router = router(Arc::new(FeedService::new(aggregator, summarizer, &config)));

    let json = get_json(router, "/papers/random?field=Underwater%20Basketry", None).await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_health() {
    let router = build_router(Vec::new(), None);
    let json = get_json(router, "/health", None).await;
    assert_eq!(json["status"], "healthy");
}
