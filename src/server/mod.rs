//! HTTP API surface.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::feed::{FeedError, FeedItem, FeedService};

const MAX_COUNT: usize = 50;
const DEFAULT_COUNT: usize = 10;

#[derive(Clone)]
struct AppState {
    feed: Arc<FeedService>,
}

/// Build the API router
pub fn router(feed: Arc<FeedService>) -> Router {
    Router::new()
        .route("/papers/random", get(random_papers))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { feed })
}

/// Bind and serve until interrupted
pub async fn serve(config: &ServerConfig, feed: Arc<FeedService>) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, router(feed))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

#[derive(Debug, Deserialize)]
struct RandomParams {
    count: Option<usize>,
    field: Option<String>,
}

async fn random_papers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RandomParams>,
) -> impl IntoResponse {
    let count = params.count.unwrap_or(DEFAULT_COUNT).clamp(1, MAX_COUNT);
    let session_id = headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty());

    match state
        .feed
        .random_feed(count, params.field.as_deref(), session_id)
        .await
    {
        Ok(items) => Json(items),
        // An empty pool is not an error to the caller
        Err(FeedError::EmptyPool) => Json(Vec::<FeedItem>::new()),
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TieredCache;
    use crate::config::{CacheConfig, FeedConfig, SummarizerConfig};
    use crate::feed::{Aggregator, QueryPlanner};
    use crate::models::ProviderId;
    use crate::providers::mock::{make_paper, MockProvider};
    use crate::providers::ProviderRegistry;
    use crate::summarizer::SummaryGenerator;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_router(paper_count: usize) -> Router {
        let papers = (0..paper_count)
            .map(|i| make_paper(&format!("{i}"), &format!("Routed Paper {i}"), 100))
            .collect();

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
        let summarizer = SummaryGenerator::from_config(&SummarizerConfig::default(), cache);
        router(Arc::new(FeedService::new(aggregator, summarizer, &config)))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_random_returns_requested_count() {
        let response = test_router(30)
            .oneshot(
                Request::builder()
                    .uri("/papers/random?count=5&field=Physics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 5);
        assert!(json[0]["summary"]["status"].is_string());
    }

    #[tokio::test]
    async fn test_empty_pool_returns_empty_array_with_200() {
        let response = test_router(0)
            .oneshot(
                Request::builder()
                    .uri("/papers/random?count=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_count_is_clamped() {
        let response = test_router(200)
            .oneshot(
                Request::builder()
                    .uri("/papers/random?count=9999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json.as_array().unwrap().len() <= MAX_COUNT);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = test_router(0)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
    }
}
