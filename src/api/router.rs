use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::v1;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create the full router with application state
pub fn create_router(
    state: AppState,
    metrics: Option<PrometheusMetrics>,
    metrics_path: &str,
) -> Router {
    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Versioned API
        .nest("/v1", v1::create_v1_router())
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http());

    if let Some(m) = metrics {
        router = router.merge(create_metrics_router(m, metrics_path));
    }

    router
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::api::state::mock::test_state;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::search::MockVectorIndex;
    use crate::infrastructure::rate_limit::InMemoryCounterStore;

    fn router() -> Router {
        create_router(
            test_state(
                Arc::new(MockVectorIndex::new(vec![])),
                Arc::new(InMemoryCounterStore::new()),
                Arc::new(MockEmbeddingProvider::new(2)),
                2,
            ),
            None,
            "/metrics",
        )
    }

    async fn status(uri: &str) -> StatusCode {
        router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_probe_routes() {
        assert_eq!(status("/health").await, StatusCode::OK);
        assert_eq!(status("/live").await, StatusCode::OK);
        assert_eq!(status("/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_search_requires_post() {
        assert_eq!(status("/v1/search").await, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_metrics_route_absent_when_disabled() {
        assert_eq!(status("/metrics").await, StatusCode::NOT_FOUND);
    }
}
