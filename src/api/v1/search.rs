//! Protocol search endpoint

use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response};
use tracing::debug;

use crate::api::middleware::CallerIdentity;
use crate::api::state::AppState;
use crate::api::types::{
    rate_limit_headers, ApiError, Json, SearchRequestBody, SearchResponseBody,
};
use crate::domain::jurisdiction::JurisdictionId;
use crate::infrastructure::services::{RetrievalOutcome, SearchRequest};

/// POST /v1/search
pub async fn search(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Json(body): Json<SearchRequestBody>,
) -> Result<Response, ApiError> {
    let jurisdiction_id = JurisdictionId::new(body.jurisdiction_id)
        .map_err(|e| ApiError::from(e).with_param("jurisdiction_id"))?;

    if body.query.trim().is_empty() {
        return Err(ApiError::bad_request("Query must not be empty").with_param("query"));
    }

    debug!(identity = %identity, jurisdiction = %jurisdiction_id, "Protocol search requested");

    let outcome = state
        .retrieval
        .search(
            &identity,
            SearchRequest {
                query: body.query,
                jurisdiction_id,
            },
        )
        .await?;

    let now = state.clock.now();

    match outcome {
        RetrievalOutcome::Limited(decision) => Err(ApiError::rate_limited(format!(
            "Rate limit exceeded for tier '{}'; retry after {} seconds",
            decision.tier,
            decision.retry_after_secs(now)
        ))
        .with_headers(rate_limit_headers(&decision, now))),
        RetrievalOutcome::Completed { decision, response } => {
            let headers = rate_limit_headers(&decision, now);
            let body = SearchResponseBody::new(response, &decision);

            Ok((StatusCode::OK, headers, Json(body)).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use crate::api::state::mock::test_state;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::search::ChunkMatch;
    use crate::infrastructure::rate_limit::InMemoryCounterStore;
    use crate::infrastructure::search::InMemoryVectorIndex;

    const QUERY: &str = "cpr technique for adult patients";

    async fn app() -> Router {
        let index = Arc::new(InMemoryVectorIndex::new());
        index
            .upsert(
                ChunkMatch::new(
                    "cpr-1",
                    "cardiac-arrest",
                    JurisdictionId::new("state-x").unwrap(),
                    0.0,
                )
                .with_title("Cardiac Arrest")
                .with_section("Treatment")
                .with_content("Adult CPR at 100-120 compressions per minute"),
                vec![1.0, 0.0],
            )
            .await
            .unwrap();

        let state = test_state(
            index,
            Arc::new(InMemoryCounterStore::new()),
            Arc::new(MockEmbeddingProvider::new(2).with_vector(QUERY, vec![1.0, 0.0])),
            2,
        );

        Router::new()
            .route("/v1/search", post(search))
            .with_state(state)
    }

    fn request(body: serde_json::Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/search")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_inherited_results() {
        let response = app()
            .await
            .oneshot(request(
                serde_json::json!({"query": QUERY, "jurisdiction_id": "county-a"}),
                Some("u-1:pro"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-limit"], "60");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "59");

        let body = json_body(response).await;
        assert_eq!(body["source_jurisdiction"], "state-x");
        assert_eq!(body["inherited"], true);
        assert_eq!(body["intent"], "procedure");
        assert_eq!(body["results"][0]["chunk_id"], "cpr-1");
        assert_eq!(body["results"][0]["jurisdiction_level"], "state");
        assert_eq!(body["chain"].as_array().unwrap().len(), 2);
        assert_eq!(body["rate_limit"]["tier"], "pro");
    }

    #[tokio::test]
    async fn test_anonymous_caller_is_limited_with_headers() {
        let app = app().await;
        let body = serde_json::json!({"query": QUERY, "jurisdiction_id": "county-a"});

        for _ in 0..5 {
            let response = app.clone().oneshot(request(body.clone(), None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.oneshot(request(body, Some("garbage"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
        assert_eq!(response.headers()["retry-after"], "60");
        let body = json_body(response).await;
        assert_eq!(body["error"]["type"], "rate_limit_error");
    }

    #[tokio::test]
    async fn test_unknown_jurisdiction_is_404() {
        let response = app()
            .await
            .oneshot(request(
                serde_json::json!({"query": QUERY, "jurisdiction_id": "nowhere"}),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blank_query_is_400() {
        let response = app()
            .await
            .oneshot(request(
                serde_json::json!({"query": "   ", "jurisdiction_id": "county-a"}),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["param"], "query");
    }
}
