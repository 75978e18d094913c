//! Prometheus metrics infrastructure

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use regex::Regex;

use super::config::MetricsConfig;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("protocol_retrieval_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record an embedding cache lookup
pub fn record_cache_lookup(hit: bool) {
    if hit {
        counter!("embedding_cache_hits_total").increment(1);
    } else {
        counter!("embedding_cache_misses_total").increment(1);
    }
}

pub fn record_cache_evictions(count: u64) {
    counter!("embedding_cache_evictions_total").increment(count);
}

/// Record one call to the embedding provider
pub fn record_embedding_request(provider: &str, status: &str, duration: Duration) {
    let labels = [
        ("provider", provider.to_string()),
        ("status", status.to_string()),
    ];

    counter!("embedding_provider_requests_total", &labels).increment(1);
    histogram!("embedding_provider_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record an end-to-end retrieval
pub fn record_retrieval(outcome: &str, intent: &str, duration: Duration) {
    let labels = [
        ("outcome", outcome.to_string()),
        ("intent", intent.to_string()),
    ];

    histogram!("retrieval_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record a rate limit decision
pub fn record_rate_limit_decision(tier: &str, allowed: bool) {
    let labels = [
        ("tier", tier.to_string()),
        ("outcome", if allowed { "allowed" } else { "rejected" }.to_string()),
    ];

    counter!("rate_limit_decisions_total", &labels).increment(1);
}

pub fn record_rate_limit_degraded(backend: &str) {
    counter!("rate_limit_backend_degraded_total", "backend" => backend.to_string()).increment(1);
}

fn id_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();

    PATTERNS.get_or_init(|| {
        [
            (
                r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
                "{id}",
            ),
            (r"/\d+(/|$)", "/{id}$1"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
        .collect()
    })
}

/// Sanitize URL path for metric labels (remove IDs, limit cardinality)
fn sanitize_path(path: &str) -> String {
    let mut path = path.to_string();

    for (pattern, replacement) in id_patterns() {
        path = pattern.replace_all(&path, *replacement).into_owned();
    }

    if path.len() > 50 {
        let mut end = 50;
        while !path.is_char_boundary(end) {
            end -= 1;
        }
        path.truncate(end);
    }

    path
}
