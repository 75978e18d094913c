//! Observability infrastructure - Metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    create_metrics_router, init_metrics, record_cache_evictions, record_cache_lookup,
    record_embedding_request, record_http_request, record_rate_limit_decision,
    record_rate_limit_degraded, record_retrieval, PrometheusMetrics,
};
