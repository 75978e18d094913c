//! Protocol Retrieval API
//!
//! Jurisdiction-aware retrieval of clinical protocol excerpts:
//! - Intent-tiered similarity floors over a vector index (memory or pgvector)
//! - Keyword and section re-ranking
//! - Local -> regional -> state inheritance fallback
//! - Cached query embeddings
//! - Per-tier windowed and daily quotas (memory or Redis counters)

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::{
    cache::EmbeddingCache,
    clock::{Clock, SystemClock},
    embedding::EmbeddingProvider,
    jurisdiction::InheritanceResolver,
    ranking::ReRanker,
    rate_limit::{CounterBackend, CounterStore, IdentityResolver},
    search::{QueryClassifier, VectorIndex},
};
use infrastructure::{
    auth::JwtTokenVerifier,
    cache::LruEmbeddingCache,
    embedding::{CachedEmbeddingService, HttpClient, OpenAiEmbeddingProvider},
    jurisdiction::InMemoryJurisdictionRepository,
    rate_limit::{InMemoryCounterStore, RateLimiter, RedisCounterStore},
    search::{InMemoryVectorIndex, PgVectorIndex, VectorIndexBackend, VectorSearchEngine},
    services::RetrievalService,
};
use tracing::info;

/// Build the application state from validated configuration
///
/// Returns the embedding cache separately so the caller can attach the
/// expiry sweeper to it.
pub async fn create_app_state(
    config: &AppConfig,
) -> anyhow::Result<(AppState, Arc<dyn EmbeddingCache>)> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let index = create_vector_index(config).await?;
    let counter_store = create_counter_store(config).await?;
    let jurisdictions = create_jurisdiction_repository(config).await?;

    let http_client = HttpClient::with_timeout(Duration::from_millis(config.embedding.timeout_ms))?;
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbeddingProvider::with_base_url(
        http_client,
        config.embedding.api_key.clone(),
        config.embedding.base_url.clone(),
    ));
    info!(
        model = %config.embedding.model,
        dimensions = config.embedding.dimensions,
        "Embedding provider configured"
    );

    let cache: Arc<dyn EmbeddingCache> =
        Arc::new(LruEmbeddingCache::new(&config.cache, clock.clone())?);
    let embedder = CachedEmbeddingService::new(provider, cache.clone(), &config.embedding);

    let reranker = ReRanker::new(config.ranking.clone())?;
    let engine = VectorSearchEngine::new(index, Arc::new(reranker), config.search.clone());
    let classifier = QueryClassifier::new(&config.search);
    let limiter = RateLimiter::new(counter_store, config.rate_limit.clone(), clock.clone());
    let resolver = InheritanceResolver::new(jurisdictions);

    let retrieval = RetrievalService::new(
        Arc::new(limiter),
        Arc::new(resolver),
        Arc::new(classifier),
        Arc::new(embedder),
        Arc::new(engine),
    );

    let identity = match JwtTokenVerifier::from_config(&config.auth) {
        Some(verifier) => {
            info!("JWT verification enabled");
            IdentityResolver::new(Arc::new(verifier))
        }
        None => {
            info!("No JWT secret configured, all callers are anonymous");
            IdentityResolver::anonymous_only()
        }
    };

    let state = AppState::new(Arc::new(retrieval), Arc::new(identity), cache.clone(), clock);

    Ok((state, cache))
}

async fn create_vector_index(config: &AppConfig) -> anyhow::Result<Arc<dyn VectorIndex>> {
    let index_config = &config.vector_index;

    match index_config.backend {
        VectorIndexBackend::Memory => {
            let index = InMemoryVectorIndex::new();

            if let Some(seed_file) = &index_config.seed_file {
                let loaded = index.load_seed_file(seed_file).await?;
                info!(seed_file = %seed_file, chunks = loaded, "Loaded protocol chunks");
            }

            info!("Vector index backend: memory");
            Ok(Arc::new(index))
        }
        VectorIndexBackend::Pgvector => {
            let index = PgVectorIndex::connect_lazy(index_config)?;
            index.ensure_schema(config.embedding.dimensions).await?;

            info!(table = %index_config.table_name, "Vector index backend: pgvector");
            Ok(Arc::new(index))
        }
    }
}

async fn create_counter_store(config: &AppConfig) -> anyhow::Result<Arc<dyn CounterStore>> {
    let rate_limit = &config.rate_limit;

    match (rate_limit.backend, rate_limit.redis_url.as_deref()) {
        (CounterBackend::Redis, Some(url)) => {
            let store = RedisCounterStore::connect(url, rate_limit.key_prefix.clone()).await?;
            info!("Rate limit counters: redis");
            Ok(Arc::new(store))
        }
        (CounterBackend::Redis, None) => {
            anyhow::bail!("rate_limit.redis_url is required for the redis backend")
        }
        (CounterBackend::Memory, _) => {
            info!("Rate limit counters: memory");
            Ok(Arc::new(InMemoryCounterStore::new()))
        }
    }
}

async fn create_jurisdiction_repository(
    config: &AppConfig,
) -> anyhow::Result<Arc<InMemoryJurisdictionRepository>> {
    let repository =
        InMemoryJurisdictionRepository::with_jurisdictions(config.jurisdictions.entries.clone());

    if let Some(file) = &config.jurisdictions.file {
        let loaded = repository.load_file(file).await?;
        info!(file = %file.display(), jurisdictions = loaded, "Loaded jurisdiction hierarchy");
    }

    Ok(Arc::new(repository))
}
