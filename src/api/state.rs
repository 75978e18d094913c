//! Application state for shared services

use std::sync::Arc;

use crate::domain::cache::EmbeddingCache;
use crate::domain::clock::Clock;
use crate::domain::rate_limit::IdentityResolver;
use crate::infrastructure::services::RetrievalService;

/// Application state shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub retrieval: Arc<RetrievalService>,
    pub identity: Arc<IdentityResolver>,
    pub cache: Arc<dyn EmbeddingCache>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        retrieval: Arc<RetrievalService>,
        identity: Arc<IdentityResolver>,
        cache: Arc<dyn EmbeddingCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            retrieval,
            identity,
            cache,
            clock,
        }
    }
}

#[cfg(test)]
pub mod mock {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::clock::ManualClock;
    use crate::domain::embedding::EmbeddingProvider;
    use crate::domain::jurisdiction::{
        InheritanceResolver, Jurisdiction, JurisdictionId, JurisdictionLevel,
    };
    use crate::domain::ranking::{RankingConfig, ReRanker};
    use crate::domain::rate_limit::{CounterStore, RateLimitConfig, StaticTokenVerifier};
    use crate::domain::search::{QueryClassifier, SearchConfig, VectorIndex};
    use crate::infrastructure::cache::{EmbeddingCacheConfig, LruEmbeddingCache};
    use crate::infrastructure::embedding::{CachedEmbeddingService, EmbeddingConfig};
    use crate::infrastructure::jurisdiction::InMemoryJurisdictionRepository;
    use crate::infrastructure::rate_limit::RateLimiter;
    use crate::infrastructure::search::VectorSearchEngine;

    /// State over a two-level hierarchy: `county-a` -> `state-x`
    ///
    /// Bearer tokens take the form `<user_id>:<tier>`.
    pub fn test_state(
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn CounterStore>,
        provider: Arc<dyn EmbeddingProvider>,
        dimensions: usize,
    ) -> AppState {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        ));
        let cache: Arc<dyn EmbeddingCache> = Arc::new(
            LruEmbeddingCache::new(&EmbeddingCacheConfig::default(), clock.clone()).unwrap(),
        );
        let embedder = CachedEmbeddingService::new(
            provider,
            cache.clone(),
            &EmbeddingConfig {
                api_key: "test".to_string(),
                dimensions,
                ..Default::default()
            },
        );

        let state_x = JurisdictionId::new("state-x").unwrap();
        let repository = InMemoryJurisdictionRepository::with_jurisdictions(vec![
            Jurisdiction::new(state_x.clone(), "State X", JurisdictionLevel::State),
            Jurisdiction::new(
                JurisdictionId::new("county-a").unwrap(),
                "County A",
                JurisdictionLevel::Local,
            )
            .with_parent(state_x),
        ]);

        let search_config = SearchConfig::default();
        let engine = VectorSearchEngine::new(
            index,
            Arc::new(ReRanker::new(RankingConfig::default()).unwrap()),
            search_config.clone(),
        );
        let limiter = RateLimiter::new(store, RateLimitConfig::default(), clock.clone());

        let retrieval = RetrievalService::new(
            Arc::new(limiter),
            Arc::new(InheritanceResolver::new(Arc::new(repository))),
            Arc::new(QueryClassifier::new(&search_config)),
            Arc::new(embedder),
            Arc::new(engine),
        );

        AppState::new(
            Arc::new(retrieval),
            Arc::new(IdentityResolver::new(Arc::new(StaticTokenVerifier))),
            cache,
            clock,
        )
    }
}
