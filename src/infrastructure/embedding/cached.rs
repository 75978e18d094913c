//! Cache-aside embedding of query text

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::EmbeddingConfig;
use crate::domain::cache::{EmbeddingCache, EmbeddingCacheKey};
use crate::domain::embedding::{prepare_input, EmbeddingProvider, EmbeddingRequest};
use crate::domain::{DomainError, ProviderErrorKind};
use crate::infrastructure::observability::{record_cache_lookup, record_embedding_request};

/// Turns query text into a vector, consulting the cache first
///
/// Text is normalized and truncated before hashing so logically identical
/// queries share an entry. Cache failures are logged and treated as misses.
/// Provider failures are returned as-is and never cached. Concurrent misses
/// for the same text each call the provider.
#[derive(Debug, Clone)]
pub struct CachedEmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Arc<dyn EmbeddingCache>,
    model: String,
    dimensions: Option<usize>,
    max_input_chars: usize,
    timeout: Duration,
}

impl CachedEmbeddingService {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        cache: Arc<dyn EmbeddingCache>,
        config: &EmbeddingConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            model: config.model.clone(),
            dimensions: Some(config.dimensions),
            max_input_chars: config.max_input_chars,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Text as it is hashed and sent to the provider
    pub fn prepare(&self, text: &str) -> String {
        prepare_input(text, self.max_input_chars)
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let prepared = self.prepare(text);

        if prepared.is_empty() {
            return Err(DomainError::validation("Query text must not be empty"));
        }

        let key = EmbeddingCacheKey::for_text(&prepared);

        match self.cache.get(&key) {
            Ok(Some(vector)) => {
                debug!(key = %key, "Embedding cache hit");
                record_cache_lookup(true);
                return Ok(vector);
            }
            Ok(None) => debug!(key = %key, "Embedding cache miss"),
            Err(e) => warn!(key = %key, error = %e, "Embedding cache read failed, fetching"),
        }
        record_cache_lookup(false);

        let vector = self.fetch(prepared).await?;

        if let Err(e) = self.cache.insert(key.clone(), vector.clone()) {
            warn!(key = %key, error = %e, "Embedding cache write failed");
        }

        Ok(vector)
    }

    async fn fetch(&self, prepared: String) -> Result<Vec<f32>, DomainError> {
        let provider = self.provider.provider_name();
        let mut request = EmbeddingRequest::new(self.model.clone(), prepared);
        if let Some(dims) = self.dimensions {
            request = request.with_dimensions(dims);
        }

        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.provider.embed(request)).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::provider_timeout(
                provider,
                self.timeout.as_millis() as u64,
            )),
        };

        let status = match &result {
            Ok(_) => "success".to_string(),
            Err(e) => e
                .provider_kind()
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "error".to_string()),
        };
        record_embedding_request(provider, &status, started.elapsed());

        let response = result?;
        let vector = response.into_first_vector().ok_or_else(|| {
            DomainError::provider(
                provider,
                ProviderErrorKind::MalformedInput,
                "Embedding response contained no vectors",
            )
        })?;

        if let Some(expected) = self.dimensions {
            if vector.len() != expected {
                return Err(DomainError::provider(
                    provider,
                    ProviderErrorKind::MalformedInput,
                    format!("Expected {} dimensions, got {}", expected, vector.len()),
                ));
            }
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::FailingCache;
    use crate::domain::clock::ManualClock;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::infrastructure::cache::{EmbeddingCacheConfig, LruEmbeddingCache};
    use chrono::Utc;

    const DIMS: usize = 8;

    fn config() -> EmbeddingConfig {
        EmbeddingConfig {
            api_key: "sk-test".to_string(),
            dimensions: DIMS,
            max_input_chars: 32,
            timeout_ms: 200,
            ..Default::default()
        }
    }

    fn lru_cache() -> Arc<LruEmbeddingCache> {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        Arc::new(LruEmbeddingCache::new(&EmbeddingCacheConfig::default(), clock).unwrap())
    }

    fn service(
        provider: Arc<MockEmbeddingProvider>,
        cache: Arc<dyn EmbeddingCache>,
    ) -> CachedEmbeddingService {
        CachedEmbeddingService::new(provider, cache, &config())
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let provider = Arc::new(
            MockEmbeddingProvider::new(DIMS).failing_after(1, ProviderErrorKind::ServerError),
        );
        let service = service(provider.clone(), lru_cache());

        let first = service.embed("epinephrine dose for anaphylaxis").await.unwrap();
        let second = service.embed("epinephrine dose for anaphylaxis").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_variants_share_entry() {
        let provider = Arc::new(MockEmbeddingProvider::new(DIMS));
        let service = service(provider.clone(), lru_cache());

        service.embed("chest  pain\n").await.unwrap();
        service.embed("  chest pain").await.unwrap();

        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_truncation_is_stable() {
        let provider = Arc::new(MockEmbeddingProvider::new(DIMS));
        let service = service(provider.clone(), lru_cache());
        let long = "a".repeat(32);

        service.embed(&format!("{}tail one", long)).await.unwrap();
        service.embed(&format!("{}tail two", long)).await.unwrap();

        assert_eq!(service.prepare(&format!("{}xyz", long)), long);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let provider =
            Arc::new(MockEmbeddingProvider::new(DIMS).with_error(ProviderErrorKind::RateLimited));
        let cache = lru_cache();
        let service = service(provider.clone(), cache.clone());

        let err = service.embed("query").await.unwrap_err();

        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::RateLimited));
        assert_eq!(cache.len().unwrap(), 0);

        service.embed("query").await.unwrap_err();
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_cache_failure_falls_through() {
        let provider = Arc::new(MockEmbeddingProvider::new(DIMS));
        let service = service(provider.clone(), Arc::new(FailingCache));

        let vector = service.embed("query").await.unwrap();

        assert_eq!(vector.len(), DIMS);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let provider = Arc::new(
            MockEmbeddingProvider::new(DIMS).with_delay(Duration::from_millis(2_000)),
        );
        let cache = lru_cache();
        let service = service(provider, cache.clone());

        let err = service.embed("query").await.unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_wrong_dimensions_rejected() {
        let provider = Arc::new(MockEmbeddingProvider::new(DIMS + 1));
        let service = service(provider, lru_cache());

        let err = service.embed("query").await.unwrap_err();

        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::MalformedInput));
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let provider = Arc::new(MockEmbeddingProvider::new(DIMS));
        let service = service(provider.clone(), lru_cache());

        let err = service.embed("   \n ").await.unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert_eq!(provider.call_count(), 0);
    }
}
