//! Floor-gated, re-ranked vector search

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::domain::jurisdiction::JurisdictionId;
use crate::domain::ranking::ReRanker;
use crate::domain::search::{Candidate, SearchConfig, SearchQuery, VectorIndex};
use crate::domain::DomainError;

/// Retrieves candidates for a classified query within a jurisdiction scope
#[derive(Debug, Clone)]
pub struct VectorSearchEngine {
    index: Arc<dyn VectorIndex>,
    reranker: Arc<ReRanker>,
    config: SearchConfig,
    timeout: Duration,
}

impl VectorSearchEngine {
    pub fn new(index: Arc<dyn VectorIndex>, reranker: Arc<ReRanker>, config: SearchConfig) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms);

        Self {
            index,
            reranker,
            config,
            timeout,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn index_type(&self) -> &'static str {
        self.index.index_type()
    }

    pub async fn health_check(&self) -> Result<bool, DomainError> {
        self.index.health_check().await
    }

    /// Every floor-passing candidate in `scope`, ranked
    ///
    /// Fetches the initial top-K, drops hits below the intent floor (never
    /// lower than the absolute floor), re-scores the rest and orders them by
    /// score, then effective date, then chunk ID.
    pub async fn retrieve(
        &self,
        vector: &[f32],
        query: &SearchQuery,
        scope: &[JurisdictionId],
    ) -> Result<Vec<Candidate>, DomainError> {
        let hits = tokio::time::timeout(
            self.timeout,
            self.index.query(vector, scope, self.config.initial_top_k),
        )
        .await
        .map_err(|_| {
            DomainError::provider_timeout(self.index.index_type(), self.config.timeout_ms)
        })??;

        let floor = self.config.floor_for(query.intent);
        let fetched = hits.len();

        let passing: Vec<_> = hits
            .into_iter()
            .filter(|hit| hit.similarity >= floor)
            .filter(|hit| scope.contains(&hit.jurisdiction_id))
            .collect();

        debug!(
            intent = %query.intent,
            floor,
            fetched,
            passing = passing.len(),
            "Applied similarity floor"
        );

        Ok(self.reranker.rank(passing, &query.text))
    }

    /// Floor-passing candidates for each level of `chain_scope`
    ///
    /// Each level gets its own top-K query so a crowded ancestor can never
    /// push a nearer level's hits out of the fetch window. Levels are
    /// returned in chain order, each ranked on its own.
    pub async fn retrieve_by_level(
        &self,
        vector: &[f32],
        query: &SearchQuery,
        chain_scope: &[JurisdictionId],
    ) -> Result<Vec<Candidate>, DomainError> {
        let per_level = futures::future::try_join_all(
            chain_scope
                .iter()
                .map(|level| self.retrieve(vector, query, std::slice::from_ref(level))),
        )
        .await?;

        Ok(per_level.into_iter().flatten().collect())
    }

    /// Ranked candidates capped at the result count for the query
    pub async fn search(
        &self,
        vector: &[f32],
        query: &SearchQuery,
        scope: &[JurisdictionId],
    ) -> Result<Vec<Candidate>, DomainError> {
        let mut candidates = self.retrieve(vector, query, scope).await?;
        candidates.truncate(self.config.result_count(query.multi_part));
        Ok(candidates)
    }

    /// Cap an already ranked list
    pub fn truncate(&self, mut candidates: Vec<Candidate>, multi_part: bool) -> Vec<Candidate> {
        candidates.truncate(self.config.result_count(multi_part));
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ranking::RankingConfig;
    use crate::domain::search::{ChunkMatch, IntentTier, MockVectorIndex};

    fn jid(id: &str) -> JurisdictionId {
        JurisdictionId::new(id).unwrap()
    }

    fn query(intent: IntentTier, multi_part: bool) -> SearchQuery {
        SearchQuery {
            text: "query".to_string(),
            intent,
            multi_part,
            jurisdiction_id: jid("county-a"),
        }
    }

    fn engine(index: MockVectorIndex) -> VectorSearchEngine {
        let reranker = Arc::new(ReRanker::new(RankingConfig::default()).unwrap());
        VectorSearchEngine::new(Arc::new(index), reranker, SearchConfig::default())
    }

    fn hit(chunk: &str, similarity: f32) -> ChunkMatch {
        ChunkMatch::new(chunk, "p", jid("county-a"), similarity)
    }

    #[tokio::test]
    async fn test_medication_floor_excludes_borderline_hit() {
        let engine = engine(MockVectorIndex::new(vec![hit("c", 0.36)]));

        let results = engine
            .search(&[0.0], &query(IntentTier::Medication, false), &[jid("county-a")])
            .await
            .unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_general_floor_includes_borderline_hit() {
        let engine = engine(MockVectorIndex::new(vec![hit("c", 0.36)]));

        let results = engine
            .search(&[0.0], &query(IntentTier::General, false), &[jid("county-a")])
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_absolute_floor_always_applies() {
        let engine = engine(MockVectorIndex::new(vec![hit("low", 0.19), hit("ok", 0.31)]));

        let results = engine
            .search(&[0.0], &query(IntentTier::General, false), &[jid("county-a")])
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk_id, "ok");
    }

    #[tokio::test]
    async fn test_result_count_caps() {
        let hits: Vec<_> = (0..12).map(|i| hit(&format!("c{:02}", i), 0.9)).collect();
        let engine = engine(MockVectorIndex::new(hits));

        let single = engine
            .search(&[0.0], &query(IntentTier::General, false), &[jid("county-a")])
            .await
            .unwrap();
        let multi = engine
            .search(&[0.0], &query(IntentTier::General, true), &[jid("county-a")])
            .await
            .unwrap();

        assert_eq!(single.len(), 5);
        assert_eq!(multi.len(), 8);
        assert_eq!(single[0].chunk_id, "c00");
    }

    #[tokio::test]
    async fn test_passes_scope_to_index() {
        let index = Arc::new(MockVectorIndex::new(vec![]));
        let reranker = Arc::new(ReRanker::new(RankingConfig::default()).unwrap());
        let engine = VectorSearchEngine::new(index.clone(), reranker, SearchConfig::default());
        let scope = vec![jid("county-a"), jid("region-1")];

        engine
            .retrieve(&[0.0], &query(IntentTier::General, false), &scope)
            .await
            .unwrap();

        assert_eq!(index.last_scope(), scope);
        assert_eq!(index.query_count(), 1);
    }

    #[tokio::test]
    async fn test_retrieve_by_level_queries_each_level_in_chain_order() {
        let index = Arc::new(MockVectorIndex::new(vec![
            ChunkMatch::new("state", "p", jid("state-x"), 0.9),
            ChunkMatch::new("county", "p", jid("county-a"), 0.6),
        ]));
        let reranker = Arc::new(ReRanker::new(RankingConfig::default()).unwrap());
        let engine = VectorSearchEngine::new(index.clone(), reranker, SearchConfig::default());
        let scope = vec![jid("county-a"), jid("region-1"), jid("state-x")];

        let results = engine
            .retrieve_by_level(&[0.0], &query(IntentTier::General, false), &scope)
            .await
            .unwrap();

        assert_eq!(index.query_count(), 3);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk_id, "county");
        assert_eq!(results[1].chunk_id, "state");
    }

    #[tokio::test]
    async fn test_index_timeout_is_typed() {
        let index = MockVectorIndex::new(vec![]).with_delay(Duration::from_millis(500));
        let reranker = Arc::new(ReRanker::new(RankingConfig::default()).unwrap());
        let config = SearchConfig {
            timeout_ms: 20,
            ..Default::default()
        };
        let engine = VectorSearchEngine::new(Arc::new(index), reranker, config);

        let err = engine
            .search(&[0.0], &query(IntentTier::General, false), &[jid("county-a")])
            .await
            .unwrap_err();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_index_error_surfaces() {
        let engine = engine(MockVectorIndex::failing());

        let err = engine
            .search(&[0.0], &query(IntentTier::General, false), &[jid("county-a")])
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::VectorIndex { .. }));
    }
}
