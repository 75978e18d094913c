//! Retrieval service - quota-gated, jurisdiction-aware protocol search

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::jurisdiction::{
    InheritanceChain, InheritanceResolver, JurisdictionId, LevelCoverage,
};
use crate::domain::rate_limit::{Identity, RateLimitDecision};
use crate::domain::search::{Candidate, IntentTier, QueryClassifier, SearchQuery};
use crate::domain::DomainError;
use crate::infrastructure::embedding::CachedEmbeddingService;
use crate::infrastructure::observability::record_retrieval;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::search::VectorSearchEngine;

/// A protocol search on behalf of a caller
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub jurisdiction_id: JurisdictionId,
}

/// Ranked results with their jurisdiction provenance
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResponse {
    pub results: Vec<Candidate>,
    pub intent: IntentTier,
    pub multi_part: bool,
    /// Chain level the results came from; absent when nothing passed the floor
    pub source_jurisdiction: Option<JurisdictionId>,
    pub inherited: bool,
    pub chain: InheritanceChain,
    pub coverage: Vec<LevelCoverage>,
}

/// Result of a search attempt that got past input handling
#[derive(Debug, Clone)]
pub enum RetrievalOutcome {
    /// Rejected by the rate limiter; no work was done
    Limited(RateLimitDecision),
    Completed {
        decision: RateLimitDecision,
        response: RetrievalResponse,
    },
}

/// Orchestrates rate limiting, chain resolution, embedding and ranked search
#[derive(Debug, Clone)]
pub struct RetrievalService {
    limiter: Arc<RateLimiter>,
    resolver: Arc<InheritanceResolver>,
    classifier: Arc<QueryClassifier>,
    embedder: Arc<CachedEmbeddingService>,
    engine: Arc<VectorSearchEngine>,
}

impl RetrievalService {
    pub fn new(
        limiter: Arc<RateLimiter>,
        resolver: Arc<InheritanceResolver>,
        classifier: Arc<QueryClassifier>,
        embedder: Arc<CachedEmbeddingService>,
        engine: Arc<VectorSearchEngine>,
    ) -> Self {
        Self {
            limiter,
            resolver,
            classifier,
            embedder,
            engine,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn engine(&self) -> &VectorSearchEngine {
        &self.engine
    }

    /// Run one search for `identity`
    ///
    /// The quota is consumed before any other work. Candidates are retrieved
    /// per level of the inheritance chain, then narrowed to the nearest level
    /// that has floor-passing content and capped at the result count.
    pub async fn search(
        &self,
        identity: &Identity,
        request: SearchRequest,
    ) -> Result<RetrievalOutcome, DomainError> {
        let started = Instant::now();

        let decision = self.limiter.check(identity).await;
        if !decision.allowed {
            record_retrieval("limited", "none", started.elapsed());
            return Ok(RetrievalOutcome::Limited(decision));
        }

        let query = self
            .classifier
            .classify(&request.query, request.jurisdiction_id);
        let intent = query.intent;

        let result = self.run(&query).await;
        let outcome = match &result {
            Ok(response) if response.results.is_empty() => "empty",
            Ok(_) => "completed",
            Err(_) => "error",
        };
        record_retrieval(outcome, &intent.to_string(), started.elapsed());

        let response = result?;

        info!(
            identity = %identity,
            jurisdiction = %query.jurisdiction_id,
            intent = %intent,
            results = response.results.len(),
            inherited = response.inherited,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Protocol search completed"
        );

        Ok(RetrievalOutcome::Completed { decision, response })
    }

    async fn run(&self, query: &SearchQuery) -> Result<RetrievalResponse, DomainError> {
        let chain = self.resolver.resolve(&query.jurisdiction_id).await?;
        let vector = self.embedder.embed(&query.text).await?;

        let candidates = self
            .engine
            .retrieve_by_level(&vector, query, &chain.scope())
            .await?;
        let coverage = InheritanceResolver::coverage_in(&chain, &candidates);

        let response = match InheritanceResolver::select(&chain, candidates) {
            Some(selection) => {
                debug!(
                    source = %selection.source.jurisdiction_id,
                    rank = selection.source.rank,
                    "Selected nearest covered jurisdiction"
                );

                RetrievalResponse {
                    results: self.engine.truncate(selection.candidates, query.multi_part),
                    intent: query.intent,
                    multi_part: query.multi_part,
                    source_jurisdiction: Some(selection.source.jurisdiction_id),
                    inherited: selection.inherited,
                    chain,
                    coverage,
                }
            }
            None => RetrievalResponse {
                results: Vec::new(),
                intent: query.intent,
                multi_part: query.multi_part,
                source_jurisdiction: None,
                inherited: false,
                chain,
                coverage,
            },
        };

        Ok(response)
    }
}
