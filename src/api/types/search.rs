//! Search request and response wire types

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::jurisdiction::{InheritanceChainEntry, JurisdictionLevel, LevelCoverage};
use crate::domain::rate_limit::{RateLimitDecision, Tier};
use crate::domain::search::{Candidate, IntentTier};
use crate::infrastructure::services::RetrievalResponse;

/// POST /v1/search body
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequestBody {
    pub query: String,
    pub jurisdiction_id: String,
}

/// One ranked protocol excerpt
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub chunk_id: String,
    pub protocol_id: String,
    pub protocol_title: String,
    pub section: String,
    pub content: String,
    pub jurisdiction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction_level: Option<JurisdictionLevel>,
    pub inherited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    pub similarity: f32,
    pub score: f32,
}

impl SearchResult {
    pub fn from_candidate(candidate: Candidate) -> Self {
        Self {
            chunk_id: candidate.chunk_id,
            protocol_id: candidate.protocol_id,
            protocol_title: candidate.protocol_title,
            section: candidate.section,
            content: candidate.content,
            jurisdiction_id: candidate.source_jurisdiction.to_string(),
            jurisdiction_level: candidate.origin_level,
            inherited: candidate.inherited,
            effective_date: candidate.effective_date,
            similarity: candidate.similarity,
            score: candidate.score,
        }
    }
}

/// Chain level with whether it had matching content
#[derive(Debug, Clone, Serialize)]
pub struct ChainLevel {
    pub jurisdiction_id: String,
    pub level: JurisdictionLevel,
    pub rank: usize,
    pub covered: bool,
    pub candidate_count: usize,
}

impl ChainLevel {
    fn from_coverage(coverage: LevelCoverage) -> Self {
        let LevelCoverage {
            entry:
                InheritanceChainEntry {
                    jurisdiction_id,
                    level,
                    rank,
                    ..
                },
            covered,
            candidate_count,
        } = coverage;

        Self {
            jurisdiction_id: jurisdiction_id.to_string(),
            level,
            rank,
            covered,
            candidate_count,
        }
    }
}

/// Quota state reported alongside results
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitInfo {
    pub tier: Tier,
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl From<&RateLimitDecision> for RateLimitInfo {
    fn from(decision: &RateLimitDecision) -> Self {
        Self {
            tier: decision.tier,
            limit: decision.limit,
            remaining: decision.remaining,
            reset_at: decision.reset_at,
            degraded: decision.degraded,
        }
    }
}

/// POST /v1/search response
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponseBody {
    pub object: &'static str,
    pub results: Vec<SearchResult>,
    pub intent: IntentTier,
    pub multi_part: bool,
    pub source_jurisdiction: Option<String>,
    pub inherited: bool,
    pub chain: Vec<ChainLevel>,
    pub rate_limit: RateLimitInfo,
}

impl SearchResponseBody {
    pub fn new(response: RetrievalResponse, decision: &RateLimitDecision) -> Self {
        Self {
            object: "search.result",
            results: response
                .results
                .into_iter()
                .map(SearchResult::from_candidate)
                .collect(),
            intent: response.intent,
            multi_part: response.multi_part,
            source_jurisdiction: response.source_jurisdiction.map(|id| id.to_string()),
            inherited: response.inherited,
            chain: response
                .coverage
                .into_iter()
                .map(ChainLevel::from_coverage)
                .collect(),
            rate_limit: RateLimitInfo::from(decision),
        }
    }
}

const LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// `X-RateLimit-*` headers, plus `Retry-After` when the request was rejected
pub fn rate_limit_headers(decision: &RateLimitDecision, now: DateTime<Utc>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(LIMIT, HeaderValue::from(decision.limit));
    headers.insert(REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(RESET, HeaderValue::from(decision.reset_at.timestamp().max(0)));

    if !decision.allowed {
        headers.insert(
            axum::http::header::RETRY_AFTER,
            HeaderValue::from(decision.retry_after_secs(now)),
        );
    }

    headers
}
