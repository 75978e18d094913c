//! Domain layer - Core business logic and entities

pub mod cache;
pub mod clock;
pub mod embedding;
pub mod error;
pub mod jurisdiction;
pub mod ranking;
pub mod rate_limit;
pub mod search;

pub use cache::{CacheStats, EmbeddingCache, EmbeddingCacheKey};
pub use clock::{Clock, ManualClock, SystemClock};
pub use embedding::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
pub use error::{DomainError, HierarchyFault, ProviderErrorKind};
pub use jurisdiction::{
    InheritanceChain, InheritanceChainEntry, InheritanceResolver, Jurisdiction, JurisdictionId,
    JurisdictionLevel, JurisdictionRepository, LevelCoverage, Selection,
};
pub use ranking::{KeywordScope, RankingConfig, ReRanker, ScoreWeights};
pub use rate_limit::{
    CounterBackend, CounterSnapshot, CounterStore, Identity, IdentityResolver, LimitKind,
    RateLimitConfig, RateLimitDecision, Tier, TierLimits, TokenVerifier, VerifiedCaller,
};
pub use search::{
    Candidate, ChunkMatch, IntentTier, QueryClassifier, SearchConfig, SearchQuery, VectorIndex,
};
