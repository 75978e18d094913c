//! Candidate re-ranking

mod config;
mod reranker;

pub use config::{KeywordScope, RankingConfig, ScoreWeights};
pub use reranker::ReRanker;
