//! Protocol search domain
//!
//! Query classification, retrieved candidates, the vector index seam and the
//! similarity-floor configuration.

mod candidate;
mod config;
mod index;
mod intent;

pub use candidate::{compare_candidates, Candidate, ChunkMatch};
pub use config::SearchConfig;
pub use index::VectorIndex;
pub use intent::{IntentTier, QueryClassifier, SearchQuery};

#[cfg(test)]
pub use index::mock::MockVectorIndex;
