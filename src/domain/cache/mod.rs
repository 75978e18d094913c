//! Embedding cache domain - content-addressed vector store abstraction

mod key;
mod repository;

pub use key::EmbeddingCacheKey;
pub use repository::{CacheStats, EmbeddingCache};

#[cfg(test)]
pub use repository::mock::FailingCache;
