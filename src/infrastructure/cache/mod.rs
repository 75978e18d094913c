//! Cache infrastructure - Embedding cache implementations

mod lru_cache;
mod sweeper;

pub use lru_cache::{EmbeddingCacheConfig, LruEmbeddingCache};
pub use sweeper::{spawn_sweeper, SweeperHandle};
