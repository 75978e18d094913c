//! Embedding cache trait definition

use std::fmt::Debug;

use serde::Serialize;

use super::EmbeddingCacheKey;
use crate::domain::DomainError;

/// Counters describing cache effectiveness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

/// Size- and time-bounded store of query vectors
///
/// The cache is advisory: callers treat every `Err` as a miss and carry on.
/// Operations are synchronous and in-memory; no implementation may perform I/O
/// while holding its internal lock.
pub trait EmbeddingCache: Send + Sync + Debug {
    /// Look up a live entry, promoting it to most recently used
    ///
    /// An entry past its TTL is removed and reported as a miss.
    fn get(&self, key: &EmbeddingCacheKey) -> Result<Option<Vec<f32>>, DomainError>;

    /// Insert or replace an entry, evicting the least recently used one at capacity
    fn insert(&self, key: EmbeddingCacheKey, vector: Vec<f32>) -> Result<(), DomainError>;

    /// Physically remove every expired entry, returning how many were dropped
    fn sweep_expired(&self) -> Result<usize, DomainError>;

    /// Number of entries currently held (expired ones included until swept)
    fn len(&self) -> Result<usize, DomainError>;

    fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len()? == 0)
    }

    /// Drop every entry
    fn clear(&self) -> Result<(), DomainError>;

    /// Snapshot of the cache counters
    fn stats(&self) -> CacheStats;
}
