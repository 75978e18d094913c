//! Vector index trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::ChunkMatch;
use crate::domain::jurisdiction::JurisdictionId;
use crate::domain::DomainError;

/// Nearest-neighbour index over protocol chunk embeddings
///
/// Implementations must only return chunks whose jurisdiction is in `scope`,
/// ordered by descending similarity.
#[async_trait]
pub trait VectorIndex: Send + Sync + Debug {
    /// Get the index backend name
    fn index_type(&self) -> &'static str;

    /// Return up to `limit` nearest chunks within the jurisdiction scope
    async fn query(
        &self,
        vector: &[f32],
        scope: &[JurisdictionId],
        limit: usize,
    ) -> Result<Vec<ChunkMatch>, DomainError>;

    /// Check if the index is reachable
    async fn health_check(&self) -> Result<bool, DomainError>;
}
