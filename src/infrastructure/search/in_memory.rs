//! In-memory vector index for development and testing

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::embedding::cosine_similarity;
use crate::domain::jurisdiction::JurisdictionId;
use crate::domain::search::{ChunkMatch, VectorIndex};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: ChunkMatch,
    embedding: Vec<f32>,
}

/// Chunk record as stored in a seed file
#[derive(Debug, Clone, Deserialize)]
pub struct SeedChunk {
    pub chunk_id: String,
    pub protocol_id: String,
    #[serde(default)]
    pub protocol_title: String,
    #[serde(default)]
    pub section: String,
    pub content: String,
    pub jurisdiction_id: JurisdictionId,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    pub embedding: Vec<f32>,
}

/// Brute-force cosine index over chunks held in memory
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    chunks: RwLock<Vec<IndexedChunk>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chunk or replace the one with the same ID
    pub async fn upsert(&self, chunk: ChunkMatch, embedding: Vec<f32>) -> Result<(), DomainError> {
        if embedding.is_empty() {
            return Err(DomainError::validation(format!(
                "Chunk '{}' has an empty embedding",
                chunk.chunk_id
            )));
        }

        let mut chunks = self.chunks.write().await;

        if let Some(existing) = chunks.first() {
            if existing.embedding.len() != embedding.len() {
                return Err(DomainError::validation(format!(
                    "Chunk '{}' has {} dimensions, index holds {}",
                    chunk.chunk_id,
                    embedding.len(),
                    existing.embedding.len()
                )));
            }
        }

        let indexed = IndexedChunk { chunk, embedding };

        match chunks
            .iter_mut()
            .find(|c| c.chunk.chunk_id == indexed.chunk.chunk_id)
        {
            Some(slot) => *slot = indexed,
            None => chunks.push(indexed),
        }

        Ok(())
    }

    pub async fn remove(&self, chunk_id: &str) -> bool {
        let mut chunks = self.chunks.write().await;
        let before = chunks.len();
        chunks.retain(|c| c.chunk.chunk_id != chunk_id);
        chunks.len() != before
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }

    /// Load chunks from a JSON array of [`SeedChunk`]
    pub async fn load_seed_file(&self, path: impl AsRef<Path>) -> Result<usize, DomainError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!("Failed to read seed file {}: {}", path.display(), e))
        })?;

        let seeds: Vec<SeedChunk> = serde_json::from_str(&raw).map_err(|e| {
            DomainError::configuration(format!("Invalid seed file {}: {}", path.display(), e))
        })?;

        let count = seeds.len();
        for seed in seeds {
            self.upsert(seed.to_match(), seed.embedding).await?;
        }

        tracing::info!(path = %path.display(), chunks = count, "Loaded vector index seed");
        Ok(count)
    }
}

impl SeedChunk {
    fn to_match(&self) -> ChunkMatch {
        let mut hit = ChunkMatch::new(
            &self.chunk_id,
            &self.protocol_id,
            self.jurisdiction_id.clone(),
            0.0,
        )
        .with_title(&self.protocol_title)
        .with_section(&self.section)
        .with_content(&self.content);

        if let Some(date) = self.effective_date {
            hit = hit.with_effective_date(date);
        }

        hit
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn index_type(&self) -> &'static str {
        "in_memory"
    }

    async fn query(
        &self,
        vector: &[f32],
        scope: &[JurisdictionId],
        limit: usize,
    ) -> Result<Vec<ChunkMatch>, DomainError> {
        let chunks = self.chunks.read().await;

        if let Some(existing) = chunks.first() {
            if existing.embedding.len() != vector.len() {
                return Err(DomainError::vector_index(format!(
                    "Query has {} dimensions, index holds {}",
                    vector.len(),
                    existing.embedding.len()
                )));
            }
        }

        let mut hits: Vec<ChunkMatch> = chunks
            .iter()
            .filter(|c| scope.contains(&c.chunk.jurisdiction_id))
            .map(|c| {
                let mut hit = c.chunk.clone();
                hit.similarity = cosine_similarity(vector, &c.embedding);
                hit
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(limit);

        Ok(hits)
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        Ok(true)
    }
}
