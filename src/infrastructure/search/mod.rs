//! Vector index implementations and the search engine

mod config;
mod engine;
mod in_memory;
mod pgvector;

pub use config::{VectorIndexBackend, VectorIndexConfig};
pub use engine::VectorSearchEngine;
pub use in_memory::{InMemoryVectorIndex, SeedChunk};
pub use pgvector::PgVectorIndex;
