//! Embedding provider domain models and traits

mod provider;
mod request;
mod response;
mod text;

pub use provider::EmbeddingProvider;
pub use request::EmbeddingRequest;
pub use response::{cosine_similarity, Embedding, EmbeddingResponse, EmbeddingUsage};
pub use text::{normalize_query, prepare_input, truncate_graphemes};

#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
