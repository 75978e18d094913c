//! Embedding provider implementations

mod cached;
mod config;
mod http_client;
mod openai;

pub use cached::CachedEmbeddingService;
pub use config::EmbeddingConfig;
pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::OpenAiEmbeddingProvider;

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
