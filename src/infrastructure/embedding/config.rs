use serde::Deserialize;

use crate::domain::DomainError;

/// Embedding provider and query preparation settings
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer credential for the provider; required
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Expected vector length
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Query text is truncated to this many characters before hashing
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    /// Time budget for one provider call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimensions() -> usize {
    1536
}

fn default_max_input_chars() -> usize {
    2_000
}

fn default_timeout_ms() -> u64 {
    2_000
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            dimensions: default_dimensions(),
            max_input_chars: default_max_input_chars(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.api_key.trim().is_empty() {
            return Err(DomainError::configuration(
                "embedding.api_key is required (set APP__EMBEDDING__API_KEY)",
            ));
        }

        if self.model.trim().is_empty() {
            return Err(DomainError::configuration("embedding.model is required"));
        }

        if self.dimensions == 0 || self.max_input_chars == 0 || self.timeout_ms == 0 {
            return Err(DomainError::configuration(
                "embedding.dimensions, max_input_chars and timeout_ms must be greater than zero",
            ));
        }

        Ok(())
    }
}
