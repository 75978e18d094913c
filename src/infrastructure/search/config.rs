use serde::Deserialize;

use crate::domain::DomainError;

/// Vector index backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorIndexBackend {
    /// Brute-force cosine scan over chunks held in memory
    #[default]
    Memory,
    /// PostgreSQL with the pgvector extension
    Pgvector,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorIndexConfig {
    #[serde(default)]
    pub backend: VectorIndexBackend,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Optional JSON file of chunks loaded into the memory backend at startup
    #[serde(default)]
    pub seed_file: Option<String>,
}

fn default_table_name() -> String {
    "protocol_chunks".to_string()
}

fn default_max_connections() -> u32 {
    10
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            backend: VectorIndexBackend::default(),
            database_url: None,
            table_name: default_table_name(),
            max_connections: default_max_connections(),
            seed_file: None,
        }
    }
}

/// Table names are interpolated into SQL, so only plain identifiers are allowed
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl VectorIndexConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !is_valid_identifier(&self.table_name) {
            return Err(DomainError::configuration(format!(
                "vector_index.table_name '{}' is not a valid identifier",
                self.table_name
            )));
        }

        if self.backend == VectorIndexBackend::Pgvector {
            if self
                .database_url
                .as_deref()
                .map_or(true, |url| url.trim().is_empty())
            {
                return Err(DomainError::configuration(
                    "vector_index.database_url is required for the pgvector backend",
                ));
            }

            if self.max_connections == 0 {
                return Err(DomainError::configuration(
                    "vector_index.max_connections must be greater than zero",
                ));
            }
        }

        Ok(())
    }
}
