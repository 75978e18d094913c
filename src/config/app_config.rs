use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::jurisdiction::Jurisdiction;
use crate::domain::ranking::RankingConfig;
use crate::domain::rate_limit::RateLimitConfig;
use crate::domain::search::SearchConfig;
use crate::domain::DomainError;
use crate::infrastructure::auth::JwtConfig;
use crate::infrastructure::cache::EmbeddingCacheConfig;
use crate::infrastructure::embedding::EmbeddingConfig;
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::search::VectorIndexConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub embedding: EmbeddingConfig,
    pub cache: EmbeddingCacheConfig,
    pub search: SearchConfig,
    pub ranking: RankingConfig,
    pub rate_limit: RateLimitConfig,
    pub auth: JwtConfig,
    pub vector_index: VectorIndexConfig,
    pub jurisdictions: JurisdictionsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where the jurisdiction hierarchy comes from
///
/// Inline entries are loaded first, then the file; file entries replace
/// inline ones with the same ID.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JurisdictionsConfig {
    pub file: Option<PathBuf>,
    pub entries: Vec<Jurisdiction>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Check every section; the first failure is returned
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.server.host.trim().is_empty() {
            return Err(DomainError::configuration("server.host is required"));
        }

        self.embedding.validate()?;
        self.cache.validate()?;
        self.search.validate()?;
        self.ranking.validate()?;
        self.rate_limit.validate()?;
        self.auth.validate()?;
        self.vector_index.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rate_limit::CounterBackend;

    fn valid() -> AppConfig {
        AppConfig {
            embedding: EmbeddingConfig {
                api_key: "sk-test".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_need_only_credentials() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_inverted_floor_rejected() {
        let mut config = valid();
        config.search.general_floor = config.search.absolute_floor - 0.05;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let mut config = valid();
        config.rate_limit.backend = CounterBackend::Redis;

        assert!(config.validate().is_err());

        config.rate_limit.redis_url = Some("redis://127.0.0.1:6379".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_cache_capacity_rejected() {
        let mut config = valid();
        config.cache.max_entries = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let raw = serde_json::json!({
            "server": {"host": "127.0.0.1", "port": 9000},
            "logging": {"level": "debug", "format": "json"},
            "embedding": {"api_key": "sk-test", "dimensions": 768},
            "rate_limit": {"free": {"window": 20, "daily": 200}},
            "jurisdictions": {
                "entries": [{"id": "state-x", "name": "State X", "level": "state"}]
            }
        });

        let config: AppConfig = serde_json::from_value(raw).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.embedding.dimensions, 768);
        assert_eq!(config.rate_limit.free.window, 20);
        assert_eq!(config.rate_limit.pro.window, 60);
        assert_eq!(config.jurisdictions.entries.len(), 1);
        assert!(config.validate().is_ok());
    }
}
