//! Application configuration

mod app_config;

pub use app_config::{AppConfig, JurisdictionsConfig, LogFormat, LoggingConfig, ServerConfig};
