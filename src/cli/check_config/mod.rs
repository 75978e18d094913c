//! Check-config command - validates configuration without serving

use anyhow::Context;

use crate::config::AppConfig;
use crate::domain::rate_limit::TierLimits;

use super::serve::build_socket_addr;

/// Load, validate and summarize configuration
pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    let addr = build_socket_addr(&config)?;

    println!("{}", summary(&config, &addr.to_string()));
    Ok(())
}

fn summary(config: &AppConfig, addr: &str) -> String {
    let limits = &config.rate_limit;
    let lines = [
        format!("listen:          {}", addr),
        format!(
            "embedding:       {} ({} dims) via {}",
            config.embedding.model, config.embedding.dimensions, config.embedding.base_url
        ),
        format!(
            "cache:           {} entries, ttl {}s",
            config.cache.max_entries, config.cache.ttl_secs
        ),
        format!("vector index:    {:?}", config.vector_index.backend),
        format!(
            "rate limits:     {:?}, window {}s, anonymous {}, free {}, pro {}, enterprise {}",
            limits.backend,
            limits.window_secs,
            budget(limits.anonymous),
            budget(limits.free),
            budget(limits.pro),
            budget(limits.enterprise),
        ),
        format!(
            "auth:            {}",
            if config.auth.secret.is_some() {
                "jwt"
            } else {
                "anonymous only"
            }
        ),
        format!(
            "jurisdictions:   {} inline{}",
            config.jurisdictions.entries.len(),
            config
                .jurisdictions
                .file
                .as_ref()
                .map(|f| format!(", file {}", f.display()))
                .unwrap_or_default()
        ),
    ];

    lines.join("\n")
}

fn budget(limits: TierLimits) -> String {
    format!("{}/window {}/day", limits.window, limits.daily)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_hides_credentials() {
        let mut config = AppConfig::default();
        config.embedding.api_key = "sk-secret".to_string();

        let text = summary(&config, "0.0.0.0:8080");

        assert!(text.contains("0.0.0.0:8080"));
        assert!(text.contains("anonymous only"));
        assert!(text.contains("anonymous 5/window 25/day"));
        assert!(!text.contains("sk-secret"));
    }
}
