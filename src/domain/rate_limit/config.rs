//! Rate limit configuration types

use serde::{Deserialize, Serialize};

use super::Tier;
use crate::domain::DomainError;

/// Request budgets of one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    /// Requests allowed per window
    pub window: u32,
    /// Requests allowed per UTC day
    pub daily: u32,
}

impl TierLimits {
    pub const fn new(window: u32, daily: u32) -> Self {
        Self { window, daily }
    }
}

/// Counter storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterBackend {
    /// Process-local counters, for single-instance deployments and tests
    #[default]
    Memory,
    /// Shared counters in Redis
    Redis,
}

/// Windowed and daily quota settings per tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub backend: CounterBackend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Length of the fixed window in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Time budget for one counter store call
    #[serde(default = "default_backend_timeout_ms")]
    pub backend_timeout_ms: u64,
    #[serde(default = "default_anonymous")]
    pub anonymous: TierLimits,
    #[serde(default = "default_free")]
    pub free: TierLimits,
    #[serde(default = "default_pro")]
    pub pro: TierLimits,
    #[serde(default = "default_enterprise")]
    pub enterprise: TierLimits,
}

fn default_key_prefix() -> String {
    "ratelimit".to_string()
}

fn default_window_secs() -> u64 {
    60
}

fn default_backend_timeout_ms() -> u64 {
    100
}

fn default_anonymous() -> TierLimits {
    TierLimits::new(5, 25)
}

fn default_free() -> TierLimits {
    TierLimits::new(10, 100)
}

fn default_pro() -> TierLimits {
    TierLimits::new(60, 2_000)
}

fn default_enterprise() -> TierLimits {
    TierLimits::new(300, 20_000)
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            backend: CounterBackend::default(),
            redis_url: None,
            key_prefix: default_key_prefix(),
            window_secs: default_window_secs(),
            backend_timeout_ms: default_backend_timeout_ms(),
            anonymous: default_anonymous(),
            free: default_free(),
            pro: default_pro(),
            enterprise: default_enterprise(),
        }
    }
}

/// The daily quota already bounds anything longer
pub const MAX_WINDOW_SECS: u64 = 86_400;

impl RateLimitConfig {
    pub fn limits_for(&self, tier: Tier) -> TierLimits {
        match tier {
            Tier::Anonymous => self.anonymous,
            Tier::Free => self.free,
            Tier::Pro => self.pro,
            Tier::Enterprise => self.enterprise,
        }
    }

    /// Window length, capped at one day
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.window_secs.min(MAX_WINDOW_SECS) as i64)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.window_secs == 0 {
            return Err(DomainError::configuration(
                "rate_limit.window_secs must be greater than zero",
            ));
        }

        if self.window_secs > MAX_WINDOW_SECS {
            return Err(DomainError::configuration(format!(
                "rate_limit.window_secs must not exceed {} (one day)",
                MAX_WINDOW_SECS
            )));
        }

        if self.backend_timeout_ms == 0 {
            return Err(DomainError::configuration(
                "rate_limit.backend_timeout_ms must be greater than zero",
            ));
        }

        let tiers = [Tier::Anonymous, Tier::Free, Tier::Pro, Tier::Enterprise];

        for tier in tiers {
            let limits = self.limits_for(tier);
            if limits.window == 0 || limits.daily == 0 {
                return Err(DomainError::configuration(format!(
                    "rate_limit.{} limits must be greater than zero",
                    tier
                )));
            }
        }

        let anonymous = self.anonymous;
        if tiers[1..].iter().any(|tier| {
            let limits = self.limits_for(*tier);
            limits.window < anonymous.window || limits.daily < anonymous.daily
        }) {
            return Err(DomainError::configuration(
                "rate_limit.anonymous must be the smallest budget",
            ));
        }

        if self.backend == CounterBackend::Redis
            && self.redis_url.as_deref().map_or(true, |url| url.trim().is_empty())
        {
            return Err(DomainError::configuration(
                "rate_limit.redis_url is required for the redis backend",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RateLimitConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.limits_for(Tier::Pro), TierLimits::new(60, 2_000));
        assert_eq!(config.window(), chrono::Duration::seconds(60));
    }

    #[test]
    fn test_oversized_window_rejected_without_panic() {
        let config = RateLimitConfig {
            window_secs: u64::MAX,
            ..Default::default()
        };

        assert!(config.validate().is_err());
        assert_eq!(config.window(), chrono::Duration::seconds(86_400));
    }

    #[test]
    fn test_anonymous_must_be_smallest() {
        let config = RateLimitConfig {
            anonymous: TierLimits::new(50, 25),
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = RateLimitConfig {
            pro: TierLimits::new(0, 10),
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redis_requires_url() {
        let config = RateLimitConfig {
            backend: CounterBackend::Redis,
            ..Default::default()
        };

        assert!(config.validate().is_err());

        let config = RateLimitConfig {
            backend: CounterBackend::Redis,
            redis_url: Some("redis://localhost:6379".to_string()),
            ..Default::default()
        };

        assert!(config.validate().is_ok());
    }
}
