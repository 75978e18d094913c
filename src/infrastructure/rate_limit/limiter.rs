//! Tier-aware rate limiter

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::clock::Clock;
use crate::domain::rate_limit::{CounterStore, Identity, RateLimitConfig, RateLimitDecision};
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_rate_limit_decision, record_rate_limit_degraded};

/// Admits or rejects requests against per-tier window and daily budgets
///
/// Every check counts, including rejected ones. When the counter store errors
/// or exceeds its time budget the request is admitted and the decision is
/// flagged `degraded`.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    backend_timeout: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let backend_timeout = Duration::from_millis(config.backend_timeout_ms);

        Self {
            store,
            config,
            clock,
            backend_timeout,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub async fn health_check(&self) -> Result<bool, DomainError> {
        self.store.health_check().await
    }

    /// Count one request for `identity` and decide whether it may proceed
    pub async fn check(&self, identity: &Identity) -> RateLimitDecision {
        let tier = identity.tier();
        let limits = self.config.limits_for(tier);
        let now = self.clock.now();
        let window = self.config.window();
        let key = identity.key();

        let outcome = tokio::time::timeout(self.backend_timeout, self.store.hit(&key, window, now))
            .await
            .unwrap_or_else(|_| {
                Err(DomainError::rate_limit_backend(format!(
                    "Counter store exceeded {}ms",
                    self.config.backend_timeout_ms
                )))
            });

        let decision = match outcome {
            Ok(snapshot) => RateLimitDecision::evaluate(tier, limits, &snapshot),
            Err(e) => {
                warn!(
                    backend = self.store.backend_name(),
                    identity = %identity,
                    error = %e,
                    "Rate limit counters unavailable, admitting request"
                );
                record_rate_limit_degraded(self.store.backend_name());
                RateLimitDecision::fail_open(tier, limits, now + window)
            }
        };

        if !decision.allowed {
            debug!(
                identity = %identity,
                tier = %tier,
                exceeded = ?decision.exceeded,
                reset_at = %decision.reset_at,
                "Rate limit exceeded"
            );
        }

        record_rate_limit_decision(tier.as_str(), decision.allowed);
        decision
    }
}
