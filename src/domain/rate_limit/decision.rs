//! Admission decisions

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{CounterSnapshot, Tier, TierLimits};

/// Which budget rejected a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    Window,
    Daily,
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Remaining requests in the binding budget
    pub remaining: u64,
    /// When the binding budget resets
    pub reset_at: DateTime<Utc>,
    pub tier: Tier,
    /// Size of the binding budget
    pub limit: u64,
    pub window_remaining: u64,
    pub daily_remaining: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exceeded: Option<LimitKind>,
    /// Counters were unavailable and the request was let through
    pub degraded: bool,
}

impl RateLimitDecision {
    /// Decide from post-increment counters
    ///
    /// The daily budget is checked first so a caller out of daily quota is
    /// told to come back at midnight rather than at the next window.
    pub fn evaluate(tier: Tier, limits: TierLimits, snapshot: &CounterSnapshot) -> Self {
        let window_limit = u64::from(limits.window);
        let daily_limit = u64::from(limits.daily);
        let window_remaining = window_limit.saturating_sub(snapshot.window_count);
        let daily_remaining = daily_limit.saturating_sub(snapshot.daily_count);

        let base = Self {
            allowed: true,
            remaining: 0,
            reset_at: snapshot.window_reset_at,
            tier,
            limit: window_limit,
            window_remaining,
            daily_remaining,
            exceeded: None,
            degraded: false,
        };

        if snapshot.daily_count > daily_limit {
            return Self {
                allowed: false,
                reset_at: snapshot.daily_reset_at,
                limit: daily_limit,
                exceeded: Some(LimitKind::Daily),
                ..base
            };
        }

        if snapshot.window_count > window_limit {
            return Self {
                allowed: false,
                exceeded: Some(LimitKind::Window),
                ..base
            };
        }

        // The tighter of the two budgets is the one reported.
        if daily_remaining < window_remaining {
            Self {
                remaining: daily_remaining,
                reset_at: snapshot.daily_reset_at,
                limit: daily_limit,
                ..base
            }
        } else {
            Self {
                remaining: window_remaining,
                ..base
            }
        }
    }

    /// Admit without counting because the counter backend failed
    pub fn fail_open(tier: Tier, limits: TierLimits, window_reset_at: DateTime<Utc>) -> Self {
        let window_limit = u64::from(limits.window);

        Self {
            allowed: true,
            remaining: window_limit,
            reset_at: window_reset_at,
            tier,
            limit: window_limit,
            window_remaining: window_limit,
            daily_remaining: u64::from(limits.daily),
            exceeded: None,
            degraded: true,
        }
    }

    /// Seconds until `reset_at`, never negative
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1_000)
    }
}
