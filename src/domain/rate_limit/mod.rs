//! Tiered request quotas
//!
//! Each identity has a fixed-window budget and a daily budget that resets at
//! UTC midnight. Counters live behind [`CounterStore`] so several instances
//! can share them.

mod config;
mod decision;
mod identity;
mod store;
mod tier;

pub use config::{CounterBackend, RateLimitConfig, TierLimits};
pub use decision::{LimitKind, RateLimitDecision};
pub use identity::{Identity, IdentityResolver, TokenVerifier, VerifiedCaller};
pub use store::{CounterSnapshot, CounterStore};
pub use tier::Tier;

#[cfg(test)]
pub use identity::mock::StaticTokenVerifier;
#[cfg(test)]
pub use store::mock::FailingCounterStore;
