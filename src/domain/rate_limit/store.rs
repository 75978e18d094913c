//! Counter storage seam

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::domain::DomainError;

/// Post-increment counter state for one identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub window_count: u64,
    pub window_reset_at: DateTime<Utc>,
    pub daily_count: u64,
    pub daily_reset_at: DateTime<Utc>,
}

/// Shared request counters
///
/// `hit` increments both the window and the daily counter of `key` in one
/// atomic step and returns the counts including this request. An expired
/// window or day starts again from zero before incrementing. There is no
/// separate read operation: concurrent callers each observe a distinct
/// post-increment count.
#[async_trait]
pub trait CounterStore: Send + Sync + Debug {
    fn backend_name(&self) -> &'static str;

    async fn hit(
        &self,
        key: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<CounterSnapshot, DomainError>;

    async fn health_check(&self) -> Result<bool, DomainError>;
}
