//! Process-local request counters

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::clock::next_utc_midnight;
use crate::domain::rate_limit::{CounterSnapshot, CounterStore};
use crate::domain::DomainError;

#[derive(Debug, Clone, Copy)]
struct CounterRecord {
    window_count: u64,
    window_reset_at: DateTime<Utc>,
    daily_count: u64,
    daily_reset_at: DateTime<Utc>,
}

impl CounterRecord {
    fn is_finished(&self, now: DateTime<Utc>) -> bool {
        now >= self.window_reset_at && now >= self.daily_reset_at
    }
}

const DEFAULT_PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug)]
struct CounterTable {
    records: HashMap<String, CounterRecord>,
    /// Table size at which the next `hit` sweeps finished records
    prune_at: usize,
}

impl CounterTable {
    fn prune(&mut self, now: DateTime<Utc>, threshold: usize) -> usize {
        let before = self.records.len();
        self.records.retain(|_, r| !r.is_finished(now));
        self.prune_at = threshold.max(self.records.len() * 2);

        before - self.records.len()
    }
}

/// Counters in a single mutex-guarded map
///
/// Each `hit` runs entirely under the lock, so increments for one identity
/// are serialized. Only suitable when a single instance serves all traffic.
///
/// Once the map reaches the prune threshold, the next `hit` drops every
/// record whose window and day have both ended. The threshold then moves to
/// twice the surviving count so sweeps stay amortized.
#[derive(Debug)]
pub struct InMemoryCounterStore {
    table: Mutex<CounterTable>,
    prune_threshold: usize,
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::with_prune_threshold(DEFAULT_PRUNE_THRESHOLD)
    }
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prune_threshold(threshold: usize) -> Self {
        let threshold = threshold.max(1);

        Self {
            table: Mutex::new(CounterTable {
                records: HashMap::new(),
                prune_at: threshold,
            }),
            prune_threshold: threshold,
        }
    }

    /// Drop records whose window and day have both ended
    pub fn prune(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut table = self
            .table
            .lock()
            .map_err(|_| DomainError::rate_limit_backend("counter lock poisoned"))?;

        Ok(table.prune(now, self.prune_threshold))
    }

    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn hit(
        &self,
        key: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<CounterSnapshot, DomainError> {
        let mut table = self
            .table
            .lock()
            .map_err(|_| DomainError::rate_limit_backend("counter lock poisoned"))?;

        if table.records.len() >= table.prune_at {
            let removed = table.prune(now, self.prune_threshold);
            debug!(removed, remaining = table.records.len(), "Pruned finished rate limit counters");
        }

        let record = table.records.entry(key.to_string()).or_insert(CounterRecord {
            window_count: 0,
            window_reset_at: now + window,
            daily_count: 0,
            daily_reset_at: next_utc_midnight(now),
        });

        if now >= record.window_reset_at {
            record.window_count = 0;
            record.window_reset_at = now + window;
        }

        if now >= record.daily_reset_at {
            record.daily_count = 0;
            record.daily_reset_at = next_utc_midnight(now);
        }

        record.window_count += 1;
        record.daily_count += 1;

        Ok(CounterSnapshot {
            window_count: record.window_count,
            window_reset_at: record.window_reset_at,
            daily_count: record.daily_count,
            daily_reset_at: record.daily_reset_at,
        })
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        Ok(!self.table.is_poisoned())
    }
}
