//! Strict-LRU embedding cache with lazy TTL expiry

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use serde::Deserialize;

use crate::domain::cache::{CacheStats, EmbeddingCache, EmbeddingCacheKey};
use crate::domain::clock::Clock;
use crate::domain::DomainError;
use crate::infrastructure::observability::record_cache_evictions;

/// Configuration for the embedding cache
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingCacheConfig {
    /// Maximum number of entries
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Entries older than this are treated as absent
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Interval of the background expiry sweep; 0 disables it
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_max_entries() -> usize {
    10_000
}

fn default_ttl_secs() -> u64 {
    86_400
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl Default for EmbeddingCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

impl EmbeddingCacheConfig {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_entries == 0 {
            return Err(DomainError::configuration(
                "cache.max_entries must be greater than zero",
            ));
        }

        if self.ttl_secs == 0 {
            return Err(DomainError::configuration(
                "cache.ttl_secs must be greater than zero",
            ));
        }

        if self.ttl_secs > MAX_TTL_SECS {
            return Err(DomainError::configuration(format!(
                "cache.ttl_secs must not exceed {} (one year)",
                MAX_TTL_SECS
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    vector: Vec<f32>,
    inserted_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
    access_count: u64,
}

#[derive(Debug)]
struct Inner {
    entries: LruCache<EmbeddingCacheKey, CacheEntry>,
    stats: CacheStats,
}

/// In-process embedding cache
///
/// Eviction is by recency only. Expiry is measured from insertion and is
/// checked on every read; [`EmbeddingCache::sweep_expired`] reclaims entries
/// that are never read again.
#[derive(Debug)]
pub struct LruEmbeddingCache {
    inner: Mutex<Inner>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl LruEmbeddingCache {
    pub fn new(config: &EmbeddingCacheConfig, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        config.validate()?;

        let capacity = NonZeroUsize::new(config.max_entries).ok_or_else(|| {
            DomainError::configuration("cache.max_entries must be greater than zero")
        })?;

        Ok(Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
            ttl: Duration::seconds(config.ttl_secs as i64),
            clock,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, DomainError> {
        self.inner
            .lock()
            .map_err(|_| DomainError::cache("embedding cache lock poisoned"))
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.inserted_at > self.ttl
    }

    /// Capacity the cache was built with
    pub fn capacity(&self) -> Result<usize, DomainError> {
        Ok(self.lock()?.entries.cap().get())
    }

    /// Whether a live entry exists, without touching its recency
    pub fn contains(&self, key: &EmbeddingCacheKey) -> Result<bool, DomainError> {
        let now = self.clock.now();
        let inner = self.lock()?;

        Ok(inner
            .entries
            .peek(key)
            .is_some_and(|entry| !self.is_expired(entry, now)))
    }

    /// Access count and last access of an entry
    pub fn access_info(
        &self,
        key: &EmbeddingCacheKey,
    ) -> Result<Option<(u64, DateTime<Utc>)>, DomainError> {
        let inner = self.lock()?;

        Ok(inner
            .entries
            .peek(key)
            .map(|entry| (entry.access_count, entry.last_accessed)))
    }
}

impl EmbeddingCache for LruEmbeddingCache {
    fn get(&self, key: &EmbeddingCacheKey) -> Result<Option<Vec<f32>>, DomainError> {
        let now = self.clock.now();
        let mut inner = self.lock()?;

        let expired = match inner.entries.peek(key) {
            None => {
                inner.stats.misses += 1;
                return Ok(None);
            }
            Some(entry) => self.is_expired(entry, now),
        };

        if expired {
            inner.entries.pop(key);
            inner.stats.expirations += 1;
            inner.stats.misses += 1;
            return Ok(None);
        }

        inner.stats.hits += 1;

        // get() promotes the entry to most recently used
        Ok(inner.entries.get_mut(key).map(|entry| {
            entry.last_accessed = now;
            entry.access_count += 1;
            entry.vector.clone()
        }))
    }

    fn insert(&self, key: EmbeddingCacheKey, vector: Vec<f32>) -> Result<(), DomainError> {
        let now = self.clock.now();
        let mut inner = self.lock()?;

        let entry = CacheEntry {
            vector,
            inserted_at: now,
            last_accessed: now,
            access_count: 0,
        };

        if let Some((evicted, _)) = inner.entries.push(key.clone(), entry) {
            if evicted != key {
                inner.stats.evictions += 1;
                drop(inner);
                record_cache_evictions(1);
            }
        }

        Ok(())
    }

    fn sweep_expired(&self) -> Result<usize, DomainError> {
        let now = self.clock.now();
        let mut inner = self.lock()?;

        let expired: Vec<EmbeddingCacheKey> = inner
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.entries.pop(key);
        }

        inner.stats.expirations += expired.len() as u64;

        Ok(expired.len())
    }

    fn len(&self) -> Result<usize, DomainError> {
        Ok(self.lock()?.entries.len())
    }

    fn clear(&self) -> Result<(), DomainError> {
        self.lock()?.entries.clear();
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        match self.inner.lock() {
            Ok(inner) => CacheStats {
                entries: inner.entries.len(),
                ..inner.stats
            },
            Err(_) => CacheStats::default(),
        }
    }
}
