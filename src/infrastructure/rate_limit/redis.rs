//! Redis-backed request counters

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::aio::ConnectionManager;
use redis::{Client, Script};
use tracing::info;

use crate::domain::clock::next_utc_midnight;
use crate::domain::rate_limit::{CounterSnapshot, CounterStore};
use crate::domain::DomainError;

/// Increments both counters and reports their remaining TTLs.
///
/// KEYS[1] window key, KEYS[2] daily key.
/// ARGV[1] window length in ms, ARGV[2] ms until the daily key expires.
const HIT_SCRIPT: &str = r#"
local window_count = redis.call('INCR', KEYS[1])
if window_count == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
local window_ttl = redis.call('PTTL', KEYS[1])
if window_ttl < 0 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
  window_ttl = tonumber(ARGV[1])
end

local daily_count = redis.call('INCR', KEYS[2])
if daily_count == 1 then
  redis.call('PEXPIRE', KEYS[2], ARGV[2])
end

return {window_count, window_ttl, daily_count}
"#;

/// Shared counters for multi-instance deployments
///
/// The daily key carries the UTC date, so a new day starts from a fresh key
/// regardless of expiry timing. Both keys share a hash tag and land in the
/// same cluster slot.
#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
    script: Script,
    key_prefix: String,
}

impl fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("connection", &"<ConnectionManager>")
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl RedisCounterStore {
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self, DomainError> {
        let client = Client::open(url).map_err(|e| {
            DomainError::rate_limit_backend(format!("Invalid Redis URL: {}", e))
        })?;

        let connection = ConnectionManager::new(client).await.map_err(|e| {
            DomainError::rate_limit_backend(format!("Failed to connect to Redis: {}", e))
        })?;

        let key_prefix = key_prefix.into();
        info!(key_prefix = %key_prefix, "Connected rate limit counters to Redis");

        Ok(Self {
            connection,
            script: Script::new(HIT_SCRIPT),
            key_prefix,
        })
    }

    fn window_key(&self, key: &str) -> String {
        window_key(&self.key_prefix, key)
    }

    fn daily_key(&self, key: &str, now: DateTime<Utc>) -> String {
        daily_key(&self.key_prefix, key, now)
    }
}

fn window_key(prefix: &str, key: &str) -> String {
    format!("{}:{{{}}}:window", prefix, key)
}

fn daily_key(prefix: &str, key: &str, now: DateTime<Utc>) -> String {
    format!("{}:{{{}}}:day:{}", prefix, key, now.format("%Y-%m-%d"))
}

/// Expiry for a daily key, a minute past midnight to absorb clock skew
fn daily_ttl_ms(now: DateTime<Utc>) -> i64 {
    (next_utc_midnight(now) - now).num_milliseconds() + 60_000
}

fn snapshot_from_reply(
    reply: &[i64],
    now: DateTime<Utc>,
) -> Result<CounterSnapshot, DomainError> {
    let [window_count, window_ttl_ms, daily_count] = reply else {
        return Err(DomainError::rate_limit_backend(format!(
            "Unexpected counter reply of {} values",
            reply.len()
        )));
    };

    Ok(CounterSnapshot {
        window_count: (*window_count).max(0) as u64,
        window_reset_at: now + Duration::milliseconds((*window_ttl_ms).max(0)),
        daily_count: (*daily_count).max(0) as u64,
        daily_reset_at: next_utc_midnight(now),
    })
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn hit(
        &self,
        key: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<CounterSnapshot, DomainError> {
        let mut conn = self.connection.clone();

        let reply: Vec<i64> = self
            .script
            .key(self.window_key(key))
            .key(self.daily_key(key, now))
            .arg(window.num_milliseconds().max(1))
            .arg(daily_ttl_ms(now))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| DomainError::rate_limit_backend(format!("Counter script failed: {}", e)))?;

        snapshot_from_reply(&reply, now)
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::rate_limit_backend(format!("Redis PING failed: {}", e)))?;

        Ok(pong == "PONG")
    }
}
