//! # Redis Counter Store
//!
//! Counters shared across gate instances. Connections are multiplexed by
//! `redis::aio::ConnectionManager`, which reconnects on its own after a
//! connection drop.
//!
//! The fixed-window step runs as one Lua script so the read, the create or
//! increment, and the TTL lookup happen atomically on the server:
//!
//! ```text
//! GET key
//!   absent         -> SET key 0 EX window     (created)
//!   >= max         -> TTL key                 (exhausted)
//!   otherwise      -> INCR key, TTL key       (counted)
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use keygate_core::{StoreError, WindowHit, WindowPolicy};
use redis::aio::ConnectionManager;
use redis::{Client, RedisError, Script};

use crate::counter::{CounterStore, DEFAULT_KEY_PREFIX};

const HIT_SCRIPT: &str = r"
local current = redis.call('GET', KEYS[1])
if not current then
  redis.call('SET', KEYS[1], 0, 'EX', ARGV[1])
  return {0, 0, tonumber(ARGV[1])}
end
current = tonumber(current)
if not current then
  return redis.error_reply('counter is not an integer')
end
local ttl = redis.call('TTL', KEYS[1])
if current >= tonumber(ARGV[2]) then
  return {2, current, ttl}
end
local count = redis.call('INCR', KEYS[1])
return {1, count, ttl}
";

const CREATED: i64 = 0;
const COUNTED: i64 = 1;
const EXHAUSTED: i64 = 2;

/// Redis-backed [`CounterStore`].
#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
    prefix: String,
    hit_script: Script,
}

impl fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl RedisCounterStore {
    /// Connect with the default key prefix.
    ///
    /// # Errors
    /// Returns [`StoreError::Unavailable`] when the URL is invalid or the
    /// server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        Self::connect_with_prefix(url, DEFAULT_KEY_PREFIX).await
    }

    /// Connect with a custom key prefix.
    pub async fn connect_with_prefix(url: &str, prefix: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(unavailable)?;
        let connection = ConnectionManager::new(client).await.map_err(unavailable)?;
        tracing::debug!(prefix, "connected to redis counter store");
        Ok(Self {
            connection,
            prefix: prefix.to_string(),
            hit_script: Script::new(HIT_SCRIPT),
        })
    }

    /// The key prefix in use.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn store_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.store_key(key))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        raw.map(|value| value.parse::<u64>().map_err(|_| StoreError::Corrupt(value)))
            .transpose()
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: u64,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let () = redis::cmd("SET")
            .arg(self.store_key(key))
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.connection.clone();
        let count: i64 = redis::cmd("INCR")
            .arg(self.store_key(key))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        non_negative(count)
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut conn = self.connection.clone();
        let ttl: i64 = redis::cmd("TTL")
            .arg(self.store_key(key))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(ttl_from_reply(ttl))
    }

    async fn hit(&self, key: &str, policy: &WindowPolicy) -> Result<WindowHit, StoreError> {
        let mut conn = self.connection.clone();
        let reply: Vec<i64> = self
            .hit_script
            .key(self.store_key(key))
            .arg(policy.window_secs())
            .arg(policy.max_requests())
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;
        decode_hit(&reply, policy)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

fn unavailable(err: RedisError) -> StoreError {
    StoreError::Unavailable(format!("redis: {err}"))
}

fn non_negative(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt(value.to_string()))
}

/// `TTL` replies -2 for a missing key and -1 for a key without expiry.
fn ttl_from_reply(ttl: i64) -> Option<Duration> {
    u64::try_from(ttl).ok().map(Duration::from_secs)
}

fn decode_hit(reply: &[i64], policy: &WindowPolicy) -> Result<WindowHit, StoreError> {
    let [code, count, ttl] = reply else {
        return Err(StoreError::Corrupt(format!("{reply:?}")));
    };
    match *code {
        CREATED => Ok(WindowHit::Created {
            ttl: policy.window(),
        }),
        COUNTED => Ok(WindowHit::Counted {
            count: non_negative(*count)?,
            ttl: ttl_from_reply(*ttl),
        }),
        EXHAUSTED => Ok(WindowHit::Exhausted {
            count: non_negative(*count)?,
            retry_after: ttl_from_reply(*ttl),
        }),
        other => Err(StoreError::Corrupt(format!("unknown hit code {other}"))),
    }
}
