//! Redis-backed client detail cache
//!
//! Shared across server instances. Entries are JSON with a server-side expiry;
//! eviction generations live in a companion counter key and fills are applied
//! by a Lua script that checks the counter first.

use crate::errors::CacheError;
use crate::oauth::types::ClientDetail;
use crate::storage::traits::{CacheLookup, CacheTicket, ClientDetailCache};
use async_trait::async_trait;
use deadpool_redis::{Config as RedisPoolConfig, Connection, Pool, Runtime};
use std::time::Duration;

const KEY_PREFIX: &str = "idp:client_detail";

const FILL_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[2])
if (current or '0') ~= ARGV[1] then
    return 0
end
redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
return 1
"#;

/// Redis implementation of `ClientDetailCache`
pub struct RedisClientCache {
    pool: Pool,
    ttl: Duration,
    fill_script: redis::Script,
}

impl RedisClientCache {
    /// Build a connection pool for `redis_url`
    pub fn new(redis_url: &str, ttl: Duration) -> Result<Self, CacheError> {
        let pool = RedisPoolConfig::from_url(redis_url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::ConnectionFailed(format!("Redis pool setup failed: {}", e)))?;

        Ok(Self {
            pool,
            ttl,
            fill_script: redis::Script::new(FILL_SCRIPT),
        })
    }

    fn detail_key(client_id: &str) -> String {
        format!("{}:{}", KEY_PREFIX, client_id)
    }

    fn generation_key(client_id: &str) -> String {
        format!("{}_gen:{}", KEY_PREFIX, client_id)
    }

    async fn connection(&self) -> Result<Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::ConnectionFailed(e.to_string()))
    }
}

#[async_trait]
impl ClientDetailCache for RedisClientCache {
    async fn lookup(&self, client_id: &str) -> Result<CacheLookup, CacheError> {
        let mut conn = self.connection().await?;

        let (cached, generation): (Option<String>, Option<u64>) = redis::cmd("MGET")
            .arg(Self::detail_key(client_id))
            .arg(Self::generation_key(client_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::OperationFailed(e.to_string()))?;

        if let Some(cached) = cached {
            match serde_json::from_str::<ClientDetail>(&cached) {
                Ok(detail) => return Ok(CacheLookup::Hit(detail)),
                Err(e) => {
                    // Treated as a miss; the next fill overwrites the entry.
                    tracing::warn!(client_id = %client_id, error = ?e, "discarding unreadable cached client detail");
                }
            }
        }

        Ok(CacheLookup::Miss(CacheTicket {
            client_id: client_id.to_string(),
            generation: generation.unwrap_or_default(),
        }))
    }

    async fn fill(&self, ticket: CacheTicket, detail: &ClientDetail) -> Result<bool, CacheError> {
        let serialized = serde_json::to_string(detail)
            .map_err(|e| CacheError::SerializationFailed(e.to_string()))?;
        let mut conn = self.connection().await?;

        let installed: i64 = self
            .fill_script
            .key(Self::detail_key(&ticket.client_id))
            .key(Self::generation_key(&ticket.client_id))
            .arg(ticket.generation.to_string())
            .arg(serialized)
            .arg(self.ttl.as_secs().max(1))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CacheError::OperationFailed(e.to_string()))?;

        Ok(installed == 1)
    }

    async fn evict(&self, client_id: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;

        let _: () = redis::pipe()
            .atomic()
            .del(Self::detail_key(client_id))
            .ignore()
            .incr(Self::generation_key(client_id), 1)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::OperationFailed(e.to_string()))?;

        Ok(())
    }
}
