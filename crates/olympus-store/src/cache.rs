//! Cache Coordinator (spec §4.6).
//!
//! Caches list-query responses under `{prefix}:{hash}` and keeps a reverse
//! index `{prefix}:{entity_hash}:{uuid}` from entity identity to the cache
//! keys whose response depends on that entity, so a mutating write can
//! invalidate precisely instead of waiting out a TTL.

use deadpool_redis::Pool as RedisPool;
use rand::Rng;
use redis::AsyncCommands;
use sha2::{Digest, Sha256};

use olympus_common::AppResult;

const DEFAULT_TTL_SECS: u64 = 120;

/// Cache coordinator over a shared Redis pool.
#[derive(Clone)]
pub struct CacheCoordinator {
    redis: RedisPool,
    prefix: String,
    ttl_secs: u64,
}

impl CacheCoordinator {
    pub fn new(redis: RedisPool, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Hash a query fingerprint (kind, filters, pagination, viewer) into a cache key.
    pub fn query_key(&self, kind: &str, fingerprint: &str) -> String {
        let digest = Self::hash(&format!("{kind}:{fingerprint}"));
        format!("{}:{}", self.prefix, digest)
    }

    fn entity_key_prefix(&self, entity_kind: &str, field: &str, value: &str) -> String {
        let digest = Self::hash(&format!("{entity_kind}:{field}:{value}"));
        format!("{}:{}", self.prefix, digest)
    }

    fn hash(s: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(s.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Fetch a cached response body, if present.
    pub async fn get(&self, cache_key: &str) -> AppResult<Option<String>> {
        let mut conn = self.redis.get().await?;
        let value: Option<String> = conn.get(cache_key).await?;
        Ok(value)
    }

    /// Store a response body under `cache_key`, and register it against every
    /// entity the response depends on so it can be invalidated precisely.
    pub async fn put(
        &self,
        cache_key: &str,
        body: &str,
        depends_on: &[(&str, &str, &str)],
    ) -> AppResult<()> {
        let mut conn = self.redis.get().await?;
        conn.set_ex::<_, _, ()>(cache_key, body, self.ttl_secs).await?;

        for (entity_kind, field, value) in depends_on {
            let suffix: u64 = rand::rng().random();
            let index_key = format!(
                "{}:{:016x}",
                self.entity_key_prefix(entity_kind, field, value),
                suffix
            );
            conn.set_ex::<_, _, ()>(&index_key, cache_key, self.ttl_secs).await?;
        }

        Ok(())
    }

    /// Invalidate every cached response that depends on `entity_kind.field = value`.
    pub async fn invalidate(&self, entity_kind: &str, field: &str, value: &str) -> AppResult<()> {
        let mut conn = self.redis.get().await?;
        let pattern = format!("{}:*", self.entity_key_prefix(entity_kind, field, value));

        let index_keys: Vec<String> = conn.keys(&pattern).await?;
        if index_keys.is_empty() {
            return Ok(());
        }

        let cache_keys: Vec<Option<String>> = conn.mget(&index_keys).await?;
        let to_delete: Vec<String> = cache_keys.into_iter().flatten().collect();

        if !to_delete.is_empty() {
            conn.del::<_, ()>(&to_delete).await?;
        }
        conn.del::<_, ()>(&index_keys).await?;

        Ok(())
    }
}
