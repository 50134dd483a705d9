//! Application state shared across all handlers.

use std::sync::Arc;

use deadpool_redis::Pool as RedisPool;
use sqlx::PgPool;

use olympus_store::{CacheCoordinator, CatalogLookup, JudgeQueue, RateLimiter, SubmissionStore};

use crate::config::Config;

/// Shared application state: the Intake API owns no judging logic, only
/// the store/queue/rate-limiter handles it calls into (SPEC_FULL §2).
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: RedisPool,
    pub config: Arc<Config>,
    pub store: SubmissionStore,
    pub queue: JudgeQueue,
    pub lookup: CatalogLookup,
    pub rate_limiter: RateLimiter,
    pub cache: CacheCoordinator,
}

impl AppState {
    pub fn new(db: PgPool, redis: RedisPool, config: Config) -> Self {
        let cache = CacheCoordinator::new(redis.clone(), "olympus");
        let store = SubmissionStore::new(db.clone(), cache.clone());
        let queue = JudgeQueue::new(redis.clone(), store.clone());
        let lookup = CatalogLookup::new(db.clone());
        let rate_limiter = RateLimiter::new(redis.clone());

        Self {
            db,
            redis,
            config: Arc::new(config),
            store,
            queue,
            lookup,
            rate_limiter,
            cache,
        }
    }
}
