//! Integration tests for [`olympus_store::RateLimiter`] against a real Redis
//! instance (spec §4.3, P4).

use deadpool_redis::{Config as RedisConfig, Runtime};
use olympus_store::RateLimiter;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::redis::Redis;

async fn redis_limiter() -> (RateLimiter, testcontainers::ContainerAsync<Redis>) {
    let redis = Redis::default()
        .start()
        .await
        .expect("failed to start redis container");
    let host = redis.get_host().await.unwrap();
    let port = redis.get_host_port_ipv4(6379).await.unwrap();
    let cfg = RedisConfig::from_url(format!("redis://{host}:{port}"));
    let pool = cfg
        .create_pool(Some(Runtime::Tokio1))
        .expect("failed to create redis pool");
    (RateLimiter::new(pool), redis)
}

#[tokio::test]
async fn allows_exactly_the_configured_limit_per_window() {
    let (limiter, _redis) = redis_limiter().await;
    let user_id = 42;

    assert!(limiter.allow_to_submit(user_id).await.unwrap());
    assert!(limiter.allow_to_submit(user_id).await.unwrap());
    assert!(limiter.allow_to_submit(user_id).await.unwrap());
    // Fourth submission within the default 60s/3 window must be denied (P4).
    assert!(!limiter.allow_to_submit(user_id).await.unwrap());
}

#[tokio::test]
async fn does_not_leak_across_users() {
    let (limiter, _redis) = redis_limiter().await;

    assert!(limiter.allow_to_submit(1).await.unwrap());
    assert!(limiter.allow_to_submit(1).await.unwrap());
    assert!(limiter.allow_to_submit(1).await.unwrap());
    assert!(!limiter.allow_to_submit(1).await.unwrap());

    // A different user has an independent window.
    assert!(limiter.allow_to_submit(2).await.unwrap());
}

#[tokio::test]
async fn sliding_window_purges_expired_entries_and_reallows() {
    let (limiter, _redis) = redis_limiter().await;
    let limiter = limiter.with_limit(2, 1);
    let user_id = 7;

    assert!(limiter.allow_to_submit(user_id).await.unwrap());
    assert!(limiter.allow_to_submit(user_id).await.unwrap());
    assert!(!limiter.allow_to_submit(user_id).await.unwrap());

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    // The whole window has aged out, so the purge at the top of the script
    // drops both entries and this submission is allowed again.
    assert!(limiter.allow_to_submit(user_id).await.unwrap());
}
