//! Shared fixtures for `olympus-store` integration tests.
//!
//! Mirrors `vanguard/src/test_utils.rs`'s lazy-container pattern (SPEC_FULL
//! §8), but each test function starts its own pair of containers rather than
//! sharing a process-wide `OnceLock` — store tests run sequentially and
//! truncate isn't worth the shared-state bookkeeping here.

use deadpool_redis::{Config as RedisConfig, Pool as RedisPool, Runtime};
use sqlx::PgPool;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::{postgres::Postgres, redis::Redis};

/// Holds the containers alongside the pools so they aren't dropped (and
/// torn down) while the test is still using them.
pub struct TestEnv {
    pub db: PgPool,
    pub redis: RedisPool,
    _postgres: ContainerAsync<Postgres>,
    _redis: ContainerAsync<Redis>,
}

impl TestEnv {
    pub async fn setup() -> Self {
        let postgres = Postgres::default()
            .with_user("olympus")
            .with_password("olympus_test")
            .with_db_name("olympus_test")
            .start()
            .await
            .expect("failed to start postgres container");
        let redis = Redis::default()
            .start()
            .await
            .expect("failed to start redis container");

        let pg_host = postgres.get_host().await.unwrap();
        let pg_port = postgres.get_host_port_ipv4(5432).await.unwrap();
        let database_url =
            format!("postgres://olympus:olympus_test@{pg_host}:{pg_port}/olympus_test");

        let db = PgPool::connect(&database_url)
            .await
            .expect("failed to connect to test database");
        sqlx::migrate!("../../migrations")
            .run(&db)
            .await
            .expect("failed to run migrations");

        let redis_host = redis.get_host().await.unwrap();
        let redis_port = redis.get_host_port_ipv4(6379).await.unwrap();
        let redis_cfg = RedisConfig::from_url(format!("redis://{redis_host}:{redis_port}"));
        let redis_pool = redis_cfg
            .create_pool(Some(Runtime::Tokio1))
            .expect("failed to create redis pool");

        Self {
            db,
            redis: redis_pool,
            _postgres: postgres,
            _redis: redis,
        }
    }

    /// Inserts a user/language/problem triple satisfying the FK constraints
    /// `submissions`/`resolve_records` depend on, and returns the user id.
    pub async fn seed_fixtures(&self, problem_id: &str, language: &str) -> i64 {
        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash) VALUES ($1, 'x') RETURNING id",
        )
        .bind(format!("user_{problem_id}_{language}"))
        .fetch_one(&self.db)
        .await
        .expect("seed user");

        sqlx::query(
            "INSERT INTO languages (name, file_ext, compile_cmd, run_cmd, time_limit_seconds, memory_limit_mib, image)
             VALUES ($1, 'py', NULL, 'python3 {src}', 2.0, 256, 'olympus/python:3.11')
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(language)
        .execute(&self.db)
        .await
        .expect("seed language");

        sqlx::query(
            "INSERT INTO problems (id, time_limit_seconds, memory_limit_mib) VALUES ($1, NULL, NULL)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(problem_id)
        .execute(&self.db)
        .await
        .expect("seed problem");

        user_id
    }
}
