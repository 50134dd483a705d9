//! Minos — the Olympus judge worker service.
//!
//! Drains the durable judge queue, compiles and runs each submission's
//! testcases inside a Docker sandbox (spec §4.1/§4.2), and commits verdicts
//! through `olympus-store`.

use anyhow::Result;
use bollard::Docker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use olympus_store::{CacheCoordinator, CatalogLookup, JudgeQueue, SubmissionStore};

use minos::config::Config;
use minos::consumer::WorkerPool;
use minos::engine::JudgeEngine;
use minos::metrics::MetricsServer;
use minos::sandbox::SandboxRunner;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minos=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting minos judge worker");

    let config = Config::from_env();
    tracing::info!(environment = %config.environment, worker_count = config.worker_count, "loaded configuration");

    let db_pool = sqlx::PgPool::connect(&config.database_url).await?;
    sqlx::migrate!("../../migrations").run(&db_pool).await?;
    tracing::info!("database connected and migrated");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis_pool = redis_cfg.create_pool(Some(deadpool_redis::Runtime::Tokio1))?;
    tracing::info!("redis connected");

    let docker = Docker::connect_with_local_defaults()?;
    tracing::info!("docker client connected");

    tokio::fs::create_dir_all(&config.judge_root).await?;

    let cache = CacheCoordinator::new(redis_pool.clone(), "olympus");
    let lookup = CatalogLookup::new(db_pool.clone());
    let store = SubmissionStore::new(db_pool.clone(), cache);
    let queue = JudgeQueue::new(redis_pool.clone(), store.clone());

    let sandbox = SandboxRunner::new(docker);
    let judge_engine = JudgeEngine::new(sandbox, config.judge_root.clone());

    let pool = WorkerPool::new(
        queue,
        store,
        lookup,
        judge_engine,
        config.worker_count,
        config.pop_timeout_secs,
        config.shutdown_grace,
    );

    let handle = pool.start();
    tracing::info!(worker_count = config.worker_count, "judge worker pool running");

    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = MetricsServer::run(metrics_port).await {
            tracing::error!(error = %e, "metrics server error");
        }
    });

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, draining workers");

    handle.stop().await;
    tracing::info!("minos shutdown complete");

    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
