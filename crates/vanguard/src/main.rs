//! Vanguard - Submission Intake API for Olympus
//!
//! The thin HTTP surface over the judge core: validates, rate-limits, and
//! enqueues submissions, and serves the submission read/rejudge endpoints
//! (spec §4.7, §6). Authentication issuance, user/problem/contest CRUD, and
//! language registry management are external collaborators this service does
//! not implement.

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vanguard::config::{create_db_pool, create_redis_pool, Config};
use vanguard::state::AppState;
use vanguard::create_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vanguard=debug,tower_http=debug".into());
    if config.environment == "production" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Vanguard intake API");
    tracing::info!("Environment: {}", config.environment);

    tracing::info!("Connecting to database...");
    let db_pool = create_db_pool(&config.database_url).await?;
    tracing::info!("Database connected");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("../../migrations").run(&db_pool).await?;
    tracing::info!("Migrations complete");

    tracing::info!("Connecting to Redis...");
    let redis_pool = create_redis_pool(&config.redis_url)?;
    tracing::info!("Redis connected");

    let port = config.port;
    let state = AppState::new(db_pool, redis_pool, config);

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
