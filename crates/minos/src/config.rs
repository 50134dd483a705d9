//! Configuration for the Minos judge worker service.

use std::env;
use std::path::PathBuf;

/// Minos configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub database_url: String,
    pub redis_url: String,

    /// Size of the worker pool (spec §4.5: "K is configured, typically 5").
    pub worker_count: usize,

    /// How long `pop_tail` blocks before the worker loop re-checks shutdown.
    pub pop_timeout_secs: f64,

    /// Grace period given to an in-flight task when `stop()` is called.
    pub shutdown_grace: std::time::Duration,

    pub metrics_port: u16,

    /// Root directory under which per-submission working directories are
    /// created (spec §4.2 step 2).
    pub judge_root: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            worker_count: env::var("WORKER_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            pop_timeout_secs: env::var("POP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.5),
            shutdown_grace: std::time::Duration::from_secs(
                env::var("SHUTDOWN_GRACE_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            metrics_port: env::var("METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9091),
            judge_root: PathBuf::from(
                env::var("JUDGE_ROOT").unwrap_or_else(|_| "/var/lib/olympus/judge".to_string()),
            ),
        }
    }
}
