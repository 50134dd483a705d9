//! Application error type shared across all Olympus judge services.

use thiserror::Error;

/// Main application error type used across `olympus-store`, `minos`, and `vanguard`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Authorization failed - caller lacks permission
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request validation failed
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Conflict - e.g., a submission-id collision
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Redis error
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    InternalError(String),

    /// The Sandbox Runner could not create an execution environment
    #[error("Sandbox error: {0}")]
    SandboxError(String),

    /// Queue error
    #[error("Queue error: {0}")]
    QueueError(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Unauthorized(_) => 401,
            AppError::Forbidden(_) => 403,
            AppError::NotFound(_) => 404,
            AppError::ValidationError(_) => 400,
            AppError::Conflict(_) => 409,
            AppError::RateLimitExceeded => 429,
            AppError::DatabaseError(_) => 500,
            AppError::CacheError(_) => 500,
            AppError::InternalError(_) => 500,
            AppError::SandboxError(_) => 500,
            AppError::QueueError(_) => 500,
        }
    }

    /// Returns the machine-readable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::CacheError(_) => "CACHE_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
            AppError::SandboxError(_) => "SANDBOX_ERROR",
            AppError::QueueError(_) => "QUEUE_ERROR",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::DatabaseError(e.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::CacheError(e.to_string())
    }
}

impl From<deadpool_redis::PoolError> for AppError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        AppError::CacheError(e.to_string())
    }
}

/// Result type alias using [`AppError`].
pub type AppResult<T> = Result<T, AppError>;
