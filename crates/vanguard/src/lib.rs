//! Vanguard — library surface for the Submission Intake API, split out of
//! `main.rs` so integration tests under `tests/` can drive the real router.

pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod state;

#[cfg(feature = "test-support")]
pub mod test_utils;

use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::domain::{health, submissions};
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

/// Create the application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/", get(health::handler::health_check))
        .route("/live", get(health::handler::liveness))
        .route("/ready", get(health::handler::readiness));

    let submission_routes = Router::new()
        .route(
            "/",
            post(submissions::handler::create_submission).get(submissions::handler::list_submissions),
        )
        .route("/{id}", get(submissions::handler::get_submission))
        .route("/{id}/log", get(submissions::handler::get_submission_log))
        .route("/{id}/rejudge", put(submissions::handler::rejudge_submission))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_v1 = Router::new().nest("/submissions", submission_routes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/health", health_routes)
        .nest("/api/v1", api_v1)
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
