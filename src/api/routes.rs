//! API Route Configuration

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{logging_middleware, rate_limit_middleware, request_id_middleware};

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>, max_concurrency: usize) -> Router {
    // Any origin: the extension calls from arbitrary pages
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & Status
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        // Transaction Analysis
        .route("/analyze", post(handlers::analyze))
        // Community Registry
        .route("/registry/check", get(handlers::registry_check))
        .route("/registry/latest", get(handlers::registry_latest))
        .route("/registry/report", post(handlers::registry_report))
        .route("/registry/verify", post(handlers::registry_verify))
        // Middleware (order matters - bottom runs first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(ConcurrencyLimitLayer::new(max_concurrency))
        .with_state(state)
}
