//! Route definitions and router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::bootstrap::AxumContext;
use crate::handlers;
use crate::state::AppState;

/// Every route with its one-line description, served by `GET /`.
pub const ENDPOINTS: [(&str, &str); 8] = [
    ("GET /", "Service info"),
    ("GET /health", "Health check"),
    ("GET /status", "Get API status and authentication state"),
    ("POST /download", "Start download task"),
    ("POST /refresh", "Refresh and download new content"),
    ("GET /tasks", "Get all tasks"),
    ("GET /tasks/{id}", "Get specific task"),
    ("POST /tasks/{id}/cancel", "Cancel task"),
];

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the Axum router with all API routes.
pub fn create_router(ctx: AxumContext) -> Router {
    let state: AppState = Arc::new(ctx);

    Router::new()
        .route("/", get(handlers::info::index))
        .route("/health", get(handlers::info::health))
        .route("/status", get(handlers::status::status))
        .route("/download", post(handlers::tasks::download))
        .route("/refresh", post(handlers::tasks::refresh))
        .route("/tasks", get(handlers::tasks::list))
        .route("/tasks/{id}", get(handlers::tasks::get))
        .route("/tasks/{id}/cancel", post(handlers::tasks::cancel))
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}
