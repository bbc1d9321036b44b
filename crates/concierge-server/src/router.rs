use axum::http::{header, HeaderName, Method};
use axum::{
    routing::{any, get},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::AppState;
use crate::handlers;

/// Create the main application router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // JSON-RPC tool router; the handler answers OPTIONS/HEAD and 405s itself
        .route("/mcp", any(handlers::rpc))
        // Chat orchestrator (POST only, enforced in the handler)
        .route("/chat", any(handlers::chat))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("mcp-session-id"),
        ])
}
