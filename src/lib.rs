pub mod config;
pub mod handlers;
pub mod mcp;
pub mod models;
pub mod state;
pub mod tools;

use axum::Router;
use axum::routing::{get, post};

use state::AppState;

/// Build the application router with the given state.
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a network port.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // MCP endpoint — native + federated tools
        .route("/mcp", post(mcp::server::mcp_handler))
        // Health
        .route("/api/health", get(handlers::health))
        .route("/api/health/ready", get(handlers::readiness))
        // Shared state
        .with_state(state)
}
