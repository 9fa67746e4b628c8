//! Health endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::models::{FederationInfo, HealthResponse};
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        app: "ToolGate".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        federation: FederationInfo {
            provider: state.federation.provider().to_string(),
            mode: state.federation.mode().as_str().to_string(),
            tool_count: state.federation.tool_count().await,
        },
    })
}

pub async fn readiness() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "ready": true })))
}
