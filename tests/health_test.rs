// ToolGate — health endpoint integration tests

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use toolgate::config::Config;
use toolgate::state::AppState;

fn test_app() -> axum::Router {
    let cfg = Config::from_lookup(|key| match key {
        "UPSTREAM_MCP_URL" => Some("http://127.0.0.1:9/mcp".to_string()),
        "UPSTREAM_API_KEY" => Some("test-key-123".to_string()),
        _ => None,
    })
    .unwrap();
    toolgate::create_router(AppState::new(cfg))
}

/// Collect a response body into a `serde_json::Value`.
async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_endpoint_reports_federation_info() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["app"], "ToolGate");
    assert_eq!(json["federation"]["provider"], "upstream");
    assert_eq!(json["federation"]["mode"], "import");
}

#[tokio::test]
async fn readiness_endpoint_returns_ok() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn nonexistent_route_returns_404() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
