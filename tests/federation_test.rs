// ToolGate — federation integration tests
//
// A fake upstream MCP server is bound to an ephemeral port; the gateway is
// pointed at it and driven through the real router. The fake enforces the
// exact bearer token and session-id replay, so these tests cover the
// delegation path end to end for both attach strategies.

use axum::Json;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use toolgate::config::{Config, FederationMode};
use toolgate::state::AppState;

const API_KEY: &str = "test-key-123";
const SESSION_ID: &str = "fake-session";

// ── Fake upstream ───────────────────────────────────────────────────────────

async fn fake_upstream(headers: HeaderMap, Json(req): Json<Value>) -> axum::response::Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if auth != format!("Bearer {}", API_KEY) {
        return (StatusCode::UNAUTHORIZED, "bad token").into_response();
    }

    let id = req.get("id").cloned().unwrap_or(Value::Null);
    let method = req.get("method").and_then(|m| m.as_str()).unwrap_or("");

    // Everything after the handshake must replay the issued session id.
    if method != "initialize" {
        let session = headers
            .get("mcp-session-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if session != SESSION_ID {
            let body = json!({
                "jsonrpc": "2.0", "id": id,
                "error": { "code": -32000, "message": "missing session" }
            });
            return ([("mcp-session-id", SESSION_ID)], Json(body)).into_response();
        }
    }

    let body = match method {
        "initialize" => json!({
            "jsonrpc": "2.0", "id": id,
            "result": {
                "protocolVersion": "2024-11-05",
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "fake-upstream", "version": "0.0.1" }
            }
        }),
        "tools/list" => json!({
            "jsonrpc": "2.0", "id": id,
            "result": {
                "tools": [{
                    "name": "search_docs",
                    "description": "Search the documentation.",
                    "inputSchema": {
                        "type": "object",
                        "properties": { "query": { "type": "string" } },
                        "required": ["query"]
                    }
                }]
            }
        }),
        "tools/call" => {
            let name = req
                .pointer("/params/name")
                .and_then(|n| n.as_str())
                .unwrap_or("");
            let query = req
                .pointer("/params/arguments/query")
                .and_then(|q| q.as_str())
                .unwrap_or("");
            if name == "search_docs" {
                json!({
                    "jsonrpc": "2.0", "id": id,
                    "result": {
                        "content": [{ "type": "text", "text": format!("results for: {}", query) }],
                        "isError": false
                    }
                })
            } else {
                json!({
                    "jsonrpc": "2.0", "id": id,
                    "error": { "code": -32602, "message": "unknown tool" }
                })
            }
        }
        _ => json!({
            "jsonrpc": "2.0", "id": id,
            "error": { "code": -32601, "message": "method not found" }
        }),
    };

    ([("mcp-session-id", SESSION_ID)], Json(body)).into_response()
}

async fn spawn_fake_upstream() -> String {
    let app = axum::Router::new().route("/mcp", axum::routing::post(fake_upstream));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/mcp", addr)
}

// ── Gateway under test ──────────────────────────────────────────────────────

fn gateway_state(url: &str, mode: &str, api_key: &str) -> AppState {
    let url = url.to_string();
    let mode = mode.to_string();
    let api_key = api_key.to_string();
    let cfg = Config::from_lookup(move |key| match key {
        "UPSTREAM_MCP_URL" => Some(url.clone()),
        "UPSTREAM_API_KEY" => Some(api_key.clone()),
        "UPSTREAM_NAME" => Some("docs".to_string()),
        "FEDERATION_MODE" => Some(mode.clone()),
        _ => None,
    })
    .unwrap();
    AppState::new(cfg)
}

async fn rpc(app: axum::Router, body: Value) -> Value {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn list_tool_names(app: axum::Router) -> Vec<String> {
    let json = rpc(
        app,
        json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }),
    )
    .await;
    json["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str().map(String::from))
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_snapshots_upstream_tools_at_startup() {
    let url = spawn_fake_upstream().await;
    let state = gateway_state(&url, "import", API_KEY);

    state.federation.attach().await.unwrap();
    assert_eq!(state.federation.mode(), FederationMode::Import);

    let names = list_tool_names(toolgate::create_router(state)).await;
    assert!(names.contains(&"get_status".to_string()));
    assert!(names.contains(&"docs_search_docs".to_string()));
}

#[tokio::test]
async fn mount_lists_upstream_tools_live() {
    let url = spawn_fake_upstream().await;
    let state = gateway_state(&url, "mount", API_KEY);

    // Mount performs no upstream I/O at attach time.
    state.federation.attach().await.unwrap();
    assert_eq!(state.federation.tool_count().await, 0);

    let names = list_tool_names(toolgate::create_router(state)).await;
    assert!(names.contains(&"get_status".to_string()));
    assert!(names.contains(&"docs_search_docs".to_string()));
}

#[tokio::test]
async fn import_forwards_calls_to_upstream() {
    let url = spawn_fake_upstream().await;
    let state = gateway_state(&url, "import", API_KEY);
    state.federation.attach().await.unwrap();

    let json = rpc(
        toolgate::create_router(state),
        json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": { "name": "docs_search_docs", "arguments": { "query": "rust" } }
        }),
    )
    .await;

    assert_eq!(json["result"]["isError"], false);
    assert_eq!(json["result"]["content"][0]["text"], "results for: rust");
}

#[tokio::test]
async fn mount_forwards_calls_to_upstream() {
    let url = spawn_fake_upstream().await;
    let state = gateway_state(&url, "mount", API_KEY);
    state.federation.attach().await.unwrap();

    let json = rpc(
        toolgate::create_router(state),
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "docs_search_docs", "arguments": { "query": "axum" } }
        }),
    )
    .await;

    assert_eq!(json["result"]["isError"], false);
    assert_eq!(json["result"]["content"][0]["text"], "results for: axum");
}

#[tokio::test]
async fn import_attach_fails_when_upstream_rejects_auth() {
    let url = spawn_fake_upstream().await;
    let state = gateway_state(&url, "import", "wrong-key");

    assert!(state.federation.attach().await.is_err());
}

#[tokio::test]
async fn import_attach_fails_when_upstream_unreachable() {
    // Nothing listens on port 1.
    let state = gateway_state("http://127.0.0.1:1/mcp", "import", API_KEY);

    assert!(state.federation.attach().await.is_err());
}

#[tokio::test]
async fn import_tool_not_in_snapshot_is_error_content() {
    let url = spawn_fake_upstream().await;
    let state = gateway_state(&url, "import", API_KEY);
    state.federation.attach().await.unwrap();

    let json = rpc(
        toolgate::create_router(state),
        json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": { "name": "docs_not_discovered", "arguments": {} }
        }),
    )
    .await;

    assert_eq!(json["result"]["isError"], true);
}
