//! MCP server — exposes ToolGate's native and federated tools as one MCP
//! endpoint.
//!
//! External MCP clients discover and call tools via JSON-RPC 2.0 over HTTP
//! POST at `/mcp`.
//!
//! Supported methods:
//! - `initialize` — server info + capabilities
//! - `notifications/initialized` — client ack (no-op)
//! - `tools/list` — native tools merged with the federated upstream set
//! - `tools/call` — execute a tool, locally or via delegation
//! - `ping` — health check

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::config::FederationMode;
use crate::state::AppState;
use crate::tools;

/// Display name reported in `serverInfo`.
pub const SERVER_NAME: &str = "ToolGate";

/// MCP JSON-RPC 2.0 endpoint handler.
///
/// Routes incoming JSON-RPC requests to the appropriate method handler.
/// Supports both single requests and notifications (no `id` field).
pub async fn mcp_handler(
    State(state): State<AppState>,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");
    let id = request.get("id").cloned().unwrap_or(Value::Null);

    tracing::debug!(method = %method, "mcp: incoming request");

    let result = match method {
        "initialize" => handle_initialize(&state, &id),
        "notifications/initialized" => {
            // Client acknowledgment — no response needed for notifications
            return (StatusCode::OK, Json(json!({})));
        }
        "ping" => handle_ping(&id),
        "tools/list" => handle_tools_list(&state, &id).await,
        "tools/call" => handle_tools_call(&state, &request, &id).await,
        _ => json_rpc_error(id, -32601, &format!("Method not found: {}", method)),
    };

    (StatusCode::OK, Json(result))
}

// ── initialize ──────────────────────────────────────────────────────────────

fn handle_initialize(state: &AppState, id: &Value) -> Value {
    // `mount` keeps a live link, so the tool list can change under the
    // caller; `import` froze it at startup.
    let list_changed = state.federation.mode() == FederationMode::Mount;

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "protocolVersion": crate::mcp::proxy::PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": list_changed }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": format!(
                "ToolGate — federated MCP gateway: native status tooling plus the '{}' upstream toolset.",
                state.federation.provider()
            )
        }
    })
}

// ── ping ────────────────────────────────────────────────────────────────────

fn handle_ping(id: &Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {}
    })
}

// ── tools/list ──────────────────────────────────────────────────────────────

async fn handle_tools_list(state: &AppState, id: &Value) -> Value {
    let mut all_tools = tools::native_tool_list();

    let federated: Vec<Value> = state
        .federation
        .list_tools()
        .await
        .into_iter()
        .map(|t| {
            json!({
                "name": t.prefixed_name,
                "description": t.description.unwrap_or_default(),
                "inputSchema": t.input_schema,
            })
        })
        .collect();
    all_tools.extend(federated);

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "tools": all_tools
        }
    })
}

// ── tools/call ──────────────────────────────────────────────────────────────

async fn handle_tools_call(state: &AppState, request: &Value, id: &Value) -> Value {
    let params = request.get("params").cloned().unwrap_or(json!({}));
    let tool_name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    if tool_name.is_empty() {
        return json_rpc_error(id.clone(), -32602, "Missing 'name' in params");
    }

    tracing::info!(tool = %tool_name, "mcp: tools/call");

    // Native names win a lookup before federated ones.
    if tools::is_native_tool(tool_name) {
        return match tools::execute_tool(tool_name, &arguments) {
            Ok(text) => tool_result(id, &text, false),
            Err(e) => tool_result(id, &format!("Error: {}", e), true),
        };
    }

    if state.federation.is_federated_name(tool_name) {
        return match state.federation.call(tool_name, &arguments).await {
            Ok(text) => tool_result(id, &text, false),
            Err(e) => tool_result(id, &format!("Error: {}", e), true),
        };
    }

    tool_result(id, &format!("Unknown tool: {}", tool_name), true)
}

fn tool_result(id: &Value, text: &str, is_error: bool) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "content": [{ "type": "text", "text": text }],
            "isError": is_error
        }
    })
}

// ── JSON-RPC error helper ───────────────────────────────────────────────────

fn json_rpc_error(id: Value, code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}
