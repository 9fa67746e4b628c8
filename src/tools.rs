//! Native tool execution.
//!
//! ToolGate ships one native tool:
//! - `get_status` — fixed status/version record; no arguments, no side
//!   effects, no failure modes.

use serde_json::{json, Value};

/// Version reported by `get_status`. Fixed — part of the tool's contract,
/// independent of the crate version.
const STATUS_VERSION: &str = "1.0.0";

/// Central dispatcher — routes a native tool call to its handler.
pub fn execute_tool(name: &str, _args: &Value) -> Result<String, String> {
    match name {
        "get_status" => Ok(tool_get_status().to_string()),
        other => Err(format!("Unknown tool: {}", other)),
    }
}

pub fn is_native_tool(name: &str) -> bool {
    name == "get_status"
}

fn tool_get_status() -> Value {
    json!({ "status": "healthy", "version": STATUS_VERSION })
}

/// MCP `tools/list` descriptors for all native tools.
pub fn native_tool_list() -> Vec<Value> {
    vec![mcp_tool(
        "get_status",
        "Get the current system status.",
        json!({
            "type": "object",
            "properties": {}
        }),
    )]
}

fn mcp_tool(name: &str, description: &str, input_schema: Value) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": input_schema,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_status_returns_fixed_record() {
        let out = execute_tool("get_status", &json!({})).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({ "status": "healthy", "version": "1.0.0" }));
    }

    #[test]
    fn get_status_ignores_arguments() {
        let a = execute_tool("get_status", &json!({})).unwrap();
        let b = execute_tool("get_status", &json!({ "extra": 42 })).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_tool_is_an_error() {
        assert!(execute_tool("reboot", &json!({})).is_err());
        assert!(!is_native_tool("reboot"));
        assert!(is_native_tool("get_status"));
    }

    #[test]
    fn native_listing_has_empty_object_schema() {
        let tools = native_tool_list();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "get_status");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
    }
}
