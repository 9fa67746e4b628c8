//! JSON-RPC 2.0 client for the upstream MCP provider.
//!
//! Performs the `initialize` handshake, discovers the upstream tool set, and
//! forwards `tools/call` requests. Every request carries the configured
//! bearer token; session affinity uses the `Mcp-Session-Id` header when the
//! upstream issues one.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use crate::config::UpstreamConfig;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Response bodies from a misbehaving upstream are truncated to this many
/// bytes before they end up in an error message.
const MAX_ERROR_BODY: usize = 500;

// ── Tool descriptor ─────────────────────────────────────────────────────────

/// A tool discovered from the upstream provider, enriched with the prefixed
/// name it is surfaced under by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederatedTool {
    /// Original tool name on the upstream server.
    pub name: String,
    /// Name exposed by the gateway: `{provider}_{name}`.
    pub prefixed_name: String,
    /// Tool description from the upstream server.
    pub description: Option<String>,
    /// JSON Schema for tool input parameters.
    pub input_schema: Value,
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("upstream returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("upstream response is not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("upstream error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("federated tool '{0}' not found")]
    UnknownTool(String),
}

// ── Proxy ───────────────────────────────────────────────────────────────────

/// Delegating connection to one upstream MCP provider.
///
/// Created once at startup. The handshake runs at most once per process and
/// is triggered by whichever call needs the upstream first; a failed
/// handshake surfaces to that caller and is attempted again on the next one.
#[derive(Debug)]
pub struct UpstreamProxy {
    client: Client,
    url: String,
    provider: String,
    api_key: String,
    timeout: Duration,
    handshake: OnceCell<()>,
    /// Session id issued by the upstream, replayed on subsequent requests.
    /// `std::sync::Mutex` — only held for the clone/store, never across await.
    session_id: std::sync::Mutex<Option<String>>,
}

impl UpstreamProxy {
    pub fn new(client: Client, cfg: &UpstreamConfig) -> Self {
        Self {
            client,
            url: cfg.url.clone(),
            provider: sanitize_provider_name(&cfg.name),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout,
            handshake: OnceCell::new(),
            session_id: std::sync::Mutex::new(None),
        }
    }

    /// Sanitized federation name the upstream's tools are prefixed with.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn prefixed(&self, name: &str) -> String {
        format!("{}_{}", self.provider, name)
    }

    /// Strip the provider prefix from a gateway tool name, yielding the
    /// original upstream name. `None` if the name isn't addressed to this
    /// provider.
    pub fn strip_prefix<'a>(&self, prefixed: &'a str) -> Option<&'a str> {
        prefixed
            .strip_prefix(&self.provider)
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|rest| !rest.is_empty())
    }

    // ── Handshake ───────────────────────────────────────────────────────

    async fn ensure_initialized(&self) -> Result<(), UpstreamError> {
        self.handshake
            .get_or_try_init(|| self.initialize())
            .await?;
        Ok(())
    }

    async fn initialize(&self) -> Result<(), UpstreamError> {
        let response = self
            .rpc(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {
                        "tools": { "listChanged": true }
                    },
                    "clientInfo": {
                        "name": "ToolGate",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }
            }))
            .await?;

        tracing::debug!(
            "upstream '{}': initialized (server: {}, protocol: {})",
            self.provider,
            response
                .pointer("/result/serverInfo/name")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown"),
            response
                .pointer("/result/protocolVersion")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown"),
        );

        Ok(())
    }

    // ── Discovery ───────────────────────────────────────────────────────

    /// Fetch the upstream tool set and map it to gateway descriptors.
    pub async fn discover_tools(&self) -> Result<Vec<FederatedTool>, UpstreamError> {
        self.ensure_initialized().await?;

        let response = self
            .rpc(json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/list"
            }))
            .await?;

        let raw_tools = response
            .pointer("/result/tools")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let tools: Vec<FederatedTool> = raw_tools
            .iter()
            .filter_map(|t| {
                let name = t.get("name")?.as_str()?.to_string();
                let description = t
                    .get("description")
                    .and_then(|d| d.as_str())
                    .map(String::from);
                let input_schema = t
                    .get("inputSchema")
                    .cloned()
                    .unwrap_or(json!({"type": "object", "properties": {}}));

                Some(FederatedTool {
                    prefixed_name: self.prefixed(&name),
                    name,
                    description,
                    input_schema,
                })
            })
            .collect();

        Ok(tools)
    }

    // ── Call forwarding ─────────────────────────────────────────────────

    /// Call an upstream tool by its original (unprefixed) name.
    pub async fn call_tool(
        &self,
        original_name: &str,
        arguments: &Value,
    ) -> Result<String, UpstreamError> {
        self.ensure_initialized().await?;

        let response = self
            .rpc(json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {
                    "name": original_name,
                    "arguments": arguments
                }
            }))
            .await?;

        // tools/call results are { content: [{ type: "text", text: "..." }] }
        if let Some(content) = response.pointer("/result/content") {
            if let Some(text) = extract_text_content(content) {
                return Ok(text);
            }
            return Ok(content.to_string());
        }

        Ok(response
            .get("result")
            .map(|r| r.to_string())
            .unwrap_or_else(|| "{}".to_string()))
    }

    // ── JSON-RPC transport ──────────────────────────────────────────────

    async fn rpc(&self, body: Value) -> Result<Value, UpstreamError> {
        let session_id = self
            .session_id
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();

        let mut req = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Authorization", bearer(&self.api_key))
            .timeout(self.timeout)
            .json(&body);

        if let Some(sid) = session_id {
            req = req.header("Mcp-Session-Id", sid);
        }

        let response = req.send().await.map_err(|e| UpstreamError::Transport {
            url: self.url.clone(),
            source: e,
        })?;

        if let Some(sid) = response
            .headers()
            .get("mcp-session-id")
            .and_then(|v| v.to_str().ok())
        {
            *self.session_id.lock().unwrap_or_else(|p| p.into_inner()) = Some(sid.to_string());
        }

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status,
                body: truncate_str(&body_text, MAX_ERROR_BODY),
            });
        }

        let json: Value = response.json().await.map_err(UpstreamError::Decode)?;

        // JSON-RPC protocol errors surface uniformly, whichever method
        // produced them.
        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown MCP error")
                .to_string();
            let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
            return Err(UpstreamError::Rpc { code, message });
        }

        Ok(json)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// The exact header value sent upstream: the literal `Bearer ` prefix
/// followed by the configured key.
pub fn bearer(api_key: &str) -> String {
    format!("Bearer {}", api_key)
}

/// Join the text parts of an MCP content array, newline-separated.
fn extract_text_content(content: &Value) -> Option<String> {
    let arr = content.as_array()?;
    let texts: Vec<&str> = arr
        .iter()
        .filter_map(|c| {
            if c.get("type").and_then(|t| t.as_str()) == Some("text") {
                c.get("text").and_then(|t| t.as_str())
            } else {
                None
            }
        })
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}

fn sanitize_provider_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
        } else if !result.ends_with('_') {
            result.push('_');
        }
    }
    result.trim_end_matches('_').to_string()
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let boundary = s
            .char_indices()
            .take_while(|(i, _)| *i < max_len)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(max_len);
        format!("{}...", &s[..boundary])
    }
}
