//! MCP (Model Context Protocol) support — server endpoint, upstream proxy,
//! federation.
//!
//! **Server** (`mcp_handler`): exposes native plus federated tools as one MCP
//! endpoint external clients call via JSON-RPC 2.0 over HTTP.
//!
//! **Proxy** (`UpstreamProxy`): delegating connection to the configured
//! upstream provider — handshake, tool discovery, call forwarding with
//! bearer auth.
//!
//! **Federation** (`Federation`): merges the upstream tool set into the
//! local namespace via the `import` / `mount` attach strategies.
//!
//! Protocol: JSON-RPC 2.0 over HTTP (lightweight, no stdio transport).
//! Spec: <https://spec.modelcontextprotocol.io/2024-11-05/>

pub mod federation;
pub mod proxy;
pub mod server;
