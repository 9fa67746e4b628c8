//! Attach strategies for the upstream provider.
//!
//! One enumerated strategy, chosen at startup:
//!
//! - `import` — copy-snapshot: the upstream tool set is discovered once,
//!   before serving begins, and the listing is frozen from then on.
//! - `mount` — live-delegate: no startup I/O; each listing refreshes from
//!   the upstream, so upstream changes remain visible.
//!
//! In both modes invocations are forwarded to the upstream at call time.

use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::FederationMode;
use crate::mcp::proxy::{FederatedTool, UpstreamError, UpstreamProxy};

/// The upstream provider's tools, merged into the gateway's namespace.
#[derive(Debug)]
pub struct Federation {
    proxy: UpstreamProxy,
    mode: FederationMode,
    /// Last known upstream tool set. Authoritative in `import` mode; a
    /// fallback cache in `mount` mode.
    tools: RwLock<Vec<FederatedTool>>,
}

impl Federation {
    pub fn new(proxy: UpstreamProxy, mode: FederationMode) -> Self {
        Self {
            proxy,
            mode,
            tools: RwLock::new(Vec::new()),
        }
    }

    pub fn mode(&self) -> FederationMode {
        self.mode
    }

    pub fn provider(&self) -> &str {
        self.proxy.provider()
    }

    // ── Attach ──────────────────────────────────────────────────────────

    /// Attach the upstream provider. `import` snapshots the upstream tool
    /// set and fails if discovery fails; `mount` defers all upstream I/O to
    /// request time.
    pub async fn attach(&self) -> Result<(), UpstreamError> {
        match self.mode {
            FederationMode::Import => {
                let tools = self.proxy.discover_tools().await?;
                tracing::info!(
                    "federation: imported {} tool(s) from '{}'",
                    tools.len(),
                    self.proxy.provider()
                );
                *self.tools.write().await = tools;
                Ok(())
            }
            FederationMode::Mount => {
                tracing::info!(
                    "federation: mounted '{}' (live delegation)",
                    self.proxy.provider()
                );
                Ok(())
            }
        }
    }

    // ── Tool access ─────────────────────────────────────────────────────

    /// The federated tool set as the gateway currently exposes it.
    ///
    /// `mount` mode refreshes from the upstream first; if the refresh fails
    /// the last known set is served and a warning logged.
    pub async fn list_tools(&self) -> Vec<FederatedTool> {
        if self.mode == FederationMode::Mount {
            match self.proxy.discover_tools().await {
                Ok(tools) => *self.tools.write().await = tools,
                Err(e) => tracing::warn!(
                    "federation: live tool listing from '{}' failed: {}",
                    self.proxy.provider(),
                    e
                ),
            }
        }
        self.tools.read().await.clone()
    }

    /// Number of federated tools currently known. No upstream I/O.
    pub async fn tool_count(&self) -> usize {
        self.tools.read().await.len()
    }

    /// Whether a gateway tool name addresses this provider.
    pub fn is_federated_name(&self, name: &str) -> bool {
        self.proxy.strip_prefix(name).is_some()
    }

    // ── Call routing ────────────────────────────────────────────────────

    /// Forward a call on a prefixed tool name to the upstream.
    ///
    /// `import` resolves against the startup snapshot (the frozen namespace);
    /// `mount` strips the provider prefix and forwards whatever the caller
    /// asked for, since the live set is owned by the upstream.
    pub async fn call(&self, prefixed: &str, arguments: &Value) -> Result<String, UpstreamError> {
        let original = match self.mode {
            FederationMode::Import => self
                .tools
                .read()
                .await
                .iter()
                .find(|t| t.prefixed_name == prefixed)
                .map(|t| t.name.clone()),
            FederationMode::Mount => self.proxy.strip_prefix(prefixed).map(String::from),
        };

        let original =
            original.ok_or_else(|| UpstreamError::UnknownTool(prefixed.to_string()))?;

        tracing::info!(
            "federation: forwarding '{}' to '{}'",
            prefixed,
            self.proxy.provider()
        );
        self.proxy.call_tool(&original, arguments).await
    }
}
