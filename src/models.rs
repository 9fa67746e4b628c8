use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationInfo {
    /// Federation name the upstream's tools are surfaced under.
    pub provider: String,
    /// Attach strategy: `import` or `mount`.
    pub mode: String,
    /// Federated tools currently known to the gateway.
    pub tool_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub app: String,
    pub uptime_seconds: u64,
    pub federation: FederationInfo,
}
