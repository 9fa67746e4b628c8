//! Application state.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;

use crate::config::Config;
use crate::mcp::federation::Federation;
use crate::mcp::proxy::UpstreamProxy;

/// Central application state. Constructed once in the entry point and handed
/// to the router — no module-level singleton. Clone-friendly via Arc fields.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// The upstream provider's tools, attached per the configured mode.
    pub federation: Arc<Federation>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        let proxy = UpstreamProxy::new(client, &config.upstream);
        let federation = Arc::new(Federation::new(proxy, config.mode));

        Self {
            config: Arc::new(config),
            federation,
            start_time: Instant::now(),
        }
    }
}
