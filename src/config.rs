//! Environment-driven configuration.
//!
//! Everything is read once at startup and immutable for the process lifetime.
//! The two upstream values are required; a missing or empty value aborts
//! startup before any server object is constructed.

use std::time::Duration;

use url::Url;

const DEFAULT_PORT: u16 = 8081;
const DEFAULT_PROVIDER_NAME: &str = "upstream";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Forwarded calls never run with less than this timeout.
const MIN_TIMEOUT_SECS: u64 = 5;

// ---------------------------------------------------------------------------
// Federation mode
// ---------------------------------------------------------------------------

/// How the upstream provider's tools are attached to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FederationMode {
    /// Copy the upstream tool set into the local listing once at startup.
    Import,
    /// Keep a live delegating link; upstream changes stay visible.
    Mount,
}

impl FederationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Mount => "mount",
        }
    }
}

impl std::str::FromStr for FederationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "import" => Ok(Self::Import),
            "mount" => Ok(Self::Mount),
            other => Err(ConfigError::Invalid {
                var: "FEDERATION_MODE",
                reason: format!("'{}' is not one of: import, mount", other),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set and non-empty")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Connection settings for the one federated upstream provider.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Federation name the upstream's tools are surfaced under.
    pub name: String,
    /// MCP endpoint URL (HTTP transport).
    pub url: String,
    /// Secret interpolated into the `Authorization: Bearer <key>` header.
    pub api_key: String,
    /// Per-request timeout for forwarded calls.
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub mode: FederationMode,
    pub port: u16,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse configuration from an arbitrary key lookup. Split out from
    /// `from_env` so tests don't have to mutate process-global env vars.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = required(&lookup, "UPSTREAM_MCP_URL")?;
        Url::parse(&url).map_err(|e| ConfigError::Invalid {
            var: "UPSTREAM_MCP_URL",
            reason: e.to_string(),
        })?;

        let api_key = required(&lookup, "UPSTREAM_API_KEY")?;

        let mode = match lookup("FEDERATION_MODE").filter(|v| !v.trim().is_empty()) {
            Some(v) => v.parse::<FederationMode>()?,
            None => FederationMode::Import,
        };

        let name = lookup("UPSTREAM_NAME")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER_NAME.to_string());

        let timeout_secs = match lookup("UPSTREAM_TIMEOUT_SECS") {
            Some(v) => v.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "UPSTREAM_TIMEOUT_SECS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let port = match lookup("PORT") {
            Some(v) => v.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            upstream: UpstreamConfig {
                name,
                url,
                api_key,
                timeout: Duration::from_secs(timeout_secs.max(MIN_TIMEOUT_SECS)),
            },
            mode,
            port,
        })
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))
}
