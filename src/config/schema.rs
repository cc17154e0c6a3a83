//! Typed layout of the TOML config file. Every section falls back to its
//! `Default` when omitted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the rewriting proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Valid bearer tokens. Empty entries are discarded on load.
    pub api_keys: Vec<String>,

    /// Where the server listens.
    pub listener: ListenerConfig,

    pub timeouts: TimeoutConfig,

    /// URL rewriting settings.
    pub rewrite: RewriteConfig,

    /// Passthrough (`/proxy`) endpoint settings.
    pub passthrough: PassthroughConfig,

    /// Outbound client settings.
    pub upstream: UpstreamConfig,

    /// Request and response pipeline settings.
    pub pipeline: PipelineConfig,

    /// Log format and level, Prometheus exporter.
    pub observability: ObservabilityConfig,
}

/// Inbound socket.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// `host:port` to bind.
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Inbound and outbound time limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (inbound request and outbound fetch) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 60,
        }
    }
}

/// URL rewriting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Path of the rewriting endpoint that proxy URLs point back to.
    pub proxy_base: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            proxy_base: "/web".to_string(),
        }
    }
}

/// Passthrough endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PassthroughConfig {
    /// Require an API key on `/proxy`. The `/web` pipeline always does.
    pub require_auth: bool,

    /// User-Agent sent upstream when the client sends none.
    pub user_agent: String,
}

impl Default for PassthroughConfig {
    fn default() -> Self {
        Self {
            require_auth: false,
            user_agent: concat!("rewrite-proxy/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Maximum redirects followed per fetch.
    pub max_redirects: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { max_redirects: 10 }
    }
}

/// Per-pipeline processor configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub request: PipelineSettings,
    pub response: PipelineSettings,
}

/// Settings for one pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PipelineSettings {
    /// Allow-list of processor names. Empty means every processor runs.
    pub enabled_processors: Vec<String>,

    /// Per-processor overrides keyed by processor name.
    pub processors: HashMap<String, ProcessorSettings>,
}

/// Override settings for a single processor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessorSettings {
    /// Replaces the processor's intrinsic order when set.
    pub order: Option<i32>,

    /// Drops the processor from its pipeline when false.
    pub enabled: bool,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            order: None,
            enabled: true,
        }
    }
}

/// Logging and metrics.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Start the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter listen address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
