//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML, and every
//! section has defaults so a minimal file (or none at all) is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transaction::{DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE};

/// Root configuration for a chain client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Request/response transport.
    pub rest: RestConfig,

    /// Persistent transport.
    pub websocket: WebSocketConfig,

    /// Defaults applied by builders.
    pub transaction: TransactionConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// REST transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RestConfig {
    /// Base URL of the node's REST API (e.g., "http://127.0.0.1:20334").
    pub url: String,

    /// Deadline for one call, including full-response polling.
    pub timeout_secs: u64,

    /// Interval between event polls while waiting for a full response.
    pub poll_interval_ms: u64,

    /// Idle pooled connections kept per host.
    pub pool_idle_per_host: usize,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:20334".to_string(),
            timeout_secs: 10,
            poll_interval_ms: 1000,
            pool_idle_per_host: 8,
        }
    }
}

impl RestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// WebSocket transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Node WebSocket URL (e.g., "ws://127.0.0.1:20335").
    pub url: String,

    /// Handshake deadline in seconds.
    pub connect_timeout_secs: u64,

    /// Deadline for one correlated response in seconds.
    pub request_timeout_secs: u64,

    /// Heartbeat interval in seconds (0 disables it).
    pub heartbeat_secs: u64,

    /// Connection attempts made by `reconnect` (0 disables reconnecting).
    pub reconnect_attempts: u32,

    /// Base delay for reconnect backoff.
    pub reconnect_base_ms: u64,

    /// Cap on reconnect backoff.
    pub reconnect_max_ms: u64,

    /// Capacity of the notification broadcast channel.
    pub notification_buffer: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:20335".to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 10,
            heartbeat_secs: 30,
            reconnect_attempts: 3,
            reconnect_base_ms: 200,
            reconnect_max_ms: 5000,
            notification_buffer: 256,
        }
    }
}

impl WebSocketConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        (self.heartbeat_secs > 0).then(|| Duration::from_secs(self.heartbeat_secs))
    }
}

/// Gas defaults for built transactions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    pub gas_price: u64,
    pub gas_limit: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            gas_price: DEFAULT_GAS_PRICE,
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "ontology_client=info".to_string(),
            json_logs: false,
        }
    }
}
