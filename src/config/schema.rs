//! Configuration schema definitions.
//!
//! All types derive Serde traits so the same schema loads from TOML or JSON.

use serde::{Deserialize, Serialize};

/// Root configuration for the application server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Per-request limits and the request ID header.
    pub request: RequestConfig,

    /// Context pool sizing.
    pub context: ContextConfig,

    /// Throughput limiter.
    pub throttle: ThrottleConfig,

    /// Concurrency limiter.
    pub slowdown: SlowdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9090").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request handling limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Maximum buffered request body in bytes.
    pub max_body_size: usize,

    /// Total time allowed for one request in seconds.
    pub timeout_secs: u64,

    /// Header carrying the request ID on both request and response.
    pub request_id_header: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
            timeout_secs: 30,
            request_id_header: "x-request-id".to_string(),
        }
    }
}

/// Context pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Maximum number of idle contexts kept for reuse.
    pub pool_capacity: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 1024,
        }
    }
}

/// Throughput limiter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Enable the throttle gate.
    pub enabled: bool,

    /// Admissions allowed per window.
    pub rate: usize,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rate: 100,
            window_ms: 1000,
        }
    }
}

/// Concurrency limiter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SlowdownConfig {
    /// Enable the slowdown gate.
    pub enabled: bool,

    /// Requests allowed to run the guarded chain simultaneously.
    pub max_concurrency: usize,

    /// How long a request may wait for a slot, in milliseconds.
    pub wait_ms: u64,
}

impl Default for SlowdownConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_concurrency: 64,
            wait_ms: 1000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9100".to_string(),
        }
    }
}
