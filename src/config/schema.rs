//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Sidecar pool shape and lifecycle timings.
    pub pool: PoolConfig,

    /// Timing header reconciliation.
    pub timing: TimingConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Sidecar pool configuration.
///
/// Slot `n` is identified as `instance-n` and listens on `host:base_port + n`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of slots in the pool (N).
    pub capacity: usize,

    /// Candidate window considered per selection (k <= N).
    pub window: usize,

    /// Host every sidecar listens on.
    pub host: String,

    /// Port of slot 0; slot n uses `base_port + n`.
    pub base_port: u16,

    /// Path probed for readiness while a sidecar is starting.
    pub ready_path: String,

    /// Deadline for a sidecar to become ready.
    pub startup_timeout_secs: u64,

    /// Delay between readiness probes.
    pub probe_interval_ms: u64,

    /// A running sidecar with no routed request for this long is stopped.
    pub idle_timeout_secs: u64,

    /// Reaper tick interval.
    pub reap_interval_secs: u64,

    /// How long an errored sidecar stays excluded before it is reconciled.
    pub error_cooldown_secs: u64,

    /// Optional process launched per slot on activation.
    pub launch: Option<LaunchConfig>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            window: 10,
            host: "127.0.0.1".to_string(),
            base_port: 8888,
            ready_path: "/healthz".to_string(),
            startup_timeout_secs: 60,
            probe_interval_ms: 250,
            idle_timeout_secs: 15 * 60,
            reap_interval_secs: 30,
            error_cooldown_secs: 30,
            launch: None,
        }
    }
}

/// Command used to start a sidecar process.
///
/// `{id}`, `{slot}` and `{port}` in `args` and `env` values are substituted per slot.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LaunchConfig {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// Timing header reconciliation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Emit edge measurements and merge sidecar timings.
    pub enabled: bool,

    /// Response headers harvested from the sidecar and stripped before the
    /// response leaves the edge.
    pub inner_headers: Vec<String>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            inner_headers: vec![
                "server-timing".to_string(),
                "x-sidecar-server-timing".to_string(),
            ],
        }
    }
}

/// Request limit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 100 * 1024 * 1024, // 100 MiB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
