//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the vault monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Log files, retention and maintenance schedule.
    pub logging: LoggingConfig,

    /// Error-count thresholds for the health status.
    pub health: HealthThresholds,

    /// Countdown timer settings used by the CLI watcher.
    pub timer: TimerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
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

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory holding the daily `app-YYYY-MM-DD.log` files.
    pub log_dir: String,

    /// Default tracing filter when `RUST_LOG` is unset.
    pub filter: String,

    /// Log files older than this many days are removed by cleanup.
    pub retention_days: u64,

    /// Interval between cleanup runs in seconds.
    pub cleanup_interval_secs: u64,

    /// Interval between uptime refreshes in seconds.
    pub uptime_refresh_secs: u64,

    /// Hide raw error messages from HTTP clients.
    pub production: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            filter: "vault_monitor=info,tower_http=info".to_string(),
            retention_days: 7,
            cleanup_interval_secs: 24 * 60 * 60,
            uptime_refresh_secs: 60,
            production: false,
        }
    }
}

/// Cumulative error counts at which the health status downgrades.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct HealthThresholds {
    /// More errors than this reports `degraded`.
    pub degraded_errors: u64,

    /// More errors than this reports `unhealthy`.
    pub unhealthy_errors: u64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            degraded_errors: 50,
            unhealthy_errors: 100,
        }
    }
}

/// Countdown timer configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimerConfig {
    /// Countdown length restored by a reset event, in seconds.
    pub full_duration_secs: u64,

    /// Number of reset events kept for display.
    pub history_capacity: usize,

    /// Local tick interval in milliseconds.
    pub tick_interval_ms: u64,

    /// Poll interval for the HTTP transport in milliseconds.
    pub poll_interval_ms: u64,

    /// WebSocket endpoint pushing timer events (empty = unused).
    pub ws_url: String,

    /// HTTP endpoint returning `{"remainingSeconds": n}` (empty = unused).
    pub poll_url: String,

    /// Base delay for reconnect backoff in milliseconds.
    pub reconnect_base_ms: u64,

    /// Maximum delay for reconnect backoff in milliseconds.
    pub reconnect_max_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            full_duration_secs: 3600,
            history_capacity: 5,
            tick_interval_ms: 1000,
            poll_interval_ms: 5000,
            ws_url: String::new(),
            poll_url: String::new(),
            reconnect_base_ms: 500,
            reconnect_max_ms: 30_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Install the Prometheus recorder and serve `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}
