//! Service configuration.
//!
//! # Data Flow
//! ```text
//! vault-monitor.toml (optional; defaults when absent)
//!     → loader.rs (read + toml)
//!     → validation.rs (every rule checked, all failures reported)
//!     → MonitorConfig
//!     → startup: monitor settings, listener, background intervals
//!
//! File edited while running:
//!     watcher.rs (notify) → loader.rs → validation.rs
//!     → HttpServer swaps its ArcSwap<MonitorConfig>
//!     → production flag and health thresholds apply on the next request
//! ```
//!
//! Every section is `#[serde(default)]`, so an empty file is a valid config.
//! Bind address, log directory and intervals are read once at startup.

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    HealthThresholds, ListenerConfig, LoggingConfig, MonitorConfig, ObservabilityConfig,
    TimeoutConfig, TimerConfig,
};
