//! Vault countdown reconciliation and monitoring library.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod timer;
pub mod transport;
pub mod vault;

pub use config::schema::MonitorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::Monitor;
pub use timer::{ReconciliationTimer, TimerDriver};
