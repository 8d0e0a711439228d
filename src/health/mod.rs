//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! Monitor counters (observability/monitor.rs)
//!     → state.rs (classify cumulative errors against thresholds)
//!     → report.rs (status + uptime + metrics + process resources)
//!     → GET /health (JSON, verbatim)
//! ```
//!
//! # Design Decisions
//! - Thresholds compare against the process-lifetime error count, not a
//!   rate or window; a busy process eventually degrades
//! - Thresholds are hot-reloadable; the count itself is never reset
//! - Unhealthy maps to HTTP 503 so load balancers can act on it

pub mod report;
pub mod state;

pub use report::{HealthReport, UptimeInfo};
pub use state::HealthState;
