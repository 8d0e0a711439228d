//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Call sites (HTTP middleware, handlers, background tasks)
//!     → monitor.rs (counters, last error, log entry points)
//!         → logging.rs subscriber (coloured console line)
//!         → file_sink.rs (app-YYYY-MM-DD.log, JSON lines)
//!         → metrics.rs (Prometheus mirror of the counters)
//!
//! Scheduled (maintenance.rs):
//!     daily → monitor.cleanup_old_logs()
//!     every minute → monitor.refresh_uptime()
//! ```
//!
//! # Design Decisions
//! - One explicitly constructed monitor, injected as `Arc<Monitor>`
//! - Console formatting belongs to the tracing subscriber
//! - Disk failures never propagate to logging call sites

pub mod file_sink;
pub mod logging;
pub mod maintenance;
pub mod metrics;
pub mod monitor;
pub mod record;
pub mod system;

pub use monitor::{MetricsSnapshot, Monitor, MonitorSettings, RequestInfo};
pub use record::{ErrorRecord, LogLevel, LogRecord};
