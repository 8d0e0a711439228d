//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! startup.rs:
//!     config → console logging → Monitor → Prometheus recorder
//!     → cleanup + uptime tasks → config watcher → bind → serve
//!
//! signals.rs:
//!     SIGINT / SIGTERM → Shutdown::trigger
//!
//! shutdown.rs:
//!     one broadcast; the HTTP server drains, background loops and timer
//!     tasks leave their select! on the same signal
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_on_signal;
pub use startup::run;
