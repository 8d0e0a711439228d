//! Resilience helpers for timer transports.
//!
//! # Data Flow
//! ```text
//! Transport session ends (error or close):
//!     → backoff.rs (delay grows per consecutive failure)
//!     → reconnect
//!     → attempt counter resets on a successful connect
//! ```
//!
//! # Design Decisions
//! - Jitter spreads reconnects of clients dropped at the same moment
//! - Delay is capped; transports never give up on their own

pub mod backoff;

pub use backoff::Backoff;
