//! Middleware adapters around the monitor.
//!
//! # Data Flow
//! ```text
//! request → request_log.rs (start clock, summarise request)
//!         → [timeout]
//!         → error_handler.rs → handler
//!         ← error_handler.rs (ApiError::Internal → monitor.log_error → 500 body)
//!         ← request_log.rs (monitor.log_request with final status + elapsed)
//! ```

pub mod error_handler;
pub mod request_log;

pub use error_handler::{error_response, handle_errors, GENERIC_ERROR_MESSAGE};
pub use request_log::log_requests;
