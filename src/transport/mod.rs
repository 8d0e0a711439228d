//! Timer transports.
//!
//! # Data Flow
//! ```text
//! Backend feed ──ws──→ websocket.rs ─┐
//!                                    ├─→ mpsc<TimerEvent> → timer::TimerDriver
//! Backend API ──http─→ poll.rs ──────┘
//! ```
//!
//! # Design Decisions
//! - Both transports emit the same `TimerEvent`s; the timer never knows which
//! - Malformed messages are logged and skipped, never forwarded
//! - Connection loss is reported as an event, reconnecting stays here

pub mod poll;
pub mod websocket;

use thiserror::Error;

use crate::timer::PayloadError;

pub use poll::PollTransport;
pub use websocket::WsTransport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("endpoint returned a '{0}' event where remaining time was expected")]
    UnexpectedEvent(&'static str),

    #[error("timer driver is no longer receiving events")]
    Closed,
}
