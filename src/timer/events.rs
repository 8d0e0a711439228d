//! Timer events and their wire decoding.
//!
//! Transports hand the timer one of these events. Payloads are validated
//! here, at the boundary, so the timer never sees a half-formed message.
//!
//! Accepted JSON shapes:
//! ```text
//! {"type": "snapshot", "remainingSeconds": 3600}
//! {"type": "update",   "remainingSeconds": 3599}
//! {"type": "reset",    "address": "...", "amount": 1.5, "reference": "..."}
//! {"type": "disconnected"}
//! {"remainingSeconds": 42}            (no type: treated as an update)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Longest countdown accepted from a feed or from config (ten years).
pub const MAX_COUNTDOWN_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Authoritative remaining time reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub remaining_seconds: f64,
}

impl Snapshot {
    pub fn new(remaining_seconds: f64) -> Self {
        Self { remaining_seconds }
    }
}

/// The actor and action behind a countdown reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetInfo {
    /// Wallet address of the actor.
    pub address: String,
    /// Quantity involved (display only).
    pub amount: f64,
    /// Reference of the action, typically a transaction signature.
    pub reference: String,
}

/// An event delivered by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    /// First authoritative state after (re)connecting.
    Snapshot(Snapshot),
    /// Periodic re-synchronisation while connected.
    Update(Snapshot),
    /// The countdown was restarted to its full duration.
    Reset(ResetInfo),
    /// The transport lost its connection.
    Disconnected,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be a number between 0 and 315360000, got {value}")]
    InvalidNumber { field: &'static str, value: Value },

    #[error("unknown event type '{0}'")]
    UnknownType(String),
}

impl TimerEvent {
    /// Decode a transport message.
    pub fn from_json(text: &str) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        let object = value.as_object().ok_or(PayloadError::NotAnObject)?;
        let kind = object.get("type").and_then(Value::as_str).unwrap_or("update");

        match kind {
            "snapshot" => Ok(TimerEvent::Snapshot(snapshot_from(&value)?)),
            "update" => Ok(TimerEvent::Update(snapshot_from(&value)?)),
            "reset" => Ok(TimerEvent::Reset(serde_json::from_value(value)?)),
            "disconnected" => Ok(TimerEvent::Disconnected),
            other => Err(PayloadError::UnknownType(other.to_string())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TimerEvent::Snapshot(_) => "snapshot",
            TimerEvent::Update(_) => "update",
            TimerEvent::Reset(_) => "reset",
            TimerEvent::Disconnected => "disconnected",
        }
    }
}

fn snapshot_from(value: &Value) -> Result<Snapshot, PayloadError> {
    const FIELD: &str = "remainingSeconds";
    let raw = value.get(FIELD).ok_or(PayloadError::MissingField(FIELD))?;
    match raw.as_f64() {
        Some(secs) if (0.0..=MAX_COUNTDOWN_SECS as f64).contains(&secs) => {
            Ok(Snapshot::new(secs))
        }
        _ => Err(PayloadError::InvalidNumber {
            field: FIELD,
            value: raw.clone(),
        }),
    }
}
