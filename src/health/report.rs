//! Health snapshot served at `/health`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::health::state::HealthState;
use crate::observability::monitor::MetricsSnapshot;
use crate::observability::record::iso_millis;
use crate::observability::system::{CpuUsage, MemoryUsage};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthState,
    #[serde(serialize_with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub uptime: UptimeInfo,
    pub metrics: MetricsSnapshot,
    pub memory: Option<MemoryUsage>,
    pub cpu: Option<CpuUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UptimeInfo {
    pub seconds: u64,
    pub minutes: u64,
    pub hours: u64,
    pub human: String,
}

impl From<Duration> for UptimeInfo {
    fn from(uptime: Duration) -> Self {
        let seconds = uptime.as_secs();
        let minutes = seconds / 60;
        let hours = minutes / 60;
        Self {
            seconds,
            minutes,
            hours,
            human: format!("{}h {}m {}s", hours, minutes % 60, seconds % 60),
        }
    }
}
