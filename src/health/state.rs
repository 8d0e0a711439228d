//! Process health classification.
//!
//! # States
//! - Healthy: errors <= degraded threshold
//! - Degraded: degraded threshold < errors <= unhealthy threshold
//! - Unhealthy: errors > unhealthy threshold
//!
//! # State Transitions
//! ```text
//! Healthy → Degraded → Unhealthy
//! ```
//! Driven only by the cumulative error count, which never resets while the
//! process runs, so transitions only move forward.

use serde::Serialize;
use std::fmt;

use crate::config::HealthThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthState {
    pub fn classify(errors: u64, thresholds: &HealthThresholds) -> Self {
        if errors > thresholds.unhealthy_errors {
            HealthState::Unhealthy
        } else if errors > thresholds.degraded_errors {
            HealthState::Degraded
        } else {
            HealthState::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
        }
    }

    /// Whether a load balancer should keep routing to this process.
    pub fn is_serving(&self) -> bool {
        !matches!(self, HealthState::Unhealthy)
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
