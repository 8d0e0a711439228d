//! Countdown reconciliation state.
//!
//! # Invariants
//! - The displayed remaining time is always `max(0, deadline - now)`; it is
//!   never decremented by a fixed step, so missed ticks cannot drift it.
//! - The deadline only changes on server-sourced events (snapshot, update,
//!   reset). Ticks and disconnects never touch it.
//! - Every sync overwrites the deadline, so duplicated or reordered
//!   messages cannot accumulate.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::config::TimerConfig;
use crate::timer::clock::{Clock, SystemClock};
use crate::timer::events::{ResetInfo, Snapshot, TimerEvent, MAX_COUNTDOWN_SECS};

/// Tunables for a reconciliation timer.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSettings {
    /// Countdown length restored by a reset event.
    pub full_duration: Duration,
    /// Reset events retained for display.
    pub history_capacity: usize,
    /// Local tick interval.
    pub tick_interval: Duration,
    /// Poll interval for pull-based transports.
    pub poll_interval: Duration,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self::from(&TimerConfig::default())
    }
}

impl From<&TimerConfig> for TimerSettings {
    fn from(config: &TimerConfig) -> Self {
        Self {
            full_duration: Duration::from_secs(config.full_duration_secs),
            history_capacity: config.history_capacity.max(1),
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// A reset event as kept in the display history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRecord {
    #[serde(flatten)]
    pub info: ResetInfo,
    /// Local wall-clock time the reset was observed.
    pub observed_at_ms: i64,
}

/// Render-ready copy of the timer state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    pub remaining_ms: i64,
    pub deadline_ms: Option<i64>,
    pub connected: bool,
    pub last_event: Option<ResetInfo>,
    pub history: Vec<ResetRecord>,
}

impl TimerView {
    /// Whole seconds left, rounded down.
    pub fn remaining_secs(&self) -> u64 {
        (self.remaining_ms.max(0) / 1000) as u64
    }

    /// `HH:MM:SS`, hours are not wrapped at 24.
    pub fn format_hms(&self) -> String {
        let secs = self.remaining_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }

    pub fn expired(&self) -> bool {
        self.deadline_ms.is_some() && self.remaining_ms == 0
    }
}

/// Locally ticking countdown kept in line with a server deadline.
pub struct ReconciliationTimer {
    clock: Arc<dyn Clock>,
    settings: TimerSettings,
    deadline_ms: Option<i64>,
    display_remaining_ms: i64,
    connected: bool,
    last_event: Option<ResetInfo>,
    history: VecDeque<ResetRecord>,
}

impl ReconciliationTimer {
    pub fn new(mut settings: TimerSettings, clock: Arc<dyn Clock>) -> Self {
        settings.history_capacity = settings.history_capacity.max(1);
        settings.full_duration = settings
            .full_duration
            .min(Duration::from_secs(MAX_COUNTDOWN_SECS));
        settings.tick_interval = settings.tick_interval.max(Duration::from_millis(1));
        Self {
            clock,
            history: VecDeque::with_capacity(settings.history_capacity),
            settings,
            deadline_ms: None,
            display_remaining_ms: 0,
            connected: false,
            last_event: None,
        }
    }

    /// Timer on the system clock.
    pub fn with_system_clock(settings: TimerSettings) -> Self {
        Self::new(settings, Arc::new(SystemClock))
    }

    /// First snapshot after a (re)connect. Marks the timer connected.
    pub fn on_connect(&mut self, snapshot: &Snapshot) {
        self.connected = true;
        self.sync(snapshot.remaining_seconds, "snapshot");
    }

    /// Periodic re-synchronisation. Leaves the last event untouched.
    pub fn on_periodic_update(&mut self, remaining_seconds: f64) {
        self.sync(remaining_seconds, "update");
    }

    /// The countdown restarted on the server.
    pub fn on_reset_event(&mut self, info: ResetInfo) {
        let now = self.clock.now_ms();
        let full_ms = i64::try_from(self.settings.full_duration.as_millis()).unwrap_or(i64::MAX);
        self.deadline_ms = Some(now.saturating_add(full_ms));

        if self.history.len() == self.settings.history_capacity {
            self.history.pop_back();
        }
        self.history.push_front(ResetRecord {
            info: info.clone(),
            observed_at_ms: now,
        });

        tracing::debug!(
            address = %info.address,
            amount = info.amount,
            reference = %info.reference,
            "Countdown reset"
        );
        self.last_event = Some(info);
        self.refresh(now);
    }

    /// The transport lost its connection. The countdown keeps running.
    pub fn on_disconnect(&mut self) {
        if self.connected {
            tracing::info!("Timer transport disconnected, continuing on last known deadline");
        }
        self.connected = false;
    }

    /// Recompute the displayed remaining time. Returns milliseconds left.
    pub fn tick(&mut self) -> i64 {
        let now = self.clock.now_ms();
        self.refresh(now)
    }

    /// Dispatch a transport event.
    pub fn apply(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Snapshot(snapshot) => self.on_connect(&snapshot),
            TimerEvent::Update(snapshot) => self.on_periodic_update(snapshot.remaining_seconds),
            TimerEvent::Reset(info) => self.on_reset_event(info),
            TimerEvent::Disconnected => self.on_disconnect(),
        }
    }

    /// Decode and apply a raw message. Malformed input is logged and ignored.
    pub fn apply_json(&mut self, text: &str) -> bool {
        match TimerEvent::from_json(text) {
            Ok(event) => {
                self.apply(event);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed timer payload");
                false
            }
        }
    }

    pub fn deadline_ms(&self) -> Option<i64> {
        self.deadline_ms
    }

    pub fn display_remaining_ms(&self) -> i64 {
        self.display_remaining_ms
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn last_event(&self) -> Option<&ResetInfo> {
        self.last_event.as_ref()
    }

    /// Reset history, most recent first.
    pub fn history(&self) -> impl Iterator<Item = &ResetRecord> {
        self.history.iter()
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn view(&self) -> TimerView {
        TimerView {
            remaining_ms: self.display_remaining_ms,
            deadline_ms: self.deadline_ms,
            connected: self.connected,
            last_event: self.last_event.clone(),
            history: self.history.iter().cloned().collect(),
        }
    }

    fn sync(&mut self, remaining_seconds: f64, source: &'static str) {
        if !(0.0..=MAX_COUNTDOWN_SECS as f64).contains(&remaining_seconds) {
            tracing::warn!(
                source,
                remaining_seconds,
                "Ignoring invalid remaining time, keeping previous deadline"
            );
            return;
        }
        let now = self.clock.now_ms();
        self.deadline_ms = Some(now.saturating_add((remaining_seconds * 1000.0).round() as i64));
        self.refresh(now);
    }

    fn refresh(&mut self, now: i64) -> i64 {
        self.display_remaining_ms = match self.deadline_ms {
            Some(deadline) => deadline.saturating_sub(now).max(0),
            None => 0,
        };
        self.display_remaining_ms
    }
}
