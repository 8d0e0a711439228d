//! Process-wide monitoring and logging service.
//!
//! # Responsibilities
//! - Leveled event logging to the console (tracing) and to daily JSON files
//! - Request, error, vault-transition and timer-reset counters
//! - Metric and health snapshots for the HTTP service
//! - Retention cleanup of old log files
//!
//! # Design Decisions
//! - Constructed once at startup and shared as `Arc<Monitor>`; there is no
//!   global instance
//! - Counters are atomics and only ever increase
//! - File failures are reported on the console and swallowed; a logging
//!   call never fails its caller

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::{HealthThresholds, MonitorConfig};
use crate::health::{HealthReport, HealthState, UptimeInfo};
use crate::observability::file_sink::DailyLogFile;
use crate::observability::metrics;
use crate::observability::record::{iso_millis, ErrorRecord, LogLevel, LogRecord};
use crate::observability::system;
use crate::vault::VaultStage;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Construction parameters for a [`Monitor`].
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub log_dir: PathBuf,
    pub retention: Duration,
    pub thresholds: HealthThresholds,
}

impl MonitorSettings {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            log_dir: PathBuf::from(&config.logging.log_dir),
            retention: Duration::from_secs(config.logging.retention_days * SECS_PER_DAY),
            thresholds: config.health,
        }
    }

    /// Default retention and thresholds, logging under `log_dir`.
    pub fn in_dir(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            retention: Duration::from_secs(7 * SECS_PER_DAY),
            thresholds: HealthThresholds::default(),
        }
    }
}

/// What the request logger knows about an incoming request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: String,
    pub path: String,
    pub user_agent: Option<String>,
    pub remote_addr: Option<String>,
    pub request_id: Option<String>,
}

/// Point-in-time copy of the monitor's counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub vault_transitions: u64,
    pub timer_resets: u64,
    /// `errors / requests` as a percentage with two decimals, `"0%"` without requests.
    pub error_rate: String,
    pub uptime_secs: u64,
    #[serde(serialize_with = "iso_millis")]
    pub start_time: DateTime<Utc>,
    pub last_error: Option<ErrorRecord>,
}

pub struct Monitor {
    file: DailyLogFile,
    retention: Duration,
    thresholds: ArcSwap<HealthThresholds>,
    start_time: DateTime<Utc>,
    started: Instant,
    pid: u32,
    requests: AtomicU64,
    errors: AtomicU64,
    vault_transitions: AtomicU64,
    timer_resets: AtomicU64,
    uptime_secs: AtomicU64,
    last_error: Mutex<Option<ErrorRecord>>,
}

impl Monitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self {
            file: DailyLogFile::new(settings.log_dir),
            retention: settings.retention,
            thresholds: ArcSwap::from_pointee(settings.thresholds),
            start_time: Utc::now(),
            started: Instant::now(),
            pid: std::process::id(),
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            vault_transitions: AtomicU64::new(0),
            timer_resets: AtomicU64::new(0),
            uptime_secs: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    pub fn log_dir(&self) -> &Path {
        self.file.dir()
    }

    /// Record a leveled event. `error` events count towards the health status.
    pub fn log(&self, level: LogLevel, message: &str, data: Option<Value>) {
        let record = self.record(level, message, data);
        self.emit(&record);

        if level == LogLevel::Error {
            self.errors.fetch_add(1, Ordering::Relaxed);
            metrics::record_error();
            self.set_last_error(ErrorRecord::from(&record));
        }
    }

    /// Record a completed HTTP request.
    pub fn log_request(&self, request: &RequestInfo, status: u16, response_time: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        metrics::record_request(&request.method, status, response_time);

        let millis = response_time.as_millis();
        let level = if status >= 400 {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        let message = format!("{} {} {} - {}ms", request.method, request.path, status, millis);
        self.log(
            level,
            &message,
            Some(json!({
                "method": request.method,
                "path": request.path,
                "status": status,
                "duration": format!("{millis}ms"),
                "userAgent": request.user_agent,
                "ip": request.remote_addr,
                "requestId": request.request_id,
            })),
        );
    }

    /// Record an application error with optional context.
    pub fn log_error(&self, error: &(dyn std::error::Error + 'static), context: Option<Value>) {
        let captured = ErrorRecord::from_error(error, context);
        self.errors.fetch_add(1, Ordering::Relaxed);
        metrics::record_error();

        let record = LogRecord {
            timestamp: captured.timestamp,
            level: LogLevel::Error,
            message: captured.message.clone(),
            data: Some(json!({
                "stack": captured.stack,
                "context": captured.context,
            })),
            pid: self.pid,
        };
        self.emit(&record);
        self.set_last_error(captured);
    }

    pub fn log_vault_transition(
        &self,
        vault_id: &str,
        from: VaultStage,
        to: VaultStage,
        reason: Option<&str>,
    ) {
        self.vault_transitions.fetch_add(1, Ordering::Relaxed);
        metrics::record_transition(to.as_str());

        let level = if from == to {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        self.log(
            level,
            &format!("Vault {vault_id} transitioned from {from} to {to}"),
            Some(json!({
                "vaultId": vault_id,
                "from": from,
                "to": to,
                "reason": reason,
            })),
        );
    }

    pub fn log_timer_reset(&self, vault_id: &str, signature: &str, amount: f64) {
        self.timer_resets.fetch_add(1, Ordering::Relaxed);
        metrics::record_timer_reset();

        self.log(
            LogLevel::Info,
            &format!("Timer reset for vault {vault_id}"),
            Some(json!({
                "vaultId": vault_id,
                "signature": signature,
                "amount": amount,
            })),
        );
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        let requests = self.requests.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        MetricsSnapshot {
            requests,
            errors,
            vault_transitions: self.vault_transitions.load(Ordering::Relaxed),
            timer_resets: self.timer_resets.load(Ordering::Relaxed),
            error_rate: error_rate(errors, requests),
            uptime_secs: self.refresh_uptime().as_secs(),
            start_time: self.start_time,
            last_error: self.last_error(),
        }
    }

    pub fn get_health_status(&self) -> HealthReport {
        let metrics = self.get_metrics();
        HealthReport {
            status: HealthState::classify(metrics.errors, &self.thresholds.load()),
            timestamp: Utc::now(),
            uptime: UptimeInfo::from(Duration::from_secs(metrics.uptime_secs)),
            metrics,
            memory: system::memory_usage(),
            cpu: system::cpu_usage(),
        }
    }

    /// Delete log files past the retention period. Returns how many were removed.
    pub fn cleanup_old_logs(&self) -> usize {
        match self.file.remove_older_than(self.retention) {
            Ok(removed) => {
                if !removed.is_empty() {
                    let files: Vec<String> =
                        removed.iter().map(|p| p.display().to_string()).collect();
                    self.log(
                        LogLevel::Info,
                        &format!("Removed {} old log files", removed.len()),
                        Some(json!({ "files": files })),
                    );
                }
                removed.len()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => {
                self.log(
                    LogLevel::Error,
                    "Failed to clean up old log files",
                    Some(json!({ "error": e.to_string(), "dir": self.log_dir().display().to_string() })),
                );
                0
            }
        }
    }

    /// Most recent lines of today's log file.
    pub fn recent_logs(&self, limit: usize) -> io::Result<Vec<Value>> {
        self.file.tail(Utc::now().date_naive(), limit)
    }

    /// Recompute the stored uptime. Never moves backwards.
    pub fn refresh_uptime(&self) -> Duration {
        let elapsed = self.started.elapsed().as_secs();
        let previous = self.uptime_secs.fetch_max(elapsed, Ordering::Relaxed);
        Duration::from_secs(previous.max(elapsed))
    }

    pub fn thresholds(&self) -> HealthThresholds {
        **self.thresholds.load()
    }

    pub fn set_thresholds(&self, thresholds: HealthThresholds) {
        self.thresholds.store(std::sync::Arc::new(thresholds));
    }

    pub fn last_error(&self) -> Option<ErrorRecord> {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_last_error(&self, record: ErrorRecord) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(record);
    }

    fn record(&self, level: LogLevel, message: &str, data: Option<Value>) -> LogRecord {
        LogRecord {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            data,
            pid: self.pid,
        }
    }

    fn emit(&self, record: &LogRecord) {
        write_console(record);
        if let Err(e) = self.file.append(record) {
            tracing::error!(
                error = %e,
                dir = %self.log_dir().display(),
                "Failed to write log file"
            );
        }
    }
}

fn write_console(record: &LogRecord) {
    let text = match &record.data {
        Some(data) => {
            let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
            format!("{}\n{}", record.message, pretty)
        }
        None => record.message.clone(),
    };

    match record.level {
        LogLevel::Error => tracing::error!("{text}"),
        LogLevel::Warn => tracing::warn!("{text}"),
        LogLevel::Info => tracing::info!("{text}"),
        LogLevel::Debug => tracing::debug!("{text}"),
    }
}

fn error_rate(errors: u64, requests: u64) -> String {
    if requests == 0 {
        return "0%".to_string();
    }
    format!("{:.2}%", errors as f64 / requests as f64 * 100.0)
}
