//! Scheduled monitor upkeep.
//!
//! Both loops tick immediately on start, then on their interval, and exit
//! on the shutdown broadcast.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::observability::monitor::Monitor;

/// Remove expired log files now and then every `every`.
pub async fn run_log_cleanup(
    monitor: Arc<Monitor>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(interval = ?every, dir = %monitor.log_dir().display(), "Log cleanup scheduled");
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let monitor = monitor.clone();
                // Directory scans and unlinks are blocking filesystem work.
                match tokio::task::spawn_blocking(move || monitor.cleanup_old_logs()).await {
                    Ok(removed) => tracing::debug!(removed, "Log cleanup finished"),
                    Err(e) => tracing::error!(error = %e, "Log cleanup task failed"),
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Log cleanup received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

/// Refresh the monitor's stored uptime every `every`.
pub async fn run_uptime_refresh(
    monitor: Arc<Monitor>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                monitor.refresh_uptime();
            }
            _ = shutdown.recv() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::observability::monitor::MonitorSettings;
    use std::fs::File;
    use std::time::SystemTime;

    #[tokio::test]
    async fn test_cleanup_runs_on_start_and_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("app-2020-01-01.log");
        File::create(&stale)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(30 * 24 * 60 * 60))
            .unwrap();

        let monitor = Arc::new(Monitor::new(MonitorSettings::in_dir(dir.path())));
        let shutdown = Shutdown::new();
        let task = tokio::spawn(run_log_cleanup(
            monitor.clone(),
            Duration::from_secs(3600),
            shutdown.subscribe(),
        ));

        for _ in 0..50 {
            if !stale.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!stale.exists());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }
}
