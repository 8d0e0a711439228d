//! Service startup sequence.

use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::config::load_or_default;
use crate::config::watcher::ConfigWatcher;
use crate::http::HttpServer;
use crate::lifecycle::{shutdown_on_signal, Shutdown};
use crate::observability::{logging, maintenance, metrics, LogLevel, Monitor, MonitorSettings};

/// Start the monitoring service and block until it shuts down.
///
/// A missing config file means defaults; an unreadable or invalid one is
/// fatal. The file is watched for changes only when it exists at startup.
pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_or_default(config_path)?;
    logging::init(&config.logging.filter);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        bind_address = %config.listener.bind_address,
        log_dir = %config.logging.log_dir,
        production = config.logging.production,
        "vault-monitor starting"
    );

    let monitor = Arc::new(Monitor::new(MonitorSettings::from_config(&config)));
    let prometheus = if config.observability.metrics_enabled {
        metrics::install_recorder()
    } else {
        None
    };

    let shutdown = Shutdown::new();
    tokio::spawn(maintenance::run_log_cleanup(
        monitor.clone(),
        Duration::from_secs(config.logging.cleanup_interval_secs),
        shutdown.subscribe(),
    ));
    tokio::spawn(maintenance::run_uptime_refresh(
        monitor.clone(),
        Duration::from_secs(config.logging.uptime_refresh_secs),
        shutdown.subscribe(),
    ));

    let (watcher, config_updates) = ConfigWatcher::new(config_path);
    // Dropping the watcher stops notifications, so it lives until return.
    let _watcher = if config_path.exists() {
        match watcher.run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "Config hot reload unavailable");
                None
            }
        }
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    monitor.log(
        LogLevel::Info,
        "Service started",
        Some(json!({ "address": local_addr.to_string(), "pid": std::process::id() })),
    );

    let server = HttpServer::new(config, monitor.clone(), prometheus);
    let served = server
        .run(listener, config_updates, shutdown.subscribe())
        .await;

    shutdown.trigger();
    match &served {
        Ok(()) => monitor.log(LogLevel::Info, "Service stopped", None),
        Err(e) => monitor.log_error(e, Some(json!({ "phase": "serve" }))),
    }
    served?;
    Ok(())
}
