//! Config file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by writing a temp file and renaming it are still noticed.
//! Only configs that load and validate are forwarded.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::MonitorConfig;

pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<MonitorConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiver validated reloads arrive on.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<MonitorConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            updates,
        };
        (watcher, rx)
    }

    /// Start watching. Notifications stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(OsStr::to_os_string);
        let path = self.path.clone();
        let updates = self.updates;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, file_name.as_deref()) => {
                    reload(&path, &updates);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Config watch error"),
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Watching config for changes");
        Ok(watcher)
    }
}

fn touches(event: &Event, file_name: Option<&OsStr>) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some() && p.file_name() == file_name)
}

/// Returns whether a valid config reached the receiver.
fn reload(path: &Path, updates: &mpsc::UnboundedSender<MonitorConfig>) -> bool {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "Config change detected");
            if updates.send(config).is_err() {
                tracing::debug!("Config receiver gone, dropping reload");
                return false;
            }
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Ignoring invalid config change, keeping current configuration");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_valid_rewrite_is_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault-monitor.toml");
        std::fs::write(&path, "[health]\ndegraded_errors = 50\nunhealthy_errors = 100\n").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();

        // An invalid edit is dropped, the following valid one comes through.
        std::fs::write(&path, "[health]\ndegraded_errors = 9\nunhealthy_errors = 3\n").unwrap();
        std::fs::write(&path, "[health]\ndegraded_errors = 5\nunhealthy_errors = 10\n").unwrap();

        let config = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let config = rx.recv().await.unwrap();
                if config.health.unhealthy_errors == 10 {
                    return config;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(config.health.degraded_errors, 5);
    }

    #[test]
    fn test_reload_without_receiver_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault-monitor.toml");
        std::fs::write(&path, "[health]\ndegraded_errors = 5\nunhealthy_errors = 10\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(reload(&path, &tx));
        assert_eq!(rx.try_recv().unwrap().health.unhealthy_errors, 10);

        drop(rx);
        assert!(!reload(&path, &tx));
    }

    #[test]
    fn test_reload_skips_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault-monitor.toml");
        std::fs::write(&path, "[timer]\npoll_interval_ms = 0\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(!reload(&path, &tx));
        assert!(rx.try_recv().is_err());
    }
}
