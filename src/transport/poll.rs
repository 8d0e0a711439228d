//! HTTP polling transport.
//!
//! Fetches `{"remainingSeconds": n}` on a fixed interval. The first
//! successful poll after a failure is reported as a snapshot (a reconnect),
//! later ones as updates. A failed poll reports `Disconnected` once. A
//! reachable endpoint serving a malformed body is logged and skipped; it
//! neither syncs nor disconnects the timer.

use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};

use crate::timer::{Snapshot, TimerEvent};
use crate::transport::TransportError;

/// Polls an HTTP endpoint for the remaining time.
pub struct PollTransport {
    client: reqwest::Client,
    url: String,
    interval: Duration,
    events: mpsc::Sender<TimerEvent>,
}

impl PollTransport {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        interval: Duration,
        events: mpsc::Sender<TimerEvent>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            interval: interval.max(Duration::from_millis(1)),
            events,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut connected = false;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => {
                    tracing::debug!("Poll transport received shutdown signal");
                    return;
                }
            }

            let event = match self.fetch().await {
                Err(e @ (TransportError::Payload(_) | TransportError::UnexpectedEvent(_))) => {
                    tracing::warn!(url = %self.url, error = %e, "Skipping malformed timer payload");
                    None
                }
                Ok(snapshot) if connected => Some(TimerEvent::Update(snapshot)),
                Ok(snapshot) => {
                    tracing::info!(url = %self.url, "Timer endpoint reachable");
                    connected = true;
                    Some(TimerEvent::Snapshot(snapshot))
                }
                Err(e) if connected => {
                    tracing::warn!(url = %self.url, error = %e, "Timer poll failed");
                    connected = false;
                    Some(TimerEvent::Disconnected)
                }
                Err(e) => {
                    tracing::debug!(url = %self.url, error = %e, "Timer endpoint still unreachable");
                    None
                }
            };

            if let Some(event) = event {
                if self.events.send(event).await.is_err() {
                    tracing::debug!("Timer driver gone, stopping poll transport");
                    return;
                }
            }
        }
    }

    async fn fetch(&self) -> Result<Snapshot, TransportError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        match TimerEvent::from_json(&body)? {
            TimerEvent::Snapshot(snapshot) | TimerEvent::Update(snapshot) => Ok(snapshot),
            other => Err(TransportError::UnexpectedEvent(other.kind())),
        }
    }
}
