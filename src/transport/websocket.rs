//! WebSocket push transport.
//!
//! # Responsibilities
//! - Connect to the timer feed and decode every text frame
//! - Forward decoded events to the timer driver
//! - Report `Disconnected` whenever a session ends
//! - Reconnect with backoff until shutdown

use futures_util::StreamExt;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::resilience::Backoff;
use crate::timer::TimerEvent;
use crate::transport::TransportError;

/// Subscribes to a WebSocket feed of timer events.
pub struct WsTransport {
    url: String,
    events: mpsc::Sender<TimerEvent>,
    backoff: Backoff,
}

impl WsTransport {
    pub fn new(url: impl Into<String>, events: mpsc::Sender<TimerEvent>, backoff: Backoff) -> Self {
        Self {
            url: url.into(),
            events,
            backoff,
        }
    }

    /// Run sessions back to back until shutdown or until the driver is gone.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut failures: u32 = 0;

        loop {
            tokio::select! {
                result = self.session(&mut failures) => {
                    match result {
                        Ok(()) => tracing::info!(url = %self.url, "Timer feed closed by server"),
                        Err(TransportError::Closed) => {
                            tracing::debug!("Timer driver gone, stopping WebSocket transport");
                            return;
                        }
                        Err(e) => tracing::warn!(url = %self.url, error = %e, "Timer feed error"),
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("WebSocket transport received shutdown signal");
                    return;
                }
            }

            if self.events.send(TimerEvent::Disconnected).await.is_err() {
                return;
            }

            failures = failures.saturating_add(1);
            let delay = self.backoff.delay(failures);
            tracing::info!(attempt = failures, delay = ?delay, "Reconnecting to timer feed");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.recv() => return,
            }
        }
    }

    async fn session(&self, failures: &mut u32) -> Result<(), TransportError> {
        let (mut stream, _) = connect_async(self.url.as_str()).await?;
        *failures = 0;
        tracing::info!(url = %self.url, "Connected to timer feed");

        while let Some(message) = stream.next().await {
            match message? {
                Message::Text(text) => match TimerEvent::from_json(text.as_str()) {
                    Ok(event) => {
                        self.events
                            .send(event)
                            .await
                            .map_err(|_| TransportError::Closed)?;
                    }
                    Err(e) => tracing::warn!(error = %e, "Skipping malformed timer message"),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }

        Ok(())
    }
}
