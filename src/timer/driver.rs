//! Async driver for a reconciliation timer.
//!
//! # Responsibilities
//! - Tick the timer on a fixed local interval
//! - Apply transport events as they arrive, in arrival order
//! - Publish a fresh `TimerView` after every change
//! - Stop on shutdown or when every event sender is dropped
//!
//! # Design Decisions
//! - The driver task is the timer's only owner; no locks are needed
//! - The interval lives inside the task and is dropped with it

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{self, MissedTickBehavior};

use crate::timer::events::TimerEvent;
use crate::timer::state::{ReconciliationTimer, TimerView};

/// Runs a [`ReconciliationTimer`] against a stream of transport events.
pub struct TimerDriver {
    timer: ReconciliationTimer,
    events: mpsc::Receiver<TimerEvent>,
    view_tx: watch::Sender<TimerView>,
}

impl TimerDriver {
    /// Create a driver and the receiver renderers read views from.
    pub fn new(
        timer: ReconciliationTimer,
        events: mpsc::Receiver<TimerEvent>,
    ) -> (Self, watch::Receiver<TimerView>) {
        let (view_tx, view_rx) = watch::channel(timer.view());
        (
            Self {
                timer,
                events,
                view_tx,
            },
            view_rx,
        )
    }

    /// Run until shutdown or until the event channel closes.
    ///
    /// Returns the timer so callers can inspect the final state.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> ReconciliationTimer {
        let mut ticker = time::interval(self.timer.settings().tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.timer.tick();
                    self.publish();
                }
                event = self.events.recv() => {
                    match event {
                        Some(event) => {
                            tracing::trace!(kind = event.kind(), "Applying timer event");
                            self.timer.apply(event);
                            self.publish();
                        }
                        None => {
                            tracing::debug!("Timer event channel closed, stopping driver");
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Timer driver received shutdown signal");
                    break;
                }
            }
        }

        self.timer
    }

    fn publish(&self) {
        let view = self.timer.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}
