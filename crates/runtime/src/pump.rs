//! Background event pump.
//!
//! The controller backend only delivers events while something services its
//! message loop. A single spawned task calls [`RuntimeHandle::pump_events`]
//! on a fixed cadence for the life of the session, keeping the event queue's
//! single-writer invariant: the pump is the only task that touches the
//! backend's delivery path.

use crate::control::RuntimeHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

/// Handle to the spawned pump task.
pub struct EventPump {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl EventPump {
    /// Spawns the pump task ticking every `interval`.
    pub fn spawn(runtime: Arc<dyn RuntimeHandle>, interval: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);
        let handle = tokio::spawn(async move {
            debug!(interval_ms = interval.as_millis() as u64, "event pump started");
            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = sleep(interval) => runtime.pump_events().await,
                }
            }
            debug!("event pump stopped");
        });
        Self { shutdown, handle }
    }

    /// Signals the task to stop and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
