//! Execution channel acquisition.
//!
//! When a method starts, the controller opens an execution channel the
//! runtime can push commands through. The channel appears either as a pushed
//! event or on a poll of the runtime surface; both paths feed the same
//! acquisition loop. Channels are owned by the controller, so a freshly seen
//! handle is only adopted after it survives a stabilization window with its
//! liveness and the method's run state intact.

use crate::control::{ExecutionChannel, RuntimeEvent, RuntimeHandle};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, warn};

/// Timing knobs for the acquisition loop.
#[derive(Debug, Clone, Copy)]
pub struct ChannelTiming {
    /// Cadence of `current_execution_channel` polls.
    pub poll_interval: Duration,
    /// How long one iteration blocks on the event queue before polling.
    pub event_window: Duration,
    /// Delay between first sighting of a channel and adopting it.
    pub stabilize_delay: Duration,
    /// Retained channel handles for diagnostics.
    pub history_limit: usize,
}

impl Default for ChannelTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            event_window: Duration::from_secs(2),
            stabilize_delay: Duration::from_secs(2),
            history_limit: 8,
        }
    }
}

/// Tracks the current execution channel and a bounded history.
///
/// The acquirer is the only writer of the current-channel slot; the session
/// controller and dispatcher read it.
pub struct ChannelAcquirer {
    current: Mutex<Option<Arc<dyn ExecutionChannel>>>,
    history: Mutex<VecDeque<Arc<dyn ExecutionChannel>>>,
    events: tokio::sync::Mutex<mpsc::Receiver<RuntimeEvent>>,
    channel_errors: mpsc::Sender<String>,
    timing: ChannelTiming,
}

impl ChannelAcquirer {
    /// Creates an acquirer reading pushed events from `events`.
    pub fn new(events: mpsc::Receiver<RuntimeEvent>, timing: ChannelTiming) -> Self {
        // Channel error callbacks are best-effort; a full queue just drops.
        let (channel_errors, mut errors_rx) = mpsc::channel::<String>(8);
        tokio::spawn(async move {
            while let Some(message) = errors_rx.recv().await {
                warn!(%message, "channel reported error");
            }
        });
        Self {
            current: Mutex::new(None),
            history: Mutex::new(VecDeque::new()),
            events: tokio::sync::Mutex::new(events),
            channel_errors,
            timing,
        }
    }

    /// The adopted channel, if any.
    pub fn current(&self) -> Option<Arc<dyn ExecutionChannel>> {
        self.current.lock().clone()
    }

    /// Drops the adopted channel (after a failed liveness probe).
    pub fn clear_current(&self) {
        *self.current.lock() = None;
    }

    /// Channels seen this session, oldest first.
    pub fn history(&self) -> Vec<Arc<dyn ExecutionChannel>> {
        self.history.lock().iter().cloned().collect()
    }

    /// Adopts a channel as current and records it in the history.
    pub fn adopt(&self, channel: Arc<dyn ExecutionChannel>) {
        if let Err(e) = channel.register_error_callback(self.channel_errors.clone()) {
            debug!(channel = channel.id(), error = %e, "error callback registration failed");
        }
        let mut history = self.history.lock();
        if !history.iter().any(|c| c.id() == channel.id()) {
            if history.len() == self.timing.history_limit {
                history.pop_front();
            }
            history.push_back(channel.clone());
        }
        drop(history);
        debug!(channel = channel.id(), "execution channel adopted");
        *self.current.lock() = Some(channel);
    }

    /// Waits for a live execution channel, up to `timeout`.
    ///
    /// Returns `false` when the budget runs out or the method stops running;
    /// neither is an error at this layer. A channel that dies during the
    /// stabilization window is discarded and the wait continues.
    pub async fn wait_for_channel(
        &self,
        runtime: &Arc<dyn RuntimeHandle>,
        budget: Duration,
    ) -> bool {
        if let Some(channel) = self.current() {
            if channel.is_alive().await {
                return true;
            }
            debug!(channel = channel.id(), "current channel is dead, re-acquiring");
            self.clear_current();
        }

        let deadline = Instant::now() + budget;
        loop {
            let Some(candidate) = self.next_candidate(runtime, deadline).await else {
                debug!("no execution channel within budget");
                return false;
            };
            if !candidate.is_alive().await {
                debug!(channel = candidate.id(), "candidate channel not alive");
                continue;
            }
            if !runtime.is_method_running().await {
                debug!("method is not running, abandoning channel wait");
                return false;
            }

            // The controller sometimes re-creates the channel object right
            // after the method starts. Sit out the stabilization window and
            // re-verify before trusting the handle.
            sleep(self.timing.stabilize_delay).await;
            if !candidate.is_alive().await {
                debug!(channel = candidate.id(), "channel died during stabilization");
                continue;
            }
            if !runtime.is_method_running().await {
                debug!("method stopped during stabilization");
                return false;
            }

            self.adopt(candidate);
            return true;
        }
    }

    /// Yields the next channel sighting from either the event queue or a
    /// runtime poll, or `None` at the deadline.
    async fn next_candidate(
        &self,
        runtime: &Arc<dyn RuntimeHandle>,
        deadline: Instant,
    ) -> Option<Arc<dyn ExecutionChannel>> {
        let mut events = self.events.lock().await;
        loop {
            while let Ok(event) = events.try_recv() {
                if let RuntimeEvent::ChannelOpened(channel) = event {
                    debug!(channel = channel.id(), "channel announced via event");
                    return Some(channel);
                }
            }
            if let Some(channel) = runtime.current_execution_channel().await {
                return Some(channel);
            }

            let now = Instant::now();
            if now + self.timing.poll_interval > deadline {
                return None;
            }
            let window = self.timing.event_window.min(deadline - now);
            match timeout(window.max(self.timing.poll_interval), events.recv()).await {
                Ok(Some(RuntimeEvent::ChannelOpened(channel))) => {
                    debug!(channel = channel.id(), "channel announced via event");
                    return Some(channel);
                }
                Ok(Some(_)) => continue,
                // Queue closed: the pump is gone, fall back to pure polling.
                Ok(None) => sleep(self.timing.poll_interval).await,
                Err(_) => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SimulatedChannel, SimulatedController};

    fn fast_timing() -> ChannelTiming {
        ChannelTiming {
            poll_interval: Duration::from_millis(10),
            event_window: Duration::from_millis(20),
            stabilize_delay: Duration::from_millis(20),
            history_limit: 8,
        }
    }

    fn acquirer() -> (ChannelAcquirer, mpsc::Sender<RuntimeEvent>) {
        let (tx, rx) = mpsc::channel(16);
        (ChannelAcquirer::new(rx, fast_timing()), tx)
    }

    #[tokio::test]
    async fn adopt_tracks_history_and_current() {
        let (acquirer, _tx) = acquirer();
        let a = SimulatedChannel::new(1);
        let b = SimulatedChannel::new(2);
        acquirer.adopt(a.clone());
        acquirer.adopt(b.clone());
        assert_eq!(acquirer.current().unwrap().id(), 2);
        let ids: Vec<u64> = acquirer.history().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let (acquirer, _tx) = acquirer();
        for id in 0..12 {
            acquirer.adopt(SimulatedChannel::new(id));
        }
        let history = acquirer.history();
        assert_eq!(history.len(), 8);
        assert_eq!(history.first().unwrap().id(), 4);
    }

    #[tokio::test]
    async fn re_adopting_same_channel_does_not_duplicate_history() {
        let (acquirer, _tx) = acquirer();
        let ch = SimulatedChannel::new(7);
        acquirer.adopt(ch.clone());
        acquirer.adopt(ch);
        assert_eq!(acquirer.history().len(), 1);
    }

    #[tokio::test]
    async fn live_current_channel_short_circuits() {
        let controller = SimulatedController::new();
        let runtime = controller.runtime_handle();
        let (acquirer, _tx) = acquirer();
        acquirer.adopt(SimulatedChannel::new(3));
        assert!(
            acquirer
                .wait_for_channel(&runtime, Duration::from_millis(50))
                .await
        );
    }

    #[tokio::test]
    async fn wait_times_out_to_false() {
        let controller = SimulatedController::new();
        controller.runtime().set_method_running(true);
        let runtime = controller.runtime_handle();
        let (acquirer, _tx) = acquirer();
        assert!(
            !acquirer
                .wait_for_channel(&runtime, Duration::from_millis(60))
                .await
        );
        assert!(acquirer.current().is_none());
    }

    #[tokio::test]
    async fn event_path_delivers_channel() {
        let controller = SimulatedController::new();
        controller.runtime().set_method_running(true);
        let runtime = controller.runtime_handle();
        let (acquirer, tx) = acquirer();
        let ch = SimulatedChannel::new(11);
        tx.send(RuntimeEvent::ChannelOpened(ch)).await.unwrap();
        assert!(
            acquirer
                .wait_for_channel(&runtime, Duration::from_millis(200))
                .await
        );
        assert_eq!(acquirer.current().unwrap().id(), 11);
    }

    #[tokio::test]
    async fn transient_channel_keeps_the_wait_going() {
        let controller = SimulatedController::new();
        controller.runtime().set_method_running(true);
        let runtime = controller.runtime_handle();
        let (acquirer, tx) = acquirer();

        // Alive at first sight, dead on the stabilization re-check.
        let flaky = SimulatedChannel::new(21);
        flaky.script_liveness(vec![true, false]);
        flaky.set_alive(false);
        tx.send(RuntimeEvent::ChannelOpened(flaky)).await.unwrap();

        let stable = SimulatedChannel::new(22);
        let tx2 = tx.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(40)).await;
            let _ = tx2.send(RuntimeEvent::ChannelOpened(stable)).await;
        });

        assert!(
            acquirer
                .wait_for_channel(&runtime, Duration::from_millis(500))
                .await
        );
        assert_eq!(acquirer.current().unwrap().id(), 22);
    }

    #[tokio::test]
    async fn method_not_running_abandons_the_wait() {
        let controller = SimulatedController::new();
        let runtime = controller.runtime_handle();
        let (acquirer, tx) = acquirer();
        tx.send(RuntimeEvent::ChannelOpened(SimulatedChannel::new(31)))
            .await
            .unwrap();
        assert!(
            !acquirer
                .wait_for_channel(&runtime, Duration::from_millis(200))
                .await
        );
    }
}
