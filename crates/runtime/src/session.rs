//! Session controller - the run lifecycle state machine.
//!
//! One session owns one controller process. The controller GUI keeps its own
//! state; this layer tracks a [`SessionState`] mirror and only permits
//! dispatch while a method is running with a live channel. All transitions
//! happen here; the channel acquirer and dispatcher never write state.

use crate::channel::{ChannelAcquirer, ChannelTiming};
use crate::control::{Capabilities, ConnectMode, InstrumentProcess, RuntimeHandle};
use crate::dispatch::CommandDispatcher;
use crate::error::{Error, Result};
use crate::poll::{PollConfig, wait_for, wait_until};
use crate::pump::EventPump;
use crate::recovery::{RecoveryHandler, RecoveryRegistry};
use crate::status::{FluentStatus, SessionState};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Timing for every bounded wait the session performs.
///
/// Defaults mirror the controller's observed behavior; tests shrink them to
/// milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct SessionTiming {
    /// Poll cadence while waiting for the controller process.
    pub process_poll: Duration,
    /// Budget for the controller process to come up.
    pub process_timeout: Duration,
    /// Poll cadence while waiting for the runtime handle.
    pub runtime_poll: Duration,
    /// Budget for the runtime handle to appear.
    pub runtime_timeout: Duration,
    /// Poll cadence while waiting for edit mode.
    pub edit_mode_poll: Duration,
    /// Budget for the controller to reach edit mode.
    pub edit_mode_timeout: Duration,
    /// Poll cadence of the run preparation settle loop.
    pub preparation_poll: Duration,
    /// Budget of the run preparation settle loop.
    pub preparation_timeout: Duration,
    /// Delay before the post-RunMethod liveness check.
    pub post_run_settle: Duration,
    /// Cadence of the background event pump.
    pub pump_interval: Duration,
    /// Channel acquisition knobs.
    pub channel: ChannelTiming,
    /// Spacing between recovery attempts.
    pub recovery_spacing: Duration,
    /// Overall recovery budget.
    pub recovery_timeout: Duration,
    /// Base settle unit after dispatched commands in visual simulation.
    pub dispatch_settle: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            process_poll: Duration::from_secs(1),
            process_timeout: Duration::from_secs(120),
            runtime_poll: Duration::from_secs(1),
            runtime_timeout: Duration::from_secs(120),
            edit_mode_poll: Duration::from_secs(1),
            edit_mode_timeout: Duration::from_secs(30),
            preparation_poll: Duration::from_millis(500),
            preparation_timeout: Duration::from_secs(5),
            post_run_settle: Duration::from_millis(300),
            pump_interval: Duration::from_millis(500),
            channel: ChannelTiming::default(),
            recovery_spacing: Duration::from_secs(5),
            recovery_timeout: Duration::from_secs(300),
            dispatch_settle: Duration::from_millis(500),
        }
    }
}

impl SessionTiming {
    /// Millisecond-scale timing for tests against the simulated controller.
    pub fn fast() -> Self {
        Self {
            process_poll: Duration::from_millis(5),
            process_timeout: Duration::from_millis(250),
            runtime_poll: Duration::from_millis(5),
            runtime_timeout: Duration::from_millis(250),
            edit_mode_poll: Duration::from_millis(5),
            edit_mode_timeout: Duration::from_millis(100),
            preparation_poll: Duration::from_millis(5),
            preparation_timeout: Duration::from_millis(50),
            post_run_settle: Duration::from_millis(5),
            pump_interval: Duration::from_millis(5),
            channel: ChannelTiming {
                poll_interval: Duration::from_millis(5),
                event_window: Duration::from_millis(10),
                stabilize_delay: Duration::from_millis(10),
                history_limit: 8,
            },
            recovery_spacing: Duration::from_millis(5),
            recovery_timeout: Duration::from_millis(100),
            dispatch_settle: Duration::ZERO,
        }
    }
}

/// Owns the controller connection and drives the run lifecycle.
pub struct SessionController {
    process: Arc<dyn InstrumentProcess>,
    runtime: Mutex<Option<Arc<dyn RuntimeHandle>>>,
    channels: Mutex<Option<Arc<ChannelAcquirer>>>,
    pump: Mutex<Option<EventPump>>,
    state: Mutex<SessionState>,
    capabilities: Capabilities,
    recovery_registry: RecoveryRegistry,
    simulation: Mutex<bool>,
    timing: SessionTiming,
}

impl SessionController {
    /// Creates a disconnected session over the given controller process.
    pub fn new(
        process: Arc<dyn InstrumentProcess>,
        capabilities: Capabilities,
        timing: SessionTiming,
    ) -> Self {
        Self {
            process,
            runtime: Mutex::new(None),
            channels: Mutex::new(None),
            pump: Mutex::new(None),
            state: Mutex::new(SessionState::Disconnected),
            capabilities,
            recovery_registry: RecoveryRegistry::new(),
            simulation: Mutex::new(false),
            timing,
        }
    }

    /// Replaces the recovery registry (known per-version recovery operations).
    pub fn with_recovery_registry(mut self, registry: RecoveryRegistry) -> Self {
        self.recovery_registry = registry;
        self
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    fn set_state(&self, state: SessionState) {
        let mut current = self.state.lock();
        if *current != state {
            debug!(from = %*current, to = %state, "session state changed");
            *current = state;
        }
    }

    /// The runtime handle, or an error in degraded/disconnected sessions.
    pub fn runtime(&self) -> Result<Arc<dyn RuntimeHandle>> {
        self.runtime.lock().clone().ok_or(Error::RuntimeUnavailable)
    }

    /// The channel acquirer, available once connected with a runtime.
    pub fn channels(&self) -> Result<Arc<ChannelAcquirer>> {
        self.channels.lock().clone().ok_or(Error::RuntimeUnavailable)
    }

    /// Builds a dispatcher bound to this session's runtime and channel slot.
    pub fn dispatcher(&self) -> Result<CommandDispatcher> {
        let settle = if *self.simulation.lock() && self.capabilities.visual_simulation {
            self.timing.dispatch_settle
        } else {
            Duration::ZERO
        };
        Ok(CommandDispatcher::new(
            self.runtime()?,
            self.channels()?,
            settle,
        ))
    }

    /// Starts (or attaches to) the controller and waits for it to settle.
    ///
    /// A controller that comes up without a runtime handle leaves the
    /// session in degraded mode: the connection is `Ready`, and every call
    /// that needs the runtime fails with [`Error::RuntimeUnavailable`].
    pub async fn connect(&self, mode: ConnectMode) -> Result<()> {
        if self.state() != SessionState::Disconnected {
            return Err(Error::Connection("session is already connected".into()));
        }
        let simulation = mode == ConnectMode::Simulation;
        *self.simulation.lock() = simulation;
        self.set_state(SessionState::Connecting);
        info!(?mode, "connecting to FluentControl");

        if let Err(e) = self.process.launch(&mode).await {
            self.set_state(SessionState::Disconnected);
            return Err(Error::Connection(e.to_string()));
        }

        let process = self.process.clone();
        let up = wait_until(
            PollConfig::new(self.timing.process_poll, self.timing.process_timeout),
            || {
                let process = process.clone();
                async move { process.is_running().await }
            },
        )
        .await;
        if !up {
            self.set_state(SessionState::Disconnected);
            return Err(Error::Connection(
                "controller process did not start within budget".into(),
            ));
        }

        let process = self.process.clone();
        let runtime = wait_for(
            PollConfig::new(self.timing.runtime_poll, self.timing.runtime_timeout),
            || {
                let process = process.clone();
                async move { process.attach_runtime().await }
            },
        )
        .await;

        let Some(runtime) = runtime else {
            // Process is alive but the automation runtime never appeared.
            warn!("runtime handle not available; continuing in degraded mode");
            self.set_state(SessionState::Ready);
            return Ok(());
        };

        let (events_tx, events_rx) = mpsc::channel(64);
        let subscribed =
            self.capabilities.event_subscription && runtime.subscribe_events(events_tx);
        if !subscribed {
            debug!("event subscription unavailable; channel acquisition will poll");
        }
        *self.channels.lock() = Some(Arc::new(ChannelAcquirer::new(
            events_rx,
            self.timing.channel,
        )));
        *self.pump.lock() = Some(EventPump::spawn(runtime.clone(), self.timing.pump_interval));
        *self.runtime.lock() = Some(runtime.clone());

        if !simulation {
            let settled = self
                .wait_for_status(&runtime, FluentStatus::EditMode)
                .await;
            if !settled {
                warn!("controller did not reach edit mode; continuing anyway");
            }
        }

        let code = runtime.status().await;
        self.set_state(
            FluentStatus::from_code(code)
                .map(FluentStatus::session_state)
                .unwrap_or(SessionState::EditMode),
        );
        info!(status = code, "connected");
        Ok(())
    }

    /// Stops the event pump, releases handles, and closes the controller.
    pub async fn disconnect(&self) -> Result<()> {
        if let Some(pump) = self.pump.lock().take() {
            pump.stop().await;
        }
        if let Some(channels) = self.channels.lock().take() {
            channels.clear_current();
        }
        *self.runtime.lock() = None;
        if let Err(e) = self.process.close().await {
            warn!(error = %e, "controller shutdown reported an error");
        }
        self.set_state(SessionState::Disconnected);
        info!("disconnected");
        Ok(())
    }

    /// Raw controller status code.
    pub async fn status(&self) -> Result<i32> {
        Ok(self.runtime()?.status().await)
    }

    /// Prepares and starts a method, clearing recovery state first if needed.
    ///
    /// Returns `Ok(true)` once the method is running. Calling this while a
    /// method is already running is a no-op that returns `Ok(true)`.
    pub async fn run_method(&self, name: &str) -> Result<bool> {
        let runtime = self.runtime()?;
        let code = runtime.status().await;

        if code == FluentStatus::RunModeRunning.code() {
            debug!(method = name, "method already running");
            self.set_state(SessionState::Running);
            return Ok(true);
        }

        if let Some(status) = FluentStatus::from_code(code).filter(|s| s.is_recovery()) {
            self.clear_recovery(&runtime, status).await?;
        }

        self.set_state(SessionState::PreparingMethod);
        info!(method = name, "preparing method");
        runtime.prepare_method(name).await?;

        // The controller takes a moment to move the run into the pipeline;
        // preparing-recovery here is usually transient.
        let rt = runtime.clone();
        let settled = wait_until(
            PollConfig::new(
                self.timing.preparation_poll,
                self.timing.preparation_timeout,
            ),
            move || {
                let rt = rt.clone();
                async move {
                    matches!(
                        FluentStatus::from_code(rt.status().await),
                        Some(FluentStatus::RunModeWaitingForSystem)
                            | Some(FluentStatus::RunModePreparingRun)
                    )
                }
            },
        )
        .await;
        if !settled {
            let code = runtime.status().await;
            if code == FluentStatus::RunModePreparingRecovery.code() {
                warn!(status = code, "preparing recovery while starting run; continuing");
            } else {
                debug!(status = code, "run preparation did not settle; continuing");
            }
        }

        info!(method = name, "starting method");
        runtime.run_method().await?;

        sleep(self.timing.post_run_settle).await;
        if !runtime.is_method_running().await {
            let status = runtime.status().await;
            let message = runtime
                .last_error()
                .await
                .unwrap_or_else(|| "method stopped immediately after start".to_string());
            self.set_state(
                FluentStatus::from_code(status)
                    .map(FluentStatus::session_state)
                    .unwrap_or(SessionState::EditMode),
            );
            return Err(Error::MethodAborted { status, message });
        }

        self.set_state(SessionState::Running);
        Ok(true)
    }

    /// Waits for the running method's execution channel.
    ///
    /// Returns `Ok(false)` on timeout; the caller decides whether that is
    /// fatal.
    pub async fn wait_for_channel(&self, budget: Duration) -> Result<bool> {
        let runtime = self.runtime()?;
        Ok(self.channels()?.wait_for_channel(&runtime, budget).await)
    }

    /// Pauses the active run. State becomes `Busy` until the controller
    /// reports back through status polling.
    pub async fn pause(&self) -> Result<()> {
        let runtime = self.runtime()?;
        self.set_state(SessionState::Busy);
        runtime.pause_run().await?;
        info!("run paused");
        Ok(())
    }

    /// Resumes a paused run.
    pub async fn resume(&self) -> Result<()> {
        let runtime = self.runtime()?;
        runtime.resume_run().await?;
        self.set_state(SessionState::Running);
        info!("run resumed");
        Ok(())
    }

    /// Stops the active run and returns the controller to the editor.
    pub async fn stop(&self) -> Result<()> {
        let runtime = self.runtime()?;
        runtime.stop_method().await?;
        if let Some(channels) = self.channels.lock().clone() {
            channels.clear_current();
        }
        self.set_state(SessionState::EditMode);
        info!("run stopped");
        Ok(())
    }

    /// Methods the controller can run right now.
    pub async fn available_methods(&self) -> Result<Vec<String>> {
        self.runtime()?.runnable_methods().await
    }

    /// Whether the connected controller runs in simulation mode.
    pub fn is_simulation(&self) -> bool {
        *self.simulation.lock()
    }

    async fn wait_for_status(&self, runtime: &Arc<dyn RuntimeHandle>, wanted: FluentStatus) -> bool {
        let rt = runtime.clone();
        wait_until(
            PollConfig::new(self.timing.edit_mode_poll, self.timing.edit_mode_timeout),
            move || {
                let rt = rt.clone();
                async move { rt.status().await == wanted.code() }
            },
        )
        .await
    }

    /// Clears a recovery state before a new run: stop and close whatever is
    /// halted, let the recovery handler work the dialog, then insist on
    /// edit mode.
    async fn clear_recovery(
        &self,
        runtime: &Arc<dyn RuntimeHandle>,
        status: FluentStatus,
    ) -> Result<()> {
        warn!(%status, "controller in recovery before run, attempting to clear");
        self.set_state(SessionState::Recovering);

        if let Err(e) = runtime.stop_method().await {
            debug!(error = %e, "stop during recovery clearing failed");
        }
        if let Err(e) = runtime.close_method().await {
            debug!(error = %e, "close during recovery clearing failed");
        }

        let handler = RecoveryHandler::new(
            self.recovery_registry.clone(),
            self.capabilities.keyword_recovery_probe,
        )
        .with_timing(self.timing.recovery_spacing, self.timing.recovery_timeout);
        if !handler.resolve(runtime).await {
            warn!("recovery handler could not clear the dialog");
        }

        if self.wait_for_status(runtime, FluentStatus::EditMode).await {
            self.set_state(SessionState::EditMode);
            return Ok(());
        }
        let code = runtime.status().await;
        self.set_state(
            FluentStatus::from_code(code)
                .map(FluentStatus::session_state)
                .unwrap_or(SessionState::StoppedOnError),
        );
        Err(Error::RecoveryModeDetected { status: code })
    }
}
