//! Control traits - the seam between the runtime and the controller process.
//!
//! The FluentControl automation surface is reached through these traits so
//! the session machinery never depends on a concrete transport. Production
//! code plugs in a COM-backed implementation; the scripted controller in
//! [`crate::testing`] implements the same traits for tests.

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// How to start or attach to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectMode {
    /// Start the controller in simulation mode with the built-in account.
    Simulation,
    /// Start and log in with explicit credentials.
    Credentialed { username: String, password: String },
    /// Attach to an already-running controller.
    Attach,
}

/// Optional integrations resolved once at connect time.
///
/// These are injected by the caller instead of being probed lazily, so a
/// missing integration degrades the same way on every call.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    /// The backend can push events; without it the runtime relies on polling.
    pub event_subscription: bool,
    /// Recovery handling may fall back to probing operation names by keyword
    /// when the version registry has no entry for this controller.
    pub keyword_recovery_probe: bool,
    /// The controller renders the simulation visualizer; commands get a
    /// settle delay so the visual state can catch up.
    pub visual_simulation: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            event_subscription: true,
            keyword_recovery_probe: true,
            visual_simulation: false,
        }
    }
}

/// Events surfaced by the controller backend.
///
/// A single pump task forwards these into one bounded queue; the channel
/// acquirer is the only consumer.
#[derive(Clone)]
pub enum RuntimeEvent {
    /// The runtime handle became available after process start.
    RuntimeAvailable,
    /// The controller reported a new raw status code.
    StatusChanged(i32),
    /// A method opened an execution channel.
    ChannelOpened(Arc<dyn ExecutionChannel>),
    /// The controller raised an error outside a command round-trip.
    ErrorRaised(String),
}

impl fmt::Debug for RuntimeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeEvent::RuntimeAvailable => f.write_str("RuntimeAvailable"),
            RuntimeEvent::StatusChanged(code) => write!(f, "StatusChanged({code})"),
            RuntimeEvent::ChannelOpened(ch) => write!(f, "ChannelOpened({})", ch.id()),
            RuntimeEvent::ErrorRaised(msg) => write!(f, "ErrorRaised({msg:?})"),
        }
    }
}

/// The controller process itself: launch, liveness, teardown.
#[async_trait]
pub trait InstrumentProcess: Send + Sync {
    /// Starts the controller (or attaches to a running one) per `mode`.
    async fn launch(&self, mode: &ConnectMode) -> Result<()>;

    /// Returns true while the controller process is up.
    async fn is_running(&self) -> bool;

    /// Returns the runtime handle once the controller exposes it.
    ///
    /// `None` means the process is up but the runtime surface has not
    /// appeared yet (or never will - degraded mode).
    async fn attach_runtime(&self) -> Option<Arc<dyn RuntimeHandle>>;

    /// Shuts the controller down.
    async fn close(&self) -> Result<()>;
}

/// The controller's method runtime: status, run lifecycle, channels.
#[async_trait]
pub trait RuntimeHandle: Send + Sync {
    /// Raw controller status code.
    async fn status(&self) -> i32;

    /// Loads a method into the run pipeline.
    async fn prepare_method(&self, name: &str) -> Result<()>;

    /// Starts the prepared method.
    async fn run_method(&self) -> Result<()>;

    /// Pauses the active run.
    async fn pause_run(&self) -> Result<()>;

    /// Resumes a paused run.
    async fn resume_run(&self) -> Result<()>;

    /// Stops the active run.
    async fn stop_method(&self) -> Result<()>;

    /// Closes the current method and returns to the editor.
    async fn close_method(&self) -> Result<()>;

    /// True while a method is executing.
    async fn is_method_running(&self) -> bool;

    /// Names of the methods the controller can run right now.
    async fn runnable_methods(&self) -> Result<Vec<String>>;

    /// The channel of the executing method, if one is open.
    async fn current_execution_channel(&self) -> Option<Arc<dyn ExecutionChannel>>;

    /// Registers the event queue writer. Returns false when the backend
    /// cannot push events (polling remains the only path).
    fn subscribe_events(&self, tx: mpsc::Sender<RuntimeEvent>) -> bool;

    /// Gives the backend a slice of time to deliver pending events.
    ///
    /// Called by the pump task on a fixed cadence for the whole session.
    async fn pump_events(&self);

    /// Last error message captured from the controller, if any.
    async fn last_error(&self) -> Option<String>;

    /// Controller version string ("2.8.1.100").
    fn version(&self) -> String;

    /// Zero-argument operation names discoverable on the runtime surface.
    /// Used by the recovery keyword probe.
    async fn discover_operations(&self) -> Vec<String>;

    /// Invokes a discovered operation by name. Returns whether the
    /// controller accepted it.
    async fn invoke_operation(&self, name: &str) -> Result<bool>;
}

/// A method execution channel.
///
/// Channels are owned by the controller; this layer only borrows them, so
/// every use is preceded by a liveness probe.
#[async_trait]
pub trait ExecutionChannel: Send + Sync {
    /// Identifier for logs and history lookups.
    fn id(&self) -> u64;

    /// True while the underlying channel object still responds.
    async fn is_alive(&self) -> bool;

    /// Executes an encoded command document on the running method.
    async fn execute_command(&self, content: &str) -> Result<()>;

    /// Best-effort registration of an error callback. Failure is logged by
    /// the caller and never fatal.
    fn register_error_callback(&self, tx: mpsc::Sender<String>) -> Result<()>;
}
