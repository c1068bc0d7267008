//! Controller status codes and the session state machine.
//!
//! The controller reports its mode as a small integer. The codes are part of
//! the vendor automation surface and must not be renumbered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw controller status codes, verbatim from the automation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum FluentStatus {
    /// Method editor is open, nothing running.
    EditMode = 6,
    /// A run is being prepared.
    RunModePreparingRun = 8,
    /// A recovery run is being prepared.
    RunModePreparingRecovery = 9,
    /// Run is queued, waiting for the instrument.
    RunModeWaitingForSystem = 10,
    /// A method is executing.
    RunModeRunning = 12,
    /// Execution halted on an error dialog.
    RunModeStopOnError = 19,
    /// A recovery run is executing.
    RunModeRecoveryRunning = 20,
}

impl FluentStatus {
    /// Decodes a raw status code, returning `None` for codes this layer does
    /// not track.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            6 => Some(FluentStatus::EditMode),
            8 => Some(FluentStatus::RunModePreparingRun),
            9 => Some(FluentStatus::RunModePreparingRecovery),
            10 => Some(FluentStatus::RunModeWaitingForSystem),
            12 => Some(FluentStatus::RunModeRunning),
            19 => Some(FluentStatus::RunModeStopOnError),
            20 => Some(FluentStatus::RunModeRecoveryRunning),
            _ => None,
        }
    }

    /// The raw wire code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// True for the states where the controller is showing or preparing a
    /// recovery dialog.
    pub fn is_recovery(self) -> bool {
        matches!(
            self,
            FluentStatus::RunModePreparingRecovery
                | FluentStatus::RunModeStopOnError
                | FluentStatus::RunModeRecoveryRunning
        )
    }

    /// Maps the controller mode onto the session state machine.
    pub fn session_state(self) -> SessionState {
        match self {
            FluentStatus::EditMode => SessionState::EditMode,
            FluentStatus::RunModePreparingRun | FluentStatus::RunModeWaitingForSystem => {
                SessionState::PreparingMethod
            }
            FluentStatus::RunModeRunning => SessionState::Running,
            FluentStatus::RunModePreparingRecovery | FluentStatus::RunModeRecoveryRunning => {
                SessionState::Recovering
            }
            FluentStatus::RunModeStopOnError => SessionState::StoppedOnError,
        }
    }
}

impl fmt::Display for FluentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FluentStatus::EditMode => "EditMode",
            FluentStatus::RunModePreparingRun => "RunModePreparingRun",
            FluentStatus::RunModePreparingRecovery => "RunModePreparingRecovery",
            FluentStatus::RunModeWaitingForSystem => "RunModeWaitingForSystem",
            FluentStatus::RunModeRunning => "RunModeRunning",
            FluentStatus::RunModeStopOnError => "RunModeStopOnError",
            FluentStatus::RunModeRecoveryRunning => "RunModeRecoveryRunning",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// The session-level view of the connection lifecycle.
///
/// Dispatch is only legal in `Running` with a live channel; the session
/// controller is the only writer of this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// No controller process attached.
    Disconnected,
    /// Launch/attach in progress.
    Connecting,
    /// Controller idle in the method editor.
    EditMode,
    /// PrepareMethod issued, run not started yet.
    PreparingMethod,
    /// A method is executing and commands may be dispatched.
    Running,
    /// Recovery dialog handling in progress.
    Recovering,
    /// Execution halted on an error dialog.
    StoppedOnError,
    /// A control request (pause) is in flight.
    Busy,
    /// Connected in degraded mode, no runtime handle.
    Ready,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "Disconnected",
            SessionState::Connecting => "Connecting",
            SessionState::EditMode => "EditMode",
            SessionState::PreparingMethod => "PreparingMethod",
            SessionState::Running => "Running",
            SessionState::Recovering => "Recovering",
            SessionState::StoppedOnError => "StoppedOnError",
            SessionState::Busy => "Busy",
            SessionState::Ready => "Ready",
        };
        f.write_str(name)
    }
}
