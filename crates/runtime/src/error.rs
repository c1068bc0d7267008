//! Error types for the Fluent runtime.

use fluent_protocol::EncodeError;
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the controller.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to start or attach to the controller process.
    #[error("Failed to connect to FluentControl: {0}")]
    Connection(String),

    /// The controller process is up but exposed no runtime handle.
    #[error("FluentControl runtime is not available; connection is in degraded mode")]
    RuntimeUnavailable,

    /// No execution channel is currently open.
    #[error("No execution channel is available; is a method running?")]
    ChannelUnavailable,

    /// The execution channel stopped responding to liveness probes.
    #[error("Execution channel is no longer alive")]
    ChannelDead,

    /// The controller is showing a recovery dialog that could not be cleared.
    #[error("Controller is in recovery mode (status {status})")]
    RecoveryModeDetected {
        /// Raw controller status code at detection time.
        status: i32,
    },

    /// The method stopped between RunMethod and the post-run liveness check,
    /// or died while commands were in flight.
    #[error("Method aborted (status {status}): {message}")]
    MethodAborted { status: i32, message: String },

    /// The controller rejected a command or the channel transport failed.
    #[error("Command execution failed: {message} (status {status})")]
    CommandExecution { message: String, status: i32 },

    /// Descriptor normalization or encoding failed.
    #[error("Configuration error: {0}")]
    Configuration(#[from] EncodeError),

    /// Timeout waiting for operation.
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl Error {
    /// Returns the controller status code carried by this error, if any.
    pub fn status_code(&self) -> Option<i32> {
        match self {
            Error::RecoveryModeDetected { status }
            | Error::MethodAborted { status, .. }
            | Error::CommandExecution { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Returns true if the error means the channel must be re-acquired.
    pub fn is_channel_loss(&self) -> bool {
        matches!(self, Error::ChannelUnavailable | Error::ChannelDead)
    }
}
