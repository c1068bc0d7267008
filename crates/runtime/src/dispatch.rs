//! Command dispatch.
//!
//! Dispatch is the last stop before a command reaches the instrument, so the
//! pre-flight checks run in a fixed order and each failure is distinct: no
//! channel, dead channel, method gone. The descriptor is only converted to
//! its wire form after all checks pass.

use crate::channel::ChannelAcquirer;
use crate::control::RuntimeHandle;
use crate::error::{Error, Result};
use fluent_protocol::{CommandDescriptor, OperationKind, encode};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error};

/// Delivers encoded commands through the adopted execution channel.
#[derive(Clone)]
pub struct CommandDispatcher {
    runtime: Arc<dyn RuntimeHandle>,
    channels: Arc<ChannelAcquirer>,
    /// Base settle unit applied after each command in visual simulation;
    /// zero disables settling entirely.
    settle_unit: Duration,
}

impl CommandDispatcher {
    /// Creates a dispatcher over the given runtime and channel slot.
    pub fn new(
        runtime: Arc<dyn RuntimeHandle>,
        channels: Arc<ChannelAcquirer>,
        settle_unit: Duration,
    ) -> Self {
        Self {
            runtime,
            channels,
            settle_unit,
        }
    }

    /// Encodes and executes one command on the running method.
    pub async fn dispatch(&self, descriptor: &CommandDescriptor) -> Result<()> {
        let Some(channel) = self.channels.current() else {
            return Err(Error::ChannelUnavailable);
        };
        if !channel.is_alive().await {
            self.channels.clear_current();
            return Err(Error::ChannelDead);
        }
        if !self.runtime.is_method_running().await {
            let status = self.runtime.status().await;
            let message = self
                .runtime
                .last_error()
                .await
                .unwrap_or_else(|| "method is no longer running".to_string());
            return Err(Error::MethodAborted { status, message });
        }

        let document = encode(descriptor)?;
        debug!(
            operation = descriptor.kind.name(),
            channel = channel.id(),
            bytes = document.len(),
            "dispatching command"
        );
        if let Err(e) = channel.execute_command(&document).await {
            let status = self.runtime.status().await;
            error!(operation = descriptor.kind.name(), status, error = %e, "command rejected");
            return Err(match e {
                Error::CommandExecution { message, .. } => Error::CommandExecution { message, status },
                other => Error::CommandExecution {
                    message: other.to_string(),
                    status,
                },
            });
        }

        let settle = self.settle_delay(descriptor.kind);
        if !settle.is_zero() {
            sleep(settle).await;
        }
        Ok(())
    }

    /// Visualizer settle time per operation kind. Pipetting and gripper
    /// motions animate longest; dialogs barely at all.
    fn settle_delay(&self, kind: OperationKind) -> Duration {
        let factor = match kind {
            OperationKind::GetTips
            | OperationKind::Aspirate
            | OperationKind::Dispense
            | OperationKind::GetLabware
            | OperationKind::PutLabware => 3,
            OperationKind::DropTips | OperationKind::MoveToPosition | OperationKind::MoveToSafe => 2,
            OperationKind::GenericCommand | OperationKind::UserPrompt | OperationKind::Subroutine => 1,
        };
        self.settle_unit * factor
    }
}
