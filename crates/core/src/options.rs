//! Connection options.

use fluent_runtime::{Capabilities, ConnectMode, RecoveryRegistry, SessionTiming};
use std::time::Duration;

/// Everything [`crate::Fluent::connect`] needs besides the process handle.
///
/// The defaults connect in simulation mode with production timing and an
/// empty recovery registry (recovery falls back to the keyword probe).
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// How to start or attach to the controller.
    pub mode: ConnectMode,
    /// Optional backend integrations, resolved once at connect time.
    pub capabilities: Capabilities,
    /// Timing for every bounded wait in the session.
    pub timing: SessionTiming,
    /// Known per-version recovery operations.
    pub recovery: RecoveryRegistry,
    /// Budget for waiting on the method execution channel.
    pub channel_budget: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            mode: ConnectMode::Simulation,
            capabilities: Capabilities::default(),
            timing: SessionTiming::default(),
            recovery: RecoveryRegistry::new(),
            channel_budget: Duration::from_secs(120),
        }
    }
}

impl ConnectOptions {
    /// Simulation mode with default timing.
    pub fn simulation() -> Self {
        Self::default()
    }

    /// Real-instrument mode with explicit credentials.
    pub fn credentialed(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            mode: ConnectMode::Credentialed {
                username: username.into(),
                password: password.into(),
            },
            ..Self::default()
        }
    }

    /// Attach to an already-running controller.
    pub fn attach() -> Self {
        Self {
            mode: ConnectMode::Attach,
            ..Self::default()
        }
    }

    /// Overrides the capabilities.
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Overrides the session timing.
    pub fn timing(mut self, timing: SessionTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Installs a recovery registry.
    pub fn recovery(mut self, recovery: RecoveryRegistry) -> Self {
        self.recovery = recovery;
        self
    }

    /// Overrides the channel wait budget.
    pub fn channel_budget(mut self, budget: Duration) -> Self {
        self.channel_budget = budget;
        self
    }
}
