//! Recovery dialog handling.
//!
//! When a run halts on an error the controller shows a recovery dialog that
//! normally needs an operator click. Clearing it programmatically is
//! best-effort: a known per-version operation is tried first, and only when
//! the registry has no entry for the running controller does the handler
//! fall back to probing discovered operation names by keyword. Failure is
//! never fatal; the caller decides what an uncleared dialog means.

use crate::control::RuntimeHandle;
use crate::poll::PollConfig;
use crate::status::FluentStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// Operation name fragments that historically match recovery/dialog
/// controls on the runtime surface.
const RECOVERY_KEYWORDS: &[&str] = &[
    "recovery", "skip", "dismiss", "cancel", "continue", "bypass", "accept", "confirm", "ok",
    "dialog",
];

/// Known-good recovery operations per controller version.
///
/// Keyed by version prefix; the first matching entry wins. Entries are added
/// as controller releases are qualified, which keeps the keyword probe off
/// the hot path for known versions.
#[derive(Debug, Clone, Default)]
pub struct RecoveryRegistry {
    entries: Vec<(String, Vec<String>)>,
}

impl RecoveryRegistry {
    /// An empty registry; every version falls back to the keyword probe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the recovery operations for a version prefix ("2.8").
    pub fn register(
        &mut self,
        version_prefix: impl Into<String>,
        operations: Vec<String>,
    ) -> &mut Self {
        self.entries.push((version_prefix.into(), operations));
        self
    }

    /// Operations registered for the given full version string.
    pub fn operations_for(&self, version: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(prefix, _)| version.starts_with(prefix.as_str()))
            .map(|(_, ops)| ops.as_slice())
    }
}

/// Drives recovery attempts against a runtime in a recovery state.
pub struct RecoveryHandler {
    registry: RecoveryRegistry,
    keyword_probe: bool,
    /// Spacing between attempts.
    attempt_spacing: Duration,
    /// Overall budget for clearing the dialog.
    budget: Duration,
}

impl RecoveryHandler {
    /// Creates a handler with the default 5 s spacing / 300 s budget.
    pub fn new(registry: RecoveryRegistry, keyword_probe: bool) -> Self {
        Self {
            registry,
            keyword_probe,
            attempt_spacing: Duration::from_secs(5),
            budget: Duration::from_secs(300),
        }
    }

    /// Overrides the attempt spacing and overall budget.
    pub fn with_timing(mut self, spacing: Duration, budget: Duration) -> Self {
        self.attempt_spacing = spacing;
        self.budget = budget;
        self
    }

    /// The poll config for waiting out a recovery state without attempting
    /// to clear it.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig::new(self.attempt_spacing, self.budget)
    }

    /// Attempts to clear the recovery state. Returns whether the controller
    /// left recovery within the budget.
    pub async fn resolve(&self, runtime: &Arc<dyn RuntimeHandle>) -> bool {
        let deadline = Instant::now() + self.budget;
        loop {
            let code = runtime.status().await;
            match FluentStatus::from_code(code) {
                Some(status) if status.is_recovery() => {
                    debug!(%status, "controller in recovery, attempting to clear");
                }
                _ => {
                    info!(code, "recovery cleared");
                    return true;
                }
            }

            self.attempt(runtime).await;

            if Instant::now() + self.attempt_spacing > deadline {
                warn!(code, "recovery dialog not cleared within budget");
                return false;
            }
            sleep(self.attempt_spacing).await;
        }
    }

    /// One clearing attempt: registry first, keyword probe as fallback.
    async fn attempt(&self, runtime: &Arc<dyn RuntimeHandle>) {
        let version = runtime.version();
        if let Some(operations) = self.registry.operations_for(&version) {
            for operation in operations {
                match runtime.invoke_operation(operation).await {
                    Ok(true) => {
                        info!(%operation, %version, "registered recovery operation accepted");
                        return;
                    }
                    Ok(false) => debug!(%operation, "registered recovery operation declined"),
                    Err(e) => debug!(%operation, error = %e, "registered recovery operation failed"),
                }
            }
            return;
        }

        if !self.keyword_probe {
            debug!(%version, "no registry entry and keyword probe disabled");
            return;
        }
        warn!(%version, "no registry entry, falling back to keyword probe");
        for name in runtime.discover_operations().await {
            let lowered = name.to_lowercase();
            if !RECOVERY_KEYWORDS.iter().any(|k| lowered.contains(k)) {
                continue;
            }
            match runtime.invoke_operation(&name).await {
                Ok(true) => {
                    info!(operation = %name, "probed recovery operation accepted");
                    return;
                }
                Ok(false) => debug!(operation = %name, "probed recovery operation declined"),
                Err(e) => debug!(operation = %name, error = %e, "probed operation failed"),
            }
        }
    }
}
