//! Scripted controller doubles for tests.
//!
//! [`SimulatedController`] implements the control traits over in-memory
//! state so every lifecycle path - connect, run, channel loss, recovery -
//! can be scripted without a FluentControl installation. It is compiled
//! into the library (not behind `cfg(test)`) so downstream crates can test
//! against it too.

use crate::control::{
    ConnectMode, ExecutionChannel, InstrumentProcess, RuntimeEvent, RuntimeHandle,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use tokio::sync::mpsc;

/// In-memory execution channel with scriptable liveness and rejection.
pub struct SimulatedChannel {
    id: u64,
    alive: AtomicBool,
    liveness_script: Mutex<VecDeque<bool>>,
    reject: Mutex<Option<String>>,
    executed: Mutex<Vec<String>>,
    error_tx: Mutex<Option<mpsc::Sender<String>>>,
}

impl SimulatedChannel {
    pub fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id,
            alive: AtomicBool::new(true),
            liveness_script: Mutex::new(VecDeque::new()),
            reject: Mutex::new(None),
            executed: Mutex::new(Vec::new()),
            error_tx: Mutex::new(None),
        })
    }

    /// Fixes the answers of the next `is_alive` probes; once exhausted the
    /// plain alive flag applies again.
    pub fn script_liveness(&self, answers: Vec<bool>) {
        *self.liveness_script.lock() = answers.into();
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    /// Makes the next `execute_command` fail with the given message.
    pub fn reject_next(&self, message: &str) {
        *self.reject.lock() = Some(message.to_string());
    }

    /// Documents executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    /// Pushes a message through the registered error callback, if any.
    pub fn raise_error(&self, message: &str) {
        if let Some(tx) = self.error_tx.lock().clone() {
            let _ = tx.try_send(message.to_string());
        }
    }
}

#[async_trait]
impl ExecutionChannel for SimulatedChannel {
    fn id(&self) -> u64 {
        self.id
    }

    async fn is_alive(&self) -> bool {
        if let Some(answer) = self.liveness_script.lock().pop_front() {
            return answer;
        }
        self.alive.load(Ordering::SeqCst)
    }

    async fn execute_command(&self, content: &str) -> Result<()> {
        if let Some(message) = self.reject.lock().take() {
            return Err(Error::CommandExecution {
                message,
                status: 19,
            });
        }
        self.executed.lock().push(content.to_string());
        Ok(())
    }

    fn register_error_callback(&self, tx: mpsc::Sender<String>) -> Result<()> {
        *self.error_tx.lock() = Some(tx);
        Ok(())
    }
}

/// Scripted runtime surface.
///
/// Status answers come from a script first and the plain status cell once
/// the script is exhausted, so tests can stage sequences like
/// "edit mode, preparing, stopped on error".
pub struct SimulatedRuntime {
    status: AtomicI32,
    status_script: Mutex<VecDeque<i32>>,
    method_running: AtomicBool,
    run_stalls: AtomicBool,
    prepare_failure: Mutex<Option<String>>,
    prepared: Mutex<Vec<String>>,
    last_error: Mutex<Option<String>>,
    version: Mutex<String>,
    methods: Mutex<Vec<String>>,
    operations: Mutex<Vec<String>>,
    accepted: Mutex<Vec<String>>,
    invoked: Mutex<Vec<String>>,
    channel: Mutex<Option<Arc<dyn ExecutionChannel>>>,
    channel_after_polls: AtomicU32,
    events_supported: AtomicBool,
    events_tx: Mutex<Option<mpsc::Sender<RuntimeEvent>>>,
    pending_events: Mutex<VecDeque<RuntimeEvent>>,
    pump_count: AtomicU32,
}

impl SimulatedRuntime {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            status: AtomicI32::new(6),
            status_script: Mutex::new(VecDeque::new()),
            method_running: AtomicBool::new(false),
            run_stalls: AtomicBool::new(false),
            prepare_failure: Mutex::new(None),
            prepared: Mutex::new(Vec::new()),
            last_error: Mutex::new(None),
            version: Mutex::new("2.8.0.0".to_string()),
            methods: Mutex::new(Vec::new()),
            operations: Mutex::new(Vec::new()),
            accepted: Mutex::new(Vec::new()),
            invoked: Mutex::new(Vec::new()),
            channel: Mutex::new(None),
            channel_after_polls: AtomicU32::new(0),
            events_supported: AtomicBool::new(true),
            events_tx: Mutex::new(None),
            pending_events: Mutex::new(VecDeque::new()),
            pump_count: AtomicU32::new(0),
        })
    }

    pub fn set_status(&self, code: i32) {
        self.status.store(code, Ordering::SeqCst);
    }

    /// Stages status answers consumed before the plain status cell.
    pub fn script_statuses(&self, codes: Vec<i32>) {
        *self.status_script.lock() = codes.into();
    }

    pub fn set_method_running(&self, running: bool) {
        self.method_running.store(running, Ordering::SeqCst);
    }

    /// Makes `run_method` leave the method stopped, as a crashed start does.
    pub fn stall_next_run(&self) {
        self.run_stalls.store(true, Ordering::SeqCst);
    }

    /// Makes the next `prepare_method` fail.
    pub fn fail_prepare(&self, message: &str) {
        *self.prepare_failure.lock() = Some(message.to_string());
    }

    /// Method names passed to `prepare_method` so far.
    pub fn prepared(&self) -> Vec<String> {
        self.prepared.lock().clone()
    }

    pub fn set_last_error(&self, message: &str) {
        *self.last_error.lock() = Some(message.to_string());
    }

    pub fn set_version(&self, version: &str) {
        *self.version.lock() = version.to_string();
    }

    pub fn set_methods(&self, methods: Vec<String>) {
        *self.methods.lock() = methods;
    }

    pub fn set_operations(&self, operations: Vec<String>) {
        *self.operations.lock() = operations;
    }

    /// Marks an operation as accepted: invoking it returns true and puts
    /// the controller back into edit mode.
    pub fn accept_operation(&self, name: &str) {
        self.accepted.lock().push(name.to_string());
    }

    /// Every operation invocation seen, accepted or not.
    pub fn invoked(&self) -> Vec<String> {
        self.invoked.lock().clone()
    }

    /// Installs the channel returned by `current_execution_channel`, hidden
    /// for the first `after_polls` calls.
    pub fn set_channel(&self, channel: Arc<dyn ExecutionChannel>, after_polls: u32) {
        *self.channel.lock() = Some(channel);
        self.channel_after_polls.store(after_polls, Ordering::SeqCst);
    }

    /// Disables event subscription, forcing the polling path.
    pub fn refuse_events(&self) {
        self.events_supported.store(false, Ordering::SeqCst);
    }

    /// Queues an event delivered on the next pump tick.
    pub fn queue_event(&self, event: RuntimeEvent) {
        self.pending_events.lock().push_back(event);
    }

    pub fn pump_count(&self) -> u32 {
        self.pump_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuntimeHandle for SimulatedRuntime {
    async fn status(&self) -> i32 {
        if let Some(code) = self.status_script.lock().pop_front() {
            self.status.store(code, Ordering::SeqCst);
            return code;
        }
        self.status.load(Ordering::SeqCst)
    }

    async fn prepare_method(&self, name: &str) -> Result<()> {
        if let Some(message) = self.prepare_failure.lock().take() {
            return Err(Error::CommandExecution {
                message,
                status: self.status.load(Ordering::SeqCst),
            });
        }
        self.prepared.lock().push(name.to_string());
        self.status.store(8, Ordering::SeqCst);
        Ok(())
    }

    async fn run_method(&self) -> Result<()> {
        if self.run_stalls.swap(false, Ordering::SeqCst) {
            self.method_running.store(false, Ordering::SeqCst);
            return Ok(());
        }
        self.method_running.store(true, Ordering::SeqCst);
        self.status.store(12, Ordering::SeqCst);
        Ok(())
    }

    async fn pause_run(&self) -> Result<()> {
        Ok(())
    }

    async fn resume_run(&self) -> Result<()> {
        Ok(())
    }

    async fn stop_method(&self) -> Result<()> {
        self.method_running.store(false, Ordering::SeqCst);
        self.status.store(6, Ordering::SeqCst);
        Ok(())
    }

    async fn close_method(&self) -> Result<()> {
        self.method_running.store(false, Ordering::SeqCst);
        self.status.store(6, Ordering::SeqCst);
        Ok(())
    }

    async fn is_method_running(&self) -> bool {
        self.method_running.load(Ordering::SeqCst)
    }

    async fn runnable_methods(&self) -> Result<Vec<String>> {
        Ok(self.methods.lock().clone())
    }

    async fn current_execution_channel(&self) -> Option<Arc<dyn ExecutionChannel>> {
        let channel = self.channel.lock().clone()?;
        let remaining = self.channel_after_polls.load(Ordering::SeqCst);
        if remaining > 0 {
            self.channel_after_polls.store(remaining - 1, Ordering::SeqCst);
            return None;
        }
        Some(channel)
    }

    fn subscribe_events(&self, tx: mpsc::Sender<RuntimeEvent>) -> bool {
        if !self.events_supported.load(Ordering::SeqCst) {
            return false;
        }
        *self.events_tx.lock() = Some(tx);
        true
    }

    async fn pump_events(&self) {
        self.pump_count.fetch_add(1, Ordering::SeqCst);
        let Some(tx) = self.events_tx.lock().clone() else {
            return;
        };
        let mut pending = self.pending_events.lock();
        while let Some(event) = pending.pop_front() {
            if tx.try_send(event).is_err() {
                break;
            }
        }
    }

    async fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    fn version(&self) -> String {
        self.version.lock().clone()
    }

    async fn discover_operations(&self) -> Vec<String> {
        self.operations.lock().clone()
    }

    async fn invoke_operation(&self, name: &str) -> Result<bool> {
        self.invoked.lock().push(name.to_string());
        if self.accepted.lock().iter().any(|a| a == name) {
            self.status.store(6, Ordering::SeqCst);
            return Ok(true);
        }
        Ok(false)
    }
}

/// Scripted controller process wrapping one [`SimulatedRuntime`].
pub struct SimulatedController {
    runtime: Arc<SimulatedRuntime>,
    launched: Mutex<Option<ConnectMode>>,
    closed: AtomicBool,
    running_after: AtomicU32,
    runtime_after: AtomicU32,
    runtime_absent: AtomicBool,
}

impl SimulatedController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            runtime: SimulatedRuntime::new(),
            launched: Mutex::new(None),
            closed: AtomicBool::new(false),
            running_after: AtomicU32::new(0),
            runtime_after: AtomicU32::new(0),
            runtime_absent: AtomicBool::new(false),
        })
    }

    /// The scripted runtime, for staging state.
    pub fn runtime(&self) -> Arc<SimulatedRuntime> {
        self.runtime.clone()
    }

    /// The same runtime as a trait object, as the session sees it.
    pub fn runtime_handle(&self) -> Arc<dyn RuntimeHandle> {
        self.runtime.clone()
    }

    /// Delays the first positive `is_running` answer by `polls` calls.
    pub fn running_after(&self, polls: u32) {
        self.running_after.store(polls, Ordering::SeqCst);
    }

    /// Delays the runtime handle by `polls` attach attempts.
    pub fn runtime_after(&self, polls: u32) {
        self.runtime_after.store(polls, Ordering::SeqCst);
    }

    /// Makes the runtime surface never appear (degraded mode).
    pub fn without_runtime(&self) {
        self.runtime_absent.store(true, Ordering::SeqCst);
    }

    /// The mode passed to `launch`, if it was called.
    pub fn launched_mode(&self) -> Option<ConnectMode> {
        self.launched.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstrumentProcess for SimulatedController {
    async fn launch(&self, mode: &ConnectMode) -> Result<()> {
        *self.launched.lock() = Some(mode.clone());
        Ok(())
    }

    async fn is_running(&self) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        let remaining = self.running_after.load(Ordering::SeqCst);
        if remaining > 0 {
            self.running_after.store(remaining - 1, Ordering::SeqCst);
            return false;
        }
        true
    }

    async fn attach_runtime(&self) -> Option<Arc<dyn RuntimeHandle>> {
        if self.runtime_absent.load(Ordering::SeqCst) {
            return None;
        }
        let remaining = self.runtime_after.load(Ordering::SeqCst);
        if remaining > 0 {
            self.runtime_after.store(remaining - 1, Ordering::SeqCst);
            return None;
        }
        Some(self.runtime.clone())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
