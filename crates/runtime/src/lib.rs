//! Fluent Runtime - Session lifecycle, channel acquisition, and dispatch
//!
//! This crate provides the runtime infrastructure for driving a FluentControl
//! instrument controller process:
//!
//! - **Session**: Connecting to the controller and walking the run lifecycle
//! - **Channel**: Acquiring and validating the method execution channel
//! - **Dispatch**: Pre-flight checks and delivery of encoded commands
//! - **Recovery**: Clearing controller recovery dialogs without operator input
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   fluent    │  High-level API (Fluent, operations)
//! └──────┬──────┘
//!        │ drives
//! ┌──────▼──────────┐
//! │ fluent-runtime  │  This crate
//! │  ┌───────────┐  │
//! │  │ Session   │  │  State machine, run lifecycle
//! │  └───────────┘  │
//! │  ┌───────────┐  │
//! │  │ Channel   │  │  Acquisition, liveness, history
//! │  └───────────┘  │
//! │  ┌───────────┐  │
//! │  │ Dispatch  │  │  Pre-flight checks, command delivery
//! │  └───────────┘  │
//! └─────────────────┘
//! ```
//!
//! # Decoupling via control traits
//!
//! The controller's automation surface is reached through the traits in
//! [`control`] ([`InstrumentProcess`], [`RuntimeHandle`],
//! [`ExecutionChannel`]). Production code plugs in a COM-backed
//! implementation; tests use the scripted controller in [`testing`].

pub mod channel;
pub mod control;
pub mod dispatch;
pub mod error;
pub mod poll;
pub mod pump;
pub mod recovery;
pub mod session;
pub mod status;
pub mod testing;

// Re-export key types at crate root
pub use channel::ChannelAcquirer;
pub use control::{
    Capabilities, ConnectMode, ExecutionChannel, InstrumentProcess, RuntimeEvent, RuntimeHandle,
};
pub use dispatch::CommandDispatcher;
pub use error::{Error, Result};
pub use poll::{PollConfig, wait_for, wait_until};
pub use pump::EventPump;
pub use recovery::{RecoveryHandler, RecoveryRegistry};
pub use session::{SessionController, SessionTiming};
pub use status::{FluentStatus, SessionState};
