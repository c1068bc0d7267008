//! fluent: High-level Rust control layer for Tecan Fluent liquid handlers
//!
//! This crate provides the public API for driving a FluentControl instrument
//! session: starting the controller, running methods, and dispatching
//! worktable commands (tips, pipetting, arm and gripper moves, dialogs)
//! through the running method's execution channel.
//!
//! # Example
//!
//! ```ignore
//! use fluent::{ConnectOptions, Fluent, PipettingParams};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // `process` is an InstrumentProcess implementation reaching the
//!     // local FluentControl installation.
//!     let instrument = Fluent::connect(process, ConnectOptions::simulation()).await?;
//!
//!     instrument.run_method("pyfluent_method").await?;
//!     instrument.wait_for_channel().await?;
//!
//!     instrument.get_tips(None, None).await?;
//!     instrument
//!         .aspirate("Samples", vec![50; 8], PipettingParams::new().wells(0u32))
//!         .await?;
//!     instrument
//!         .dispense("Plate_1", vec![50; 8], PipettingParams::new().wells(0u32))
//!         .await?;
//!     instrument.drop_tips(None, None).await?;
//!
//!     instrument.stop_method().await?;
//!     instrument.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! The wire types live in [`protocol`] and the session machinery in
//! [`runtime`]; both are re-exported here so most users only depend on this
//! crate.

mod fluent;
mod options;

pub use fluent::Fluent;
pub use options::ConnectOptions;

pub use fluent_protocol as protocol;
pub use fluent_runtime as runtime;

pub use fluent_protocol::{
    ArmRole, CommandDescriptor, DeviceAlias, EncodeError, OneOrMany, OperationKind,
    PipettingParams, offset_to_well_name, well_name_to_offset,
};
pub use fluent_runtime::{
    Capabilities, ConnectMode, Error, ExecutionChannel, FluentStatus, InstrumentProcess,
    RecoveryRegistry, Result, RuntimeHandle, SessionState, SessionTiming,
};
