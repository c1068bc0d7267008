//! Wire types for the Fluent controller protocol.
//!
//! This crate contains the data types and encoders that describe commands as
//! they travel to the FluentControl runtime: well coordinates, per-tip volume
//! lists, device aliases, and the XML script documents the controller's
//! channel API accepts.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No I/O, no async, no controller state
//! - **Deterministic**: The same descriptor always encodes to the same bytes
//! - **Stable**: The XML documents reproduce the vendor schema verbatim
//!
//! The session/channel machinery built on top of these types lives in
//! `fluent-runtime`.

pub mod constants;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod script;
pub mod wells;

pub use constants::*;
pub use descriptor::{CommandDescriptor, OneOrMany, OperationKind, PipettingParams};
pub use device::{ArmRole, DeviceAlias};
pub use error::{EncodeError, Result};
pub use script::encode;
pub use wells::{
    offset_to_well_name, selected_wells_string, serialized_well_indexes, well_name_to_offset,
};
