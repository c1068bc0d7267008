//! Device alias registry for the instrument arms.
//!
//! The controller addresses hardware through stable alias strings. The
//! physical device ID only appears inside the LiHa script documents; the
//! alias is what every command references.

use serde::{Deserialize, Serialize};

/// The robot arms a command can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmRole {
    /// FCA - the 8-channel liquid handling arm (LiHa).
    SingleChannel,
    /// MCA - the 96-channel arm.
    MultiChannel,
    /// RGA - the robotic gripper arm.
    Gripper,
}

/// A resolved device alias with its physical ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAlias {
    /// Alias string used to address the device ("Instrument=1/Device=LIHA:1").
    pub alias: &'static str,
    /// Physical device ID embedded in script documents.
    pub device_id: &'static str,
}

/// FCA - Fixed Channel Arm (8-channel LiHa).
pub const FCA: DeviceAlias = DeviceAlias {
    alias: "Instrument=1/Device=LIHA:1",
    device_id: "USB:TECAN,MYRIUS,1310005667/LIHA:1",
};

/// MCA - Multi-Channel Arm (96-channel).
pub const MCA: DeviceAlias = DeviceAlias {
    alias: "Instrument=1/Device=MCA96:1",
    device_id: "USB:TECAN,MYRIUS,1310005667/MCA96:1",
};

/// RGA - Robotic Gripper Arm.
pub const RGA: DeviceAlias = DeviceAlias {
    alias: "Instrument=1/Device=RGA:1",
    device_id: "USB:TECAN,MYRIUS,1310005667/RGA:1",
};

/// Te-VacS vacuum system, where fitted.
pub const TEVACS: DeviceAlias = DeviceAlias {
    alias: "Instrument=1/Device=TeVacS:1",
    device_id: "USB:TECAN,MYRIUS,1310005667/TeVacS:1",
};

impl ArmRole {
    /// Returns the alias registered for this arm.
    pub fn device(self) -> DeviceAlias {
        match self {
            ArmRole::SingleChannel => FCA,
            ArmRole::MultiChannel => MCA,
            ArmRole::Gripper => RGA,
        }
    }
}
