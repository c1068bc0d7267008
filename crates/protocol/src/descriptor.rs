//! Command descriptors - the validated, normalized form of an operation.
//!
//! A [`CommandDescriptor`] is built once from caller input and never mutated
//! afterwards. Normalization (scalar broadcast, defaulting, length checks)
//! happens in the constructors so the encoder in [`crate::script`] can assume
//! the per-tip lists are consistent.

use crate::constants::{
    DEFAULT_AIRGAP_SPEED, DEFAULT_AIRGAP_VOLUME, DEFAULT_GRIP_FORCE, FCA_TIP_COUNT,
};
use crate::device::ArmRole;
use crate::error::{EncodeError, Result};
use serde::{Deserialize, Serialize};

/// A parameter that accepts either a single value (applied to every tip) or
/// an explicit per-tip list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// One value, broadcast across all tips.
    One(T),
    /// One value per tip.
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    /// Expands to a list of `n` entries, broadcasting a scalar.
    ///
    /// An explicit list must already have exactly `n` entries.
    pub fn broadcast(self, n: usize, field: &'static str) -> Result<Vec<T>> {
        match self {
            OneOrMany::One(value) => Ok(vec![value; n]),
            OneOrMany::Many(values) if values.len() == n => Ok(values),
            OneOrMany::Many(values) => Err(EncodeError::LengthMismatch {
                field,
                expected: n,
                actual: values.len(),
            }),
        }
    }

    /// Number of explicit entries, or `None` for a scalar.
    pub fn explicit_len(&self) -> Option<usize> {
        match self {
            OneOrMany::One(_) => None,
            OneOrMany::Many(values) => Some(values.len()),
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        OneOrMany::One(value)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

/// The operations the controller's channel API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    GetTips,
    DropTips,
    Aspirate,
    Dispense,
    MoveToPosition,
    MoveToSafe,
    GetLabware,
    PutLabware,
    GenericCommand,
    UserPrompt,
    Subroutine,
}

impl OperationKind {
    /// Display name used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            OperationKind::GetTips => "GetTips",
            OperationKind::DropTips => "DropTips",
            OperationKind::Aspirate => "Aspirate",
            OperationKind::Dispense => "Dispense",
            OperationKind::MoveToPosition => "MoveToPosition",
            OperationKind::MoveToSafe => "MoveToSafe",
            OperationKind::GetLabware => "GetLabware",
            OperationKind::PutLabware => "PutLabware",
            OperationKind::GenericCommand => "GenericCommand",
            OperationKind::UserPrompt => "UserPrompt",
            OperationKind::Subroutine => "Subroutine",
        }
    }
}

/// Optional parameters for aspirate/dispense.
#[derive(Debug, Clone, Default)]
pub struct PipettingParams {
    /// Liquid class name. Defaults to [`crate::constants::DEFAULT_LIQUID_CLASS`].
    pub liquid_class: Option<String>,
    /// Target well offsets, scalar or per-tip. Defaults to well 0 for every tip.
    pub wells: Option<OneOrMany<u32>>,
    /// Tip indices to use. Defaults to `0..n` for `n` volumes.
    pub tips: Option<Vec<u32>>,
}

impl PipettingParams {
    /// Creates new default params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the liquid class.
    pub fn liquid_class(mut self, liquid_class: impl Into<String>) -> Self {
        self.liquid_class = Some(liquid_class.into());
        self
    }

    /// Sets the target wells (scalar or per-tip).
    pub fn wells(mut self, wells: impl Into<OneOrMany<u32>>) -> Self {
        self.wells = Some(wells.into());
        self
    }

    /// Sets the tip indices.
    pub fn tips(mut self, tips: Vec<u32>) -> Self {
        self.tips = Some(tips);
        self
    }
}

/// A fully normalized command, ready for encoding.
///
/// Fields that do not apply to the operation kind are left empty/`None`;
/// the constructors guarantee the fields the encoder needs are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub kind: OperationKind,
    pub arm: ArmRole,
    pub labware: Option<String>,
    pub volumes: Vec<u32>,
    pub well_offsets: Vec<u32>,
    pub tip_indices: Vec<u32>,
    pub liquid_class: Option<String>,
    pub diti_type: Option<String>,
    pub airgap_volume: Option<u32>,
    pub airgap_speed: Option<u32>,
    pub z_position: Option<f64>,
    pub grip_force: Option<u32>,
    pub grip_width: Option<f64>,
    pub target: Option<String>,
    pub text: Option<String>,
}

impl CommandDescriptor {
    fn empty(kind: OperationKind, arm: ArmRole) -> Self {
        Self {
            kind,
            arm,
            labware: None,
            volumes: Vec::new(),
            well_offsets: Vec::new(),
            tip_indices: Vec::new(),
            liquid_class: None,
            diti_type: None,
            airgap_volume: None,
            airgap_speed: None,
            z_position: None,
            grip_force: None,
            grip_width: None,
            target: None,
            text: None,
        }
    }

    /// Pick up disposable tips.
    ///
    /// `tips` defaults to all 8 channels on the single-channel arm; the
    /// 96-channel arm picks up its full head and carries no tip selection.
    pub fn get_tips(
        arm: ArmRole,
        diti_type: impl Into<String>,
        airgap_volume: Option<u32>,
        airgap_speed: Option<u32>,
        tips: Option<Vec<u32>>,
    ) -> Self {
        let mut d = Self::empty(OperationKind::GetTips, arm);
        d.diti_type = Some(diti_type.into());
        d.airgap_volume = Some(airgap_volume.unwrap_or(DEFAULT_AIRGAP_VOLUME));
        d.airgap_speed = Some(airgap_speed.unwrap_or(DEFAULT_AIRGAP_SPEED));
        d.tip_indices = match (arm, tips) {
            (ArmRole::MultiChannel, _) => Vec::new(),
            (_, Some(tips)) => tips,
            (_, None) => (0..FCA_TIP_COUNT as u32).collect(),
        };
        d
    }

    /// Drop tips at a waste location.
    pub fn drop_tips(arm: ArmRole, labware: impl Into<String>, tips: Option<Vec<u32>>) -> Self {
        let mut d = Self::empty(OperationKind::DropTips, arm);
        d.labware = Some(labware.into());
        d.tip_indices = match (arm, tips) {
            (ArmRole::MultiChannel, _) => Vec::new(),
            (_, Some(tips)) => tips,
            (_, None) => (0..FCA_TIP_COUNT as u32).collect(),
        };
        d
    }

    /// Aspirate liquid. The volume list defines how many tips take part.
    pub fn aspirate(
        arm: ArmRole,
        labware: impl Into<String>,
        volumes: impl Into<OneOrMany<u32>>,
        params: PipettingParams,
    ) -> Result<Self> {
        Self::pipetting(OperationKind::Aspirate, arm, labware, volumes, params)
    }

    /// Dispense liquid. Normalization matches [`Self::aspirate`].
    pub fn dispense(
        arm: ArmRole,
        labware: impl Into<String>,
        volumes: impl Into<OneOrMany<u32>>,
        params: PipettingParams,
    ) -> Result<Self> {
        Self::pipetting(OperationKind::Dispense, arm, labware, volumes, params)
    }

    fn pipetting(
        kind: OperationKind,
        arm: ArmRole,
        labware: impl Into<String>,
        volumes: impl Into<OneOrMany<u32>>,
        params: PipettingParams,
    ) -> Result<Self> {
        // A scalar volume means one tip unless the well list says otherwise.
        let volumes = volumes.into();
        let n = match volumes.explicit_len() {
            Some(n) => n,
            None => params
                .wells
                .as_ref()
                .and_then(|w| w.explicit_len())
                .unwrap_or(1),
        };
        if n == 0 {
            return Err(EncodeError::NoVolumes(kind.name()));
        }
        let volumes = volumes.broadcast(n, "volumes")?;
        let well_offsets = match params.wells {
            Some(wells) => wells.broadcast(n, "well_offsets")?,
            None => vec![0; n],
        };
        let tip_indices = match params.tips {
            Some(tips) if tips.len() == n => tips,
            Some(tips) => {
                return Err(EncodeError::LengthMismatch {
                    field: "tip_indices",
                    expected: n,
                    actual: tips.len(),
                });
            }
            None => (0..n as u32).collect(),
        };

        let mut d = Self::empty(kind, arm);
        d.labware = Some(labware.into());
        d.volumes = volumes;
        d.well_offsets = well_offsets;
        d.tip_indices = tip_indices;
        d.liquid_class = Some(
            params
                .liquid_class
                .unwrap_or_else(|| crate::constants::DEFAULT_LIQUID_CLASS.to_string()),
        );
        Ok(d)
    }

    /// Move an arm above a labware position.
    pub fn move_to_position(
        arm: ArmRole,
        labware: impl Into<String>,
        well_offset: u32,
        z_position: Option<f64>,
        tips: Option<Vec<u32>>,
    ) -> Self {
        let mut d = Self::empty(OperationKind::MoveToPosition, arm);
        d.labware = Some(labware.into());
        d.well_offsets = vec![well_offset];
        d.z_position = z_position;
        d.tip_indices = tips.unwrap_or_else(|| (0..FCA_TIP_COUNT as u32).collect());
        d
    }

    /// Move an arm to its safe/home position.
    pub fn move_to_safe(arm: ArmRole) -> Self {
        Self::empty(OperationKind::MoveToSafe, arm)
    }

    /// Pick up labware with the gripper.
    pub fn get_labware(
        labware: impl Into<String>,
        grip_force: Option<u32>,
        grip_width: Option<f64>,
    ) -> Self {
        let mut d = Self::empty(OperationKind::GetLabware, ArmRole::Gripper);
        d.labware = Some(labware.into());
        d.grip_force = Some(grip_force.unwrap_or(DEFAULT_GRIP_FORCE));
        d.grip_width = grip_width;
        d
    }

    /// Place held labware at a target location.
    pub fn put_labware(labware: impl Into<String>, target: impl Into<String>) -> Self {
        let mut d = Self::empty(OperationKind::PutLabware, ArmRole::Gripper);
        d.labware = Some(labware.into());
        d.target = Some(target.into());
        d
    }

    /// Pass raw command content through to the controller.
    pub fn generic_command(content: impl Into<String>) -> Self {
        let mut d = Self::empty(OperationKind::GenericCommand, ArmRole::SingleChannel);
        d.text = Some(content.into());
        d
    }

    /// Show a prompt dialog to the operator.
    pub fn user_prompt(text: impl Into<String>) -> Self {
        let mut d = Self::empty(OperationKind::UserPrompt, ArmRole::SingleChannel);
        d.text = Some(text.into());
        d
    }

    /// Run a named method subroutine.
    pub fn subroutine(name: impl Into<String>) -> Self {
        let mut d = Self::empty(OperationKind::Subroutine, ArmRole::SingleChannel);
        d.text = Some(name.into());
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_volume_equals_single_entry_list() {
        let a = CommandDescriptor::aspirate(
            ArmRole::SingleChannel,
            "Plate_1",
            50u32,
            PipettingParams::new(),
        )
        .unwrap();
        let b = CommandDescriptor::aspirate(
            ArmRole::SingleChannel,
            "Plate_1",
            vec![50u32],
            PipettingParams::new(),
        )
        .unwrap();
        assert_eq!(a.volumes, b.volumes);
        assert_eq!(a.well_offsets, b.well_offsets);
        assert_eq!(a.tip_indices, b.tip_indices);
    }

    #[test]
    fn scalar_volume_broadcasts_over_well_list() {
        let d = CommandDescriptor::aspirate(
            ArmRole::SingleChannel,
            "Plate_1",
            50u32,
            PipettingParams::new().wells(vec![0, 1, 2]),
        )
        .unwrap();
        assert_eq!(d.volumes, vec![50, 50, 50]);
        assert_eq!(d.well_offsets, vec![0, 1, 2]);
        assert_eq!(d.tip_indices, vec![0, 1, 2]);
    }

    #[test]
    fn scalar_well_broadcasts_over_volumes() {
        let d = CommandDescriptor::dispense(
            ArmRole::SingleChannel,
            "Plate_1",
            vec![10, 20, 30],
            PipettingParams::new().wells(5u32),
        )
        .unwrap();
        assert_eq!(d.well_offsets, vec![5, 5, 5]);
    }

    #[test]
    fn wells_default_to_zero_per_tip() {
        let d = CommandDescriptor::aspirate(
            ArmRole::SingleChannel,
            "Trough_1",
            vec![100, 100],
            PipettingParams::new(),
        )
        .unwrap();
        assert_eq!(d.well_offsets, vec![0, 0]);
    }

    #[test]
    fn mismatched_well_list_is_rejected() {
        let err = CommandDescriptor::aspirate(
            ArmRole::SingleChannel,
            "Plate_1",
            vec![10, 20],
            PipettingParams::new().wells(vec![0, 1, 2]),
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::LengthMismatch { .. }));
    }

    #[test]
    fn mismatched_tip_list_is_rejected() {
        let err = CommandDescriptor::dispense(
            ArmRole::SingleChannel,
            "Plate_1",
            vec![10, 20],
            PipettingParams::new().tips(vec![0]),
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::LengthMismatch { .. }));
    }

    #[test]
    fn empty_volume_list_is_rejected() {
        let err = CommandDescriptor::aspirate(
            ArmRole::SingleChannel,
            "Plate_1",
            Vec::<u32>::new(),
            PipettingParams::new(),
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::NoVolumes(_)));
    }

    #[test]
    fn get_tips_defaults_to_all_eight() {
        let d = CommandDescriptor::get_tips(
            ArmRole::SingleChannel,
            "TOOLTYPE:LiHa.TecanDiTi/TOOLNAME:FCA, 200ul",
            None,
            None,
            None,
        );
        assert_eq!(d.tip_indices, (0..8).collect::<Vec<u32>>());
        assert_eq!(d.airgap_volume, Some(10));
        assert_eq!(d.airgap_speed, Some(70));
    }

    #[test]
    fn mca_ops_carry_no_tip_selection() {
        let d = CommandDescriptor::get_tips(ArmRole::MultiChannel, "x", None, None, Some(vec![0]));
        assert!(d.tip_indices.is_empty());
    }

    #[test]
    fn one_or_many_accepts_scalar_and_list_json() {
        let one: OneOrMany<u32> = serde_json::from_str("50").unwrap();
        assert!(matches!(one, OneOrMany::One(50)));
        let many: OneOrMany<u32> = serde_json::from_str("[50, 60]").unwrap();
        assert_eq!(many.explicit_len(), Some(2));
    }

    #[test]
    fn default_liquid_class_applied() {
        let d = CommandDescriptor::aspirate(
            ArmRole::SingleChannel,
            "Plate_1",
            50u32,
            PipettingParams::new(),
        )
        .unwrap();
        assert_eq!(d.liquid_class.as_deref(), Some("Water Free Single"));
    }
}
