//! Script document encoders.
//!
//! The controller's execution channel accepts commands as XML script
//! documents (`ScriptGroup` envelopes). The four LiHa documents below
//! reproduce the vendor schema byte for byte, including its uneven
//! indentation; the controller's deserializer is the compatibility contract
//! here, so nothing is "cleaned up". Gripper, movement and dialog documents
//! use the same envelope with their own command objects.
//!
//! Encoding is pure: the same descriptor always produces the same bytes.

use crate::constants::ROWS_96_WELL;
use crate::descriptor::{CommandDescriptor, OperationKind};
use crate::device::DeviceAlias;
use crate::error::{EncodeError, Result};
use crate::wells::{selected_wells_string, serialized_well_indexes};

/// Encodes a descriptor into the wire document for the execution channel.
pub fn encode(d: &CommandDescriptor) -> Result<String> {
    match d.kind {
        OperationKind::GetTips => get_tips_xml(d),
        OperationKind::DropTips => drop_tips_xml(d),
        OperationKind::Aspirate => pipetting_xml(d, PipettingDirection::Aspirate),
        OperationKind::Dispense => pipetting_xml(d, PipettingDirection::Dispense),
        OperationKind::MoveToPosition => move_to_position_xml(d),
        OperationKind::MoveToSafe => Ok(move_to_safe_xml(d)),
        OperationKind::GetLabware => get_labware_xml(d),
        OperationKind::PutLabware => put_labware_xml(d),
        OperationKind::GenericCommand => d.text.clone().ok_or(EncodeError::MissingField {
            operation: "GenericCommand",
            field: "content",
        }),
        OperationKind::UserPrompt => dialog_xml(d, "UserPrompt", "Text"),
        OperationKind::Subroutine => dialog_xml(d, "Subroutine", "SubroutineName"),
    }
}

fn require<'a>(
    value: &'a Option<String>,
    operation: &'static str,
    field: &'static str,
) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or(EncodeError::MissingField { operation, field })
}

fn tip_objects(tips: &[u32], indent: &str) -> String {
    tips.iter()
        .map(|i| format!("{indent}<Object Type=\"System.Int32\"><int>{i}</int></Object>"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn volume_objects(volumes: &[u32]) -> String {
    volumes
        .iter()
        .map(|v| {
            format!(
                "                            <Object Type=\"System.String\"><string>{v}</string></Object>"
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn get_tips_xml(d: &CommandDescriptor) -> Result<String> {
    let device = d.arm.device();
    let diti_type = require(&d.diti_type, "GetTips", "diti_type")?;
    let airgap_volume = d.airgap_volume.unwrap_or_default();
    let airgap_speed = d.airgap_speed.unwrap_or_default();
    let tips_xml = tip_objects(
        &d.tip_indices,
        "                                                ",
    );
    Ok(format!(
        r#"<ScriptGroup>
    <Objects>
        <Object Type="Tecan.Core.Instrument.Devices.LiHa.Scripting.LihaGetTipsScriptCommandDataV3">
            <LihaGetTipsScriptCommandDataV3>
                <Data Type="Tecan.Core.Instrument.Devices.LiHa.Scripting.LiHaScriptCommandUsingTipSelectionBaseDataV1">
                    <LiHaScriptCommandUsingTipSelectionBaseDataV1>
                        <SerializedTipsIndexes></SerializedTipsIndexes>
                        <SelectedTipsIndexes>
{tips_xml}
                        </SelectedTipsIndexes>
                        <TipMask></TipMask>
                        <TipOffset>0</TipOffset>
                        <TipSpacing>9</TipSpacing>
                        <Data Type="Tecan.Core.Instrument.Devices.LiHa.Scripting.LihaScriptCommandDataV1">
                            <LihaScriptCommandDataV1>
                                <Data Type="Tecan.Core.Instrument.Helpers.Scripting.ScriptCommandCommonDataV1">
                                    <ScriptCommandCommonDataV1>
                                        <LabwareName></LabwareName>
                                        <Data Type="Tecan.Core.Instrument.Helpers.Scripting.DeviceAliasStatementBaseDataV1">
                                            <DeviceAliasStatementBaseDataV1>
                                                <Alias Type="Tecan.Core.Instrument.DeviceAlias.DeviceAlias">
                                                    <DeviceAlias>{alias}</DeviceAlias>
                                                </Alias>
                                                <ID><AvailableID>{device_id}</AvailableID></ID>
                                                <Data Type="Tecan.Core.Scripting.Helpers.ScriptStatementBaseDataV1">
                                                    <ScriptStatementBaseDataV1>
                                                        <IsBreakpoint>False</IsBreakpoint>
                                                        <IsDisabledForExecution>False</IsDisabledForExecution>
                                                        <GroupLineNumber>0</GroupLineNumber>
                                                        <LineNumber>1</LineNumber>
                                                    </ScriptStatementBaseDataV1>
                                                </Data>
                                            </DeviceAliasStatementBaseDataV1>
                                        </Data>
                                    </ScriptCommandCommonDataV1>
                                </Data>
                            </LihaScriptCommandDataV1>
                        </Data>
                    </LiHaScriptCommandUsingTipSelectionBaseDataV1>
                </Data>
                <AirgapVolume>{airgap_volume}</AirgapVolume>
                <AirgapSpeed>{airgap_speed}</AirgapSpeed>
                <DitiType><AvailableID>{diti_type}</AvailableID></DitiType>
                <UseNextPosition>True</UseNextPosition>
            </LihaGetTipsScriptCommandDataV3>
        </Object>
    </Objects>
    <Name></Name>
    <IsBreakpoint>False</IsBreakpoint>
    <IsDisabledForExecution>False</IsDisabledForExecution>
    <LineNumber>0</LineNumber>
</ScriptGroup>"#,
        alias = device.alias,
        device_id = device.device_id,
    ))
}

fn drop_tips_xml(d: &CommandDescriptor) -> Result<String> {
    let device = d.arm.device();
    let labware = require(&d.labware, "DropTips", "labware")?;
    let tips_xml = tip_objects(&d.tip_indices, "                                            ");
    Ok(format!(
        r#"<ScriptGroup>
    <Objects>
        <Object Type="Tecan.Core.Instrument.Devices.LiHa.Scripting.LihaDropTipsScriptCommandDataV1">
            <LihaDropTipsScriptCommandDataV1>
                <Data Type="Tecan.Core.Instrument.Devices.LiHa.Scripting.LiHaScriptCommandUsingTipSelectionBaseDataV1">
                    <LiHaScriptCommandUsingTipSelectionBaseDataV1>
                        <SerializedTipsIndexes></SerializedTipsIndexes>
                        <SelectedTipsIndexes>
{tips_xml}
                        </SelectedTipsIndexes>
                        <TipMask></TipMask>
                        <TipOffset>0</TipOffset>
                        <TipSpacing>9</TipSpacing>
                        <Data Type="Tecan.Core.Instrument.Devices.LiHa.Scripting.LihaScriptCommandDataV1">
                            <LihaScriptCommandDataV1>
                                <Data Type="Tecan.Core.Instrument.Helpers.Scripting.ScriptCommandCommonDataV1">
                                    <ScriptCommandCommonDataV1>
                                        <LabwareName>{labware}</LabwareName>
                                        <Data Type="Tecan.Core.Instrument.Helpers.Scripting.DeviceAliasStatementBaseDataV1">
                                            <DeviceAliasStatementBaseDataV1>
                                                <Alias Type="Tecan.Core.Instrument.DeviceAlias.DeviceAlias">
                                                    <DeviceAlias>{alias}</DeviceAlias>
                                                </Alias>
                                                <ID><AvailableID>{device_id}</AvailableID></ID>
                                                <Data Type="Tecan.Core.Scripting.Helpers.ScriptStatementBaseDataV1">
                                                    <ScriptStatementBaseDataV1>
                                                        <IsBreakpoint>False</IsBreakpoint>
                                                        <IsDisabledForExecution>False</IsDisabledForExecution>
                                                        <GroupLineNumber>0</GroupLineNumber>
                                                        <LineNumber>4</LineNumber>
                                                    </ScriptStatementBaseDataV1>
                                                </Data>
                                            </DeviceAliasStatementBaseDataV1>
                                        </Data>
                                    </ScriptCommandCommonDataV1>
                                </Data>
                            </LihaScriptCommandDataV1>
                        </Data>
                    </LiHaScriptCommandUsingTipSelectionBaseDataV1>
                </Data>
            </LihaDropTipsScriptCommandDataV1>
        </Object>
    </Objects>
    <Name></Name>
    <IsBreakpoint>False</IsBreakpoint>
    <IsDisabledForExecution>False</IsDisabledForExecution>
    <LineNumber>0</LineNumber>
</ScriptGroup>"#,
        alias = device.alias,
        device_id = device.device_id,
    ))
}

enum PipettingDirection {
    Aspirate,
    Dispense,
}

fn pipetting_xml(d: &CommandDescriptor, direction: PipettingDirection) -> Result<String> {
    let device = d.arm.device();
    let operation = match direction {
        PipettingDirection::Aspirate => "Aspirate",
        PipettingDirection::Dispense => "Dispense",
    };
    let labware = require(&d.labware, operation, "labware")?;
    let liquid_class = require(&d.liquid_class, operation, "liquid_class")?;
    if d.volumes.is_empty() {
        return Err(EncodeError::NoVolumes(operation));
    }

    let volumes_xml = volume_objects(&d.volumes);
    let serialized_wells = serialized_well_indexes(&d.well_offsets);
    let selected_wells = selected_wells_string(&d.well_offsets, ROWS_96_WELL);
    let well_offset = d.well_offsets.first().copied().unwrap_or(0);
    let tips_xml = tip_objects(&d.tip_indices, "                                            ");

    // V5/V6 wrap the same V7 pipetting payload; only the outer object and a
    // few leading fields differ.
    let (header, trailer, line_number) = match direction {
        PipettingDirection::Aspirate => (
            "        <Object Type=\"Tecan.Core.Instrument.Devices.LiHa.Scripting.LihaAspirateScriptCommandDataV5\">\n            <LihaAspirateScriptCommandDataV5>\n                <IsSwitchContainerSourceEnabled>False</IsSwitchContainerSourceEnabled>\n                <OffsetX>0</OffsetX>\n                <OffsetY>0</OffsetY>",
            "            </LihaAspirateScriptCommandDataV5>",
            2,
        ),
        PipettingDirection::Dispense => (
            "        <Object Type=\"Tecan.Core.Instrument.Devices.LiHa.Scripting.LihaDispenseScriptCommandDataV6\">\n            <LihaDispenseScriptCommandDataV6>\n                <OffsetX>0</OffsetX>\n                <OffsetY>0</OffsetY>\n                <SkipZOnlyMoveToPipettingPosition>False</SkipZOnlyMoveToPipettingPosition>\n                <DispenseDelays />",
            "            </LihaDispenseScriptCommandDataV6>",
            3,
        ),
    };

    Ok(format!(
        r#"<ScriptGroup>
    <Objects>
{header}
                <Data Type="Tecan.Core.Instrument.Devices.Scripting.Data.LihaPipettingWithVolumesScriptCommandDataV7">
                    <LihaPipettingWithVolumesScriptCommandDataV7>
                        <Volumes>
{volumes_xml}
                        </Volumes>
                        <FlowRates />
                        <IsLiquidClassNameByExpressionEnabled>False</IsLiquidClassNameByExpressionEnabled>
                        <LiquidClassSelectionMode>
                            <LiquidClassSelectionMode>SingleByName</LiquidClassSelectionMode>
                        </LiquidClassSelectionMode>
                        <LiquidClassNameBySelection>{liquid_class}</LiquidClassNameBySelection>
                        <LiquidClassNameByExpression></LiquidClassNameByExpression>
                        <LiquidClassNames />
                        <Compartment>1</Compartment>
                        <Data Type="Tecan.Core.Instrument.Devices.LiHa.Scripting.LihaScriptCommandUsingWellSelectionBaseDataV1">
                            <LihaScriptCommandUsingWellSelectionBaseDataV1>
                                <SerializedWellIndexes>{serialized_wells}</SerializedWellIndexes>
                                <SelectedWellsString>{selected_wells}</SelectedWellsString>
                                <WellOffset>{well_offset}</WellOffset>
                                <Data Type="Tecan.Core.Instrument.Devices.LiHa.Scripting.LiHaScriptCommandUsingTipSelectionBaseDataV1">
                                    <LiHaScriptCommandUsingTipSelectionBaseDataV1>
                                        <SerializedTipsIndexes></SerializedTipsIndexes>
                                        <SelectedTipsIndexes>
{tips_xml}
                                        </SelectedTipsIndexes>
                                        <TipMask></TipMask>
                                        <TipOffset>0</TipOffset>
                                        <TipSpacing>0</TipSpacing>
                                        <Data Type="Tecan.Core.Instrument.Devices.LiHa.Scripting.LihaScriptCommandDataV1">
                                            <LihaScriptCommandDataV1>
                                                <Data Type="Tecan.Core.Instrument.Helpers.Scripting.ScriptCommandCommonDataV2">
                                                    <ScriptCommandCommonDataV2>
                                                        <LabwareName>{labware}</LabwareName>
                                                        <LiquidClassVariablesNames />
                                                        <LiquidClassVariablesValues />
                                                        <Data Type="Tecan.Core.Instrument.Helpers.Scripting.DeviceAliasStatementBaseDataV1">
                                                            <DeviceAliasStatementBaseDataV1>
                                                                <Alias Type="Tecan.Core.Instrument.DeviceAlias.DeviceAlias">
                                                                    <DeviceAlias>{alias}</DeviceAlias>
                                                                </Alias>
                                                                <ID>
                                                                    <AvailableID>{device_id}</AvailableID>
                                                                </ID>
                                                                <Data Type="Tecan.Core.Scripting.Helpers.ScriptStatementBaseDataV1">
                                                                    <ScriptStatementBaseDataV1>
                                                                        <IsBreakpoint>False</IsBreakpoint>
                                                                        <IsDisabledForExecution>False</IsDisabledForExecution>
                                                                        <GroupLineNumber>0</GroupLineNumber>
                                                                        <LineNumber>{line_number}</LineNumber>
                                                                    </ScriptStatementBaseDataV1>
                                                                </Data>
                                                            </DeviceAliasStatementBaseDataV1>
                                                        </Data>
                                                    </ScriptCommandCommonDataV2>
                                                </Data>
                                            </LihaScriptCommandDataV1>
                                        </Data>
                                    </LiHaScriptCommandUsingTipSelectionBaseDataV1>
                                </Data>
                            </LihaScriptCommandUsingWellSelectionBaseDataV1>
                        </Data>
                    </LihaPipettingWithVolumesScriptCommandDataV7>
                </Data>
{trailer}
        </Object>
    </Objects>
    <Name></Name>
    <IsBreakpoint>False</IsBreakpoint>
    <IsDisabledForExecution>False</IsDisabledForExecution>
    <LineNumber>0</LineNumber>
</ScriptGroup>"#,
        alias = device.alias,
        device_id = device.device_id,
    ))
}

fn move_to_position_xml(d: &CommandDescriptor) -> Result<String> {
    let device = d.arm.device();
    let labware = require(&d.labware, "MoveToPosition", "labware")?;
    let well_offset = d.well_offsets.first().copied().unwrap_or(0);
    let z_xml = match d.z_position {
        Some(z) => format!("<ZPosition>{z}</ZPosition>"),
        None => "<UseZTravelHeight>True</UseZTravelHeight>".to_string(),
    };
    let tips_xml = tip_objects(&d.tip_indices, "                            ");
    Ok(format!(
        r#"<ScriptGroup>
    <Objects>
        <Object Type="Tecan.Core.Instrument.Devices.LiHa.Scripting.LihaMoveToPositionScriptCommandDataV1">
            <LihaMoveToPositionScriptCommandDataV1>
                <LabwareName>{labware}</LabwareName>
                <WellOffset>{well_offset}</WellOffset>
                {z_xml}
                <SelectedTipsIndexes>
{tips_xml}
                </SelectedTipsIndexes>
                <Alias Type="Tecan.Core.Instrument.DeviceAlias.DeviceAlias">
                    <DeviceAlias>{alias}</DeviceAlias>
                </Alias>
            </LihaMoveToPositionScriptCommandDataV1>
        </Object>
    </Objects>
    <Name></Name>
    <IsBreakpoint>False</IsBreakpoint>
    <IsDisabledForExecution>False</IsDisabledForExecution>
    <LineNumber>0</LineNumber>
</ScriptGroup>"#,
        alias = device.alias,
    ))
}

fn move_to_safe_xml(d: &CommandDescriptor) -> String {
    let device = d.arm.device();
    format!(
        r#"<ScriptGroup>
    <Objects>
        <Object Type="Tecan.Core.Instrument.Scripting.MoveToSafePositionScriptCommandDataV1">
            <MoveToSafePositionScriptCommandDataV1>
                <Alias Type="Tecan.Core.Instrument.DeviceAlias.DeviceAlias">
                    <DeviceAlias>{alias}</DeviceAlias>
                </Alias>
            </MoveToSafePositionScriptCommandDataV1>
        </Object>
    </Objects>
    <Name></Name>
    <IsBreakpoint>False</IsBreakpoint>
    <IsDisabledForExecution>False</IsDisabledForExecution>
    <LineNumber>0</LineNumber>
</ScriptGroup>"#,
        alias = device.alias,
    )
}

fn get_labware_xml(d: &CommandDescriptor) -> Result<String> {
    let device = d.arm.device();
    let labware = require(&d.labware, "GetLabware", "labware")?;
    let grip_force = d.grip_force.unwrap_or_default();
    let grip_width_xml = match d.grip_width {
        Some(w) => format!("<GripWidth>{w}</GripWidth>"),
        None => "<AutoGripWidth>True</AutoGripWidth>".to_string(),
    };
    Ok(format!(
        r#"<ScriptGroup>
    <Objects>
        <Object Type="Tecan.Core.Instrument.Devices.RoMa.Scripting.RomaGetLabwareScriptCommandDataV1">
            <RomaGetLabwareScriptCommandDataV1>
                <LabwareName>{labware}</LabwareName>
                <GripForce>{grip_force}</GripForce>
                {grip_width_xml}
                <Alias Type="Tecan.Core.Instrument.DeviceAlias.DeviceAlias">
                    <DeviceAlias>{alias}</DeviceAlias>
                </Alias>
            </RomaGetLabwareScriptCommandDataV1>
        </Object>
    </Objects>
    <Name></Name>
    <IsBreakpoint>False</IsBreakpoint>
    <IsDisabledForExecution>False</IsDisabledForExecution>
    <LineNumber>0</LineNumber>
</ScriptGroup>"#,
        alias = device.alias,
    ))
}

fn put_labware_xml(d: &CommandDescriptor) -> Result<String> {
    let device = d.arm.device();
    let labware = require(&d.labware, "PutLabware", "labware")?;
    let target = require(&d.target, "PutLabware", "target")?;
    Ok(format!(
        r#"<ScriptGroup>
    <Objects>
        <Object Type="Tecan.Core.Instrument.Devices.RoMa.Scripting.RomaPutLabwareScriptCommandDataV1">
            <RomaPutLabwareScriptCommandDataV1>
                <LabwareName>{labware}</LabwareName>
                <TargetLocation>{target}</TargetLocation>
                <Alias Type="Tecan.Core.Instrument.DeviceAlias.DeviceAlias">
                    <DeviceAlias>{alias}</DeviceAlias>
                </Alias>
            </RomaPutLabwareScriptCommandDataV1>
        </Object>
    </Objects>
    <Name></Name>
    <IsBreakpoint>False</IsBreakpoint>
    <IsDisabledForExecution>False</IsDisabledForExecution>
    <LineNumber>0</LineNumber>
</ScriptGroup>"#,
        alias = device.alias,
    ))
}

fn dialog_xml(d: &CommandDescriptor, object: &'static str, field: &str) -> Result<String> {
    let text = require(&d.text, object, "text")?;
    Ok(format!(
        r#"<ScriptGroup>
    <Objects>
        <Object Type="Tecan.Core.Scripting.{object}ScriptCommandDataV1">
            <{object}ScriptCommandDataV1>
                <{field}>{text}</{field}>
            </{object}ScriptCommandDataV1>
        </Object>
    </Objects>
    <Name></Name>
    <IsBreakpoint>False</IsBreakpoint>
    <IsDisabledForExecution>False</IsDisabledForExecution>
    <LineNumber>0</LineNumber>
</ScriptGroup>"#,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PipettingParams;
    use crate::device::ArmRole;

    fn aspirate(volumes: Vec<u32>, params: PipettingParams) -> CommandDescriptor {
        CommandDescriptor::aspirate(ArmRole::SingleChannel, "Plate_1", volumes, params).unwrap()
    }

    #[test]
    fn encoding_is_deterministic() {
        let d = aspirate(vec![50, 50], PipettingParams::new());
        assert_eq!(encode(&d).unwrap(), encode(&d).unwrap());
    }

    #[test]
    fn single_well_uses_count_form() {
        let d = aspirate(vec![50], PipettingParams::new().wells(0u32));
        let xml = encode(&d).unwrap();
        assert!(xml.contains("<SerializedWellIndexes>0;</SerializedWellIndexes>"));
        assert!(xml.contains("<SelectedWellsString>1 * A1</SelectedWellsString>"));
    }

    #[test]
    fn distinct_wells_join_names() {
        let d = aspirate(
            vec![50, 50, 50],
            PipettingParams::new().wells(vec![0, 1, 2]),
        );
        let xml = encode(&d).unwrap();
        assert!(xml.contains("<SerializedWellIndexes>0;1;2;</SerializedWellIndexes>"));
        assert!(xml.contains("<SelectedWellsString>A1;B1;C1</SelectedWellsString>"));
    }

    #[test]
    fn aspirate_envelope_matches_vendor_schema() {
        let d = aspirate(vec![100], PipettingParams::new().liquid_class("Water Free Single"));
        let xml = encode(&d).unwrap();
        assert!(xml.starts_with("<ScriptGroup>"));
        assert!(xml.ends_with("</ScriptGroup>"));
        assert!(xml.contains("LihaAspirateScriptCommandDataV5"));
        assert!(xml.contains("LihaPipettingWithVolumesScriptCommandDataV7"));
        assert!(
            xml.contains("<LiquidClassNameBySelection>Water Free Single</LiquidClassNameBySelection>")
        );
        assert!(xml.contains("<Object Type=\"System.String\"><string>100</string></Object>"));
        assert!(xml.contains("<TipSpacing>0</TipSpacing>"));
        assert!(xml.contains("<LineNumber>2</LineNumber>"));
        assert!(xml.contains("<DeviceAlias>Instrument=1/Device=LIHA:1</DeviceAlias>"));
        assert!(xml.contains("<AvailableID>USB:TECAN,MYRIUS,1310005667/LIHA:1</AvailableID>"));
    }

    #[test]
    fn dispense_envelope_matches_vendor_schema() {
        let d = CommandDescriptor::dispense(
            ArmRole::SingleChannel,
            "Plate_2",
            vec![25, 25],
            PipettingParams::new(),
        )
        .unwrap();
        let xml = encode(&d).unwrap();
        assert!(xml.contains("LihaDispenseScriptCommandDataV6"));
        assert!(xml.contains("<SkipZOnlyMoveToPipettingPosition>False</SkipZOnlyMoveToPipettingPosition>"));
        assert!(xml.contains("<LabwareName>Plate_2</LabwareName>"));
        assert!(xml.contains("<LineNumber>3</LineNumber>"));
    }

    #[test]
    fn get_tips_lists_selected_tips() {
        let d = CommandDescriptor::get_tips(
            ArmRole::SingleChannel,
            "TOOLTYPE:LiHa.TecanDiTi/TOOLNAME:FCA, 200ul",
            None,
            None,
            Some(vec![0, 1, 2, 3]),
        );
        let xml = encode(&d).unwrap();
        assert!(xml.contains("LihaGetTipsScriptCommandDataV3"));
        assert_eq!(xml.matches("<Object Type=\"System.Int32\">").count(), 4);
        assert!(xml.contains("<TipSpacing>9</TipSpacing>"));
        assert!(xml.contains("<AirgapVolume>10</AirgapVolume>"));
        assert!(xml.contains("<AirgapSpeed>70</AirgapSpeed>"));
        assert!(xml.contains(
            "<DitiType><AvailableID>TOOLTYPE:LiHa.TecanDiTi/TOOLNAME:FCA, 200ul</AvailableID></DitiType>"
        ));
        assert!(xml.contains("<LineNumber>1</LineNumber>"));
    }

    #[test]
    fn drop_tips_targets_waste_labware() {
        let d = CommandDescriptor::drop_tips(
            ArmRole::SingleChannel,
            "FCA Thru Deck Waste Chute_1",
            None,
        );
        let xml = encode(&d).unwrap();
        assert!(xml.contains("LihaDropTipsScriptCommandDataV1"));
        assert!(xml.contains("<LabwareName>FCA Thru Deck Waste Chute_1</LabwareName>"));
        assert_eq!(xml.matches("<Object Type=\"System.Int32\">").count(), 8);
        assert!(xml.contains("<LineNumber>4</LineNumber>"));
    }

    #[test]
    fn mca_pipetting_uses_mca_alias() {
        let d = CommandDescriptor::aspirate(
            ArmRole::MultiChannel,
            "MCA Plate",
            vec![30],
            PipettingParams::new().tips(vec![0]),
        )
        .unwrap();
        let xml = encode(&d).unwrap();
        assert!(xml.contains("<DeviceAlias>Instrument=1/Device=MCA96:1</DeviceAlias>"));
    }

    #[test]
    fn gripper_documents_carry_grip_parameters() {
        let d = CommandDescriptor::get_labware("Plate_3", Some(7), None);
        let xml = encode(&d).unwrap();
        assert!(xml.contains("RomaGetLabwareScriptCommandDataV1"));
        assert!(xml.contains("<GripForce>7</GripForce>"));
        assert!(xml.contains("<AutoGripWidth>True</AutoGripWidth>"));
        assert!(xml.contains("<DeviceAlias>Instrument=1/Device=RGA:1</DeviceAlias>"));

        let d = CommandDescriptor::put_labware("Plate_3", "Nest_2");
        let xml = encode(&d).unwrap();
        assert!(xml.contains("RomaPutLabwareScriptCommandDataV1"));
        assert!(xml.contains("<TargetLocation>Nest_2</TargetLocation>"));
    }

    #[test]
    fn generic_command_passes_content_through() {
        let d = CommandDescriptor::generic_command("<CustomCommand />");
        assert_eq!(encode(&d).unwrap(), "<CustomCommand />");
    }

    #[test]
    fn prompt_and_subroutine_wrap_text() {
        let d = CommandDescriptor::user_prompt("Load the plate");
        let xml = encode(&d).unwrap();
        assert!(xml.contains("<Text>Load the plate</Text>"));

        let d = CommandDescriptor::subroutine("Wash_Tips");
        let xml = encode(&d).unwrap();
        assert!(xml.contains("<SubroutineName>Wash_Tips</SubroutineName>"));
    }

    #[test]
    fn missing_required_field_is_reported() {
        let mut d = CommandDescriptor::user_prompt("x");
        d.text = None;
        assert!(matches!(
            encode(&d),
            Err(EncodeError::MissingField { .. })
        ));
    }
}
