//! High-level API flows against the scripted controller.

use fluent::runtime::testing::{SimulatedChannel, SimulatedController};
use fluent::{ArmRole, ConnectOptions, Error, Fluent, PipettingParams, SessionState, SessionTiming};
use std::sync::Arc;
use std::time::Duration;

async fn connected(controller: &Arc<SimulatedController>) -> Fluent {
    let options = ConnectOptions::simulation()
        .timing(SessionTiming::fast())
        .channel_budget(Duration::from_millis(500));
    Fluent::connect(controller.clone(), options)
        .await
        .expect("connect")
}

async fn running(controller: &Arc<SimulatedController>) -> (Fluent, Arc<SimulatedChannel>) {
    let instrument = connected(controller).await;
    instrument.run_method("pyfluent_method").await.unwrap();
    let channel = SimulatedChannel::new(1);
    controller.runtime().set_channel(channel.clone(), 0);
    assert!(instrument.wait_for_channel().await.unwrap());
    (instrument, channel)
}

#[tokio::test]
async fn connect_run_and_inspect() {
    let controller = SimulatedController::new();
    controller.runtime().set_methods(vec!["pyfluent_method".into()]);
    let instrument = connected(&controller).await;

    assert!(instrument.is_simulation());
    assert_eq!(instrument.state(), SessionState::EditMode);
    assert_eq!(
        instrument.available_methods().await.unwrap(),
        vec!["pyfluent_method".to_string()]
    );

    assert!(instrument.run_method("pyfluent_method").await.unwrap());
    assert_eq!(instrument.state(), SessionState::Running);
    assert_eq!(instrument.status().await.unwrap(), 12);
}

#[tokio::test]
async fn worktable_commands_reach_the_channel() {
    let controller = SimulatedController::new();
    let (instrument, channel) = running(&controller).await;

    instrument.get_tips(None, None).await.unwrap();
    instrument
        .aspirate("Samples", vec![50; 8], PipettingParams::new())
        .await
        .unwrap();
    instrument
        .dispense("Plate_1", vec![50; 8], PipettingParams::new())
        .await
        .unwrap();
    instrument.drop_tips(None, None).await.unwrap();

    let executed = channel.executed();
    assert_eq!(executed.len(), 4);
    assert!(executed[0].contains("LihaGetTipsScriptCommandDataV3"));
    assert!(executed[0].contains("TOOLNAME:FCA, 200ul"));
    assert!(executed[1].contains("LihaAspirateScriptCommandDataV5"));
    assert!(executed[1].contains("Samples"));
    assert!(executed[2].contains("LihaDispenseScriptCommandDataV6"));
    assert!(executed[3].contains("LihaDropTipsScriptCommandDataV1"));
    assert!(executed[3].contains("FCA Thru Deck Waste Chute_1"));
}

#[tokio::test]
async fn mca_commands_use_the_96_channel_device() {
    let controller = SimulatedController::new();
    let (instrument, channel) = running(&controller).await;

    instrument.mca_get_tips(None).await.unwrap();
    instrument.mca_drop_tips(None).await.unwrap();

    let executed = channel.executed();
    assert!(executed[0].contains("Instrument=1/Device=MCA96:1"));
    assert!(executed[0].contains("TOOLNAME:MCA, 150ul Filtered SBS"));
    assert!(executed[1].contains("MCA Thru Deck Waste Chute with Tip Drop Guide_2"));
}

#[tokio::test]
async fn labware_transfer_is_get_then_put() {
    let controller = SimulatedController::new();
    let (instrument, channel) = running(&controller).await;

    instrument
        .transfer_labware("Plate_1", "Nest7mm_Pos_1", None, None)
        .await
        .unwrap();

    let executed = channel.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].contains("RomaGetLabwareScriptCommandDataV1"));
    assert!(executed[1].contains("RomaPutLabwareScriptCommandDataV1"));
    assert!(executed[1].contains("Nest7mm_Pos_1"));
}

#[tokio::test]
async fn move_all_arms_skips_failing_arms() {
    let controller = SimulatedController::new();
    let (instrument, channel) = running(&controller).await;

    // The first move is refused, the other arms still get theirs.
    channel.reject_next("no such device");
    instrument.move_all_arms_to_safe().await.unwrap();
    assert_eq!(channel.executed().len(), 2);
}

#[tokio::test]
async fn dialogs_and_subroutines_carry_their_text() {
    let controller = SimulatedController::new();
    let (instrument, channel) = running(&controller).await;

    instrument.user_prompt("Load the plate").await.unwrap();
    instrument.run_subroutine("Wash Tips").await.unwrap();
    instrument.generic_command("<Raw />").await.unwrap();

    let executed = channel.executed();
    assert!(executed[0].contains("Load the plate"));
    assert!(executed[1].contains("Wash Tips"));
    assert_eq!(executed[2], "<Raw />");
}

#[tokio::test]
async fn worktable_commands_without_a_run_fail() {
    let controller = SimulatedController::new();
    let instrument = connected(&controller).await;
    let err = instrument.get_tips(None, None).await.unwrap_err();
    assert!(matches!(err, Error::ChannelUnavailable));
}

#[tokio::test]
async fn move_to_position_targets_the_well() {
    let controller = SimulatedController::new();
    let (instrument, channel) = running(&controller).await;

    let offset = fluent::well_name_to_offset("B2", 8).unwrap();
    instrument
        .move_to_position(ArmRole::SingleChannel, "Plate_1", offset, Some(10.0))
        .await
        .unwrap();

    let executed = channel.executed();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].contains("Plate_1"));
}
