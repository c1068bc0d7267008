//! End-to-end session lifecycle against the scripted controller.

use fluent_protocol::{ArmRole, PipettingParams};
use fluent_runtime::testing::{SimulatedChannel, SimulatedController};
use fluent_runtime::{
    Capabilities, ConnectMode, Error, RuntimeHandle, SessionController, SessionState,
    SessionTiming,
};
use std::sync::Arc;
use std::time::Duration;

fn session(controller: &Arc<SimulatedController>) -> SessionController {
    SessionController::new(
        controller.clone(),
        Capabilities::default(),
        SessionTiming::fast(),
    )
}

#[tokio::test]
async fn connect_reaches_edit_mode() {
    let controller = SimulatedController::new();
    controller.running_after(2);
    controller.runtime_after(2);
    let session = session(&controller);

    session.connect(ConnectMode::Simulation).await.unwrap();

    assert_eq!(session.state(), SessionState::EditMode);
    assert_eq!(controller.launched_mode(), Some(ConnectMode::Simulation));
    assert!(session.is_simulation());
    assert_eq!(session.status().await.unwrap(), 6);
}

#[tokio::test]
async fn connect_fails_when_process_never_starts() {
    let controller = SimulatedController::new();
    controller.running_after(10_000);
    let session = session(&controller);

    let err = session.connect(ConnectMode::Attach).await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn missing_runtime_degrades_instead_of_failing() {
    let controller = SimulatedController::new();
    controller.without_runtime();
    let session = session(&controller);

    session.connect(ConnectMode::Attach).await.unwrap();
    assert_eq!(session.state(), SessionState::Ready);

    let err = session.run_method("Any").await.unwrap_err();
    assert!(matches!(err, Error::RuntimeUnavailable));
}

#[tokio::test]
async fn run_method_without_connect_is_rejected() {
    let controller = SimulatedController::new();
    let session = session(&controller);
    let err = session.run_method("Wash").await.unwrap_err();
    assert!(matches!(err, Error::RuntimeUnavailable));
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn run_method_walks_prepare_then_start() {
    let controller = SimulatedController::new();
    let session = session(&controller);
    session.connect(ConnectMode::Simulation).await.unwrap();

    assert!(session.run_method("DailyWash").await.unwrap());
    assert_eq!(session.state(), SessionState::Running);
    assert_eq!(controller.runtime().prepared(), vec!["DailyWash".to_string()]);
    assert_eq!(session.status().await.unwrap(), 12);
}

#[tokio::test]
async fn running_method_short_circuits_to_true() {
    let controller = SimulatedController::new();
    let session = session(&controller);
    session.connect(ConnectMode::Simulation).await.unwrap();

    controller.runtime().set_status(12);
    controller.runtime().set_method_running(true);
    assert!(session.run_method("DailyWash").await.unwrap());
    // No new preparation happened.
    assert!(controller.runtime().prepared().is_empty());
    assert_eq!(session.state(), SessionState::Running);
}

#[tokio::test]
async fn immediate_stop_after_start_surfaces_abort() {
    let controller = SimulatedController::new();
    let session = session(&controller);
    session.connect(ConnectMode::Simulation).await.unwrap();

    let runtime = controller.runtime();
    runtime.stall_next_run();
    runtime.set_last_error("liquid detection error");
    runtime.script_statuses(vec![6, 8, 19]);

    let err = session.run_method("Elution").await.unwrap_err();
    match err {
        Error::MethodAborted { status, message } => {
            assert_eq!(status, 19);
            assert_eq!(message, "liquid detection error");
        }
        other => panic!("expected MethodAborted, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::StoppedOnError);
}

#[tokio::test]
async fn recovery_state_is_cleared_before_a_new_run() {
    let controller = SimulatedController::new();
    let session = session(&controller);
    session.connect(ConnectMode::Simulation).await.unwrap();

    let runtime = controller.runtime();
    runtime.set_operations(vec!["DismissRecoveryDialog".into(), "GetStatus".into()]);
    runtime.accept_operation("DismissRecoveryDialog");
    runtime.script_statuses(vec![19, 19]);

    assert!(session.run_method("Elution").await.unwrap());
    assert_eq!(session.state(), SessionState::Running);
    assert!(
        runtime
            .invoked()
            .contains(&"DismissRecoveryDialog".to_string())
    );
    assert!(!runtime.invoked().contains(&"GetStatus".to_string()));
}

#[tokio::test]
async fn pause_resume_stop_track_state() {
    let controller = SimulatedController::new();
    let session = session(&controller);
    session.connect(ConnectMode::Simulation).await.unwrap();
    session.run_method("Transfer").await.unwrap();

    session.pause().await.unwrap();
    assert_eq!(session.state(), SessionState::Busy);
    session.resume().await.unwrap();
    assert_eq!(session.state(), SessionState::Running);
    session.stop().await.unwrap();
    assert_eq!(session.state(), SessionState::EditMode);
    assert!(!controller.runtime().is_method_running().await);
}

#[tokio::test]
async fn channel_then_dispatch_round_trip() {
    let controller = SimulatedController::new();
    let session = session(&controller);
    session.connect(ConnectMode::Simulation).await.unwrap();
    session.run_method("Transfer").await.unwrap();

    let channel = SimulatedChannel::new(1);
    controller.runtime().set_channel(channel.clone(), 1);
    assert!(
        session
            .wait_for_channel(Duration::from_millis(500))
            .await
            .unwrap()
    );

    let descriptor = fluent_protocol::CommandDescriptor::aspirate(
        ArmRole::SingleChannel,
        "Samples",
        vec![100],
        PipettingParams::new(),
    )
    .unwrap();
    session.dispatcher().unwrap().dispatch(&descriptor).await.unwrap();
    let executed = channel.executed();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].contains("LihaAspirateScriptCommandDataV5"));
}

#[tokio::test]
async fn available_methods_come_from_the_runtime() {
    let controller = SimulatedController::new();
    controller
        .runtime()
        .set_methods(vec!["Wash".into(), "Elution".into()]);
    let session = session(&controller);
    session.connect(ConnectMode::Simulation).await.unwrap();
    assert_eq!(
        session.available_methods().await.unwrap(),
        vec!["Wash".to_string(), "Elution".to_string()]
    );
}

#[tokio::test]
async fn disconnect_releases_everything() {
    let controller = SimulatedController::new();
    let session = session(&controller);
    session.connect(ConnectMode::Simulation).await.unwrap();

    session.disconnect().await.unwrap();
    assert_eq!(session.state(), SessionState::Disconnected);
    assert!(controller.is_closed());
    assert!(matches!(
        session.status().await.unwrap_err(),
        Error::RuntimeUnavailable
    ));
}

#[tokio::test]
async fn double_connect_is_rejected() {
    let controller = SimulatedController::new();
    let session = session(&controller);
    session.connect(ConnectMode::Simulation).await.unwrap();
    let err = session.connect(ConnectMode::Simulation).await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
}
