//! The high-level instrument API.

use crate::options::ConnectOptions;
use fluent_protocol::constants::{
    DEFAULT_DITI_TYPE, DEFAULT_FCA_WASTE, DEFAULT_MCA_DITI_TYPE, DEFAULT_MCA_WASTE,
};
use fluent_protocol::{ArmRole, CommandDescriptor, OneOrMany, PipettingParams};
use fluent_runtime::{InstrumentProcess, Result, SessionController, SessionState};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A connected Fluent instrument.
///
/// One `Fluent` owns one controller session. Method lifecycle calls go to
/// the controller's runtime; worktable operations (tips, pipetting, arm and
/// gripper moves, dialogs) are dispatched through the execution channel of
/// the running method, so they require [`Fluent::run_method`] followed by
/// [`Fluent::wait_for_channel`] first.
pub struct Fluent {
    session: Arc<SessionController>,
    channel_budget: Duration,
}

impl Fluent {
    /// Connects to the controller reached through `process`.
    pub async fn connect(
        process: Arc<dyn InstrumentProcess>,
        options: ConnectOptions,
    ) -> Result<Self> {
        let session = Arc::new(
            SessionController::new(process, options.capabilities, options.timing)
                .with_recovery_registry(options.recovery),
        );
        session.connect(options.mode).await?;
        Ok(Self {
            session,
            channel_budget: options.channel_budget,
        })
    }

    /// Shuts the controller down and releases the session.
    pub async fn disconnect(&self) -> Result<()> {
        self.session.disconnect().await
    }

    /// The underlying session, for state inspection.
    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Raw controller status code; see [`fluent_runtime::FluentStatus`] for
    /// the known values.
    pub async fn status(&self) -> Result<i32> {
        self.session.status().await
    }

    /// Whether the controller runs in simulation mode.
    pub fn is_simulation(&self) -> bool {
        self.session.is_simulation()
    }

    /// Methods the controller can run right now.
    pub async fn available_methods(&self) -> Result<Vec<String>> {
        self.session.available_methods().await
    }

    /// Prepares and starts a method. Idempotent while one is running.
    pub async fn run_method(&self, name: &str) -> Result<bool> {
        self.session.run_method(name).await
    }

    /// Waits for the running method's execution channel, up to the
    /// configured budget. `Ok(false)` means the channel never appeared.
    pub async fn wait_for_channel(&self) -> Result<bool> {
        self.session.wait_for_channel(self.channel_budget).await
    }

    /// Pauses the active run.
    pub async fn pause_run(&self) -> Result<()> {
        self.session.pause().await
    }

    /// Resumes a paused run.
    pub async fn resume_run(&self) -> Result<()> {
        self.session.resume().await
    }

    /// Stops the active run.
    pub async fn stop_method(&self) -> Result<()> {
        self.session.stop().await
    }

    /// Closes the current method and returns the controller to the editor.
    pub async fn close_method(&self) -> Result<()> {
        self.session.runtime()?.close_method().await
    }

    async fn dispatch(&self, descriptor: CommandDescriptor) -> Result<()> {
        self.session.dispatcher()?.dispatch(&descriptor).await
    }

    /// Picks up disposable tips with the 8-channel arm.
    ///
    /// `diti_type` defaults to the 200 µL FCA tips, `tips` to all 8 channels.
    pub async fn get_tips(&self, diti_type: Option<&str>, tips: Option<Vec<u32>>) -> Result<()> {
        self.dispatch(CommandDescriptor::get_tips(
            ArmRole::SingleChannel,
            diti_type.unwrap_or(DEFAULT_DITI_TYPE),
            None,
            None,
            tips,
        ))
        .await
    }

    /// Drops the 8-channel arm's tips, by default into the waste chute.
    pub async fn drop_tips(&self, waste: Option<&str>, tips: Option<Vec<u32>>) -> Result<()> {
        self.dispatch(CommandDescriptor::drop_tips(
            ArmRole::SingleChannel,
            waste.unwrap_or(DEFAULT_FCA_WASTE),
            tips,
        ))
        .await
    }

    /// Aspirates with the 8-channel arm. The volume list defines how many
    /// tips take part; see [`PipettingParams`] for wells, tips, and liquid
    /// class.
    pub async fn aspirate(
        &self,
        labware: &str,
        volumes: impl Into<OneOrMany<u32>>,
        params: PipettingParams,
    ) -> Result<()> {
        self.dispatch(CommandDescriptor::aspirate(
            ArmRole::SingleChannel,
            labware,
            volumes,
            params,
        )?)
        .await
    }

    /// Dispenses with the 8-channel arm.
    pub async fn dispense(
        &self,
        labware: &str,
        volumes: impl Into<OneOrMany<u32>>,
        params: PipettingParams,
    ) -> Result<()> {
        self.dispatch(CommandDescriptor::dispense(
            ArmRole::SingleChannel,
            labware,
            volumes,
            params,
        )?)
        .await
    }

    /// Picks up a full head of tips with the 96-channel arm.
    pub async fn mca_get_tips(&self, diti_type: Option<&str>) -> Result<()> {
        self.dispatch(CommandDescriptor::get_tips(
            ArmRole::MultiChannel,
            diti_type.unwrap_or(DEFAULT_MCA_DITI_TYPE),
            None,
            None,
            None,
        ))
        .await
    }

    /// Drops the 96-channel arm's tips, by default into its waste chute.
    pub async fn mca_drop_tips(&self, waste: Option<&str>) -> Result<()> {
        self.dispatch(CommandDescriptor::drop_tips(
            ArmRole::MultiChannel,
            waste.unwrap_or(DEFAULT_MCA_WASTE),
            None,
        ))
        .await
    }

    /// Aspirates with the 96-channel arm.
    pub async fn mca_aspirate(
        &self,
        labware: &str,
        volumes: impl Into<OneOrMany<u32>>,
        params: PipettingParams,
    ) -> Result<()> {
        self.dispatch(CommandDescriptor::aspirate(
            ArmRole::MultiChannel,
            labware,
            volumes,
            params,
        )?)
        .await
    }

    /// Dispenses with the 96-channel arm.
    pub async fn mca_dispense(
        &self,
        labware: &str,
        volumes: impl Into<OneOrMany<u32>>,
        params: PipettingParams,
    ) -> Result<()> {
        self.dispatch(CommandDescriptor::dispense(
            ArmRole::MultiChannel,
            labware,
            volumes,
            params,
        )?)
        .await
    }

    /// Moves an arm above a labware position.
    pub async fn move_to_position(
        &self,
        arm: ArmRole,
        labware: &str,
        well_offset: u32,
        z_position: Option<f64>,
    ) -> Result<()> {
        self.dispatch(CommandDescriptor::move_to_position(
            arm, labware, well_offset, z_position, None,
        ))
        .await
    }

    /// Moves an arm to its safe position.
    pub async fn move_to_safe(&self, arm: ArmRole) -> Result<()> {
        self.dispatch(CommandDescriptor::move_to_safe(arm)).await
    }

    /// Moves every arm to its safe position, best effort.
    ///
    /// An arm that fails to move is logged and skipped; worktables without
    /// one of the arms refuse its command and that is not an error here.
    pub async fn move_all_arms_to_safe(&self) -> Result<()> {
        for arm in [ArmRole::SingleChannel, ArmRole::MultiChannel, ArmRole::Gripper] {
            if let Err(e) = self.move_to_safe(arm).await {
                warn!(?arm, error = %e, "arm did not move to its safe position");
            }
        }
        Ok(())
    }

    /// Picks up labware with the gripper.
    pub async fn get_labware(
        &self,
        labware: &str,
        grip_force: Option<u32>,
        grip_width: Option<f64>,
    ) -> Result<()> {
        self.dispatch(CommandDescriptor::get_labware(labware, grip_force, grip_width))
            .await
    }

    /// Places held labware at a target location.
    pub async fn put_labware(&self, labware: &str, target: &str) -> Result<()> {
        self.dispatch(CommandDescriptor::put_labware(labware, target))
            .await
    }

    /// Gripper transfer: pick the labware up, then place it at `target`.
    pub async fn transfer_labware(
        &self,
        labware: &str,
        target: &str,
        grip_force: Option<u32>,
        grip_width: Option<f64>,
    ) -> Result<()> {
        self.get_labware(labware, grip_force, grip_width).await?;
        self.put_labware(labware, target).await
    }

    /// Passes raw command content through to the running method.
    pub async fn generic_command(&self, content: &str) -> Result<()> {
        self.dispatch(CommandDescriptor::generic_command(content))
            .await
    }

    /// Shows a prompt dialog to the operator.
    pub async fn user_prompt(&self, text: &str) -> Result<()> {
        self.dispatch(CommandDescriptor::user_prompt(text)).await
    }

    /// Runs a named subroutine of the current method.
    pub async fn run_subroutine(&self, name: &str) -> Result<()> {
        self.dispatch(CommandDescriptor::subroutine(name)).await
    }
}
