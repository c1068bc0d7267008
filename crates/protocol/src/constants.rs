//! Default values shared across the workspace.
//!
//! These strings come straight from the controller's configuration and are
//! centralized here so the encoders and the high-level API agree on them.

/// Default liquid class for general use. "Water Free Single" is the safest
/// choice in simulation.
pub const DEFAULT_LIQUID_CLASS: &str = "Water Free Single";

/// Alternative liquid class that skips liquid detection.
pub const WATER_TEST_NO_DETECT: &str = "Water Test No Detect";

/// Default waste chute for the 8-channel arm.
pub const DEFAULT_FCA_WASTE: &str = "FCA Thru Deck Waste Chute_1";

/// Default waste chute for the 96-channel arm.
pub const DEFAULT_MCA_WASTE: &str = "MCA Thru Deck Waste Chute with Tip Drop Guide_2";

/// Default 200 µL tips for the 8-channel arm.
pub const DEFAULT_DITI_TYPE: &str = "TOOLTYPE:LiHa.TecanDiTi/TOOLNAME:FCA, 200ul";

/// 200 µL filtered SBS-format tips.
pub const DITI_200UL_FILTERED_SBS: &str =
    "TOOLTYPE:LiHa.TecanDiTi/TOOLNAME:FCA, 200ul Filtered SBS";

/// Default 150 µL filtered tips for the 96-channel arm.
pub const DEFAULT_MCA_DITI_TYPE: &str =
    "TOOLTYPE:LiHa.TecanDiTi/TOOLNAME:MCA, 150ul Filtered SBS";

/// Rows on a 96-well plate.
pub const ROWS_96_WELL: u32 = 8;
/// Columns on a 96-well plate.
pub const COLS_96_WELL: u32 = 12;
/// Rows on a 384-well plate.
pub const ROWS_384_WELL: u32 = 16;
/// Columns on a 384-well plate.
pub const COLS_384_WELL: u32 = 24;

/// Default airgap volume in µL.
pub const DEFAULT_AIRGAP_VOLUME: u32 = 10;
/// Default airgap speed.
pub const DEFAULT_AIRGAP_SPEED: u32 = 70;

/// Default grip force on the 1-10 scale.
pub const DEFAULT_GRIP_FORCE: u32 = 5;
/// Standard SBS plate width in mm.
pub const DEFAULT_GRIP_WIDTH_SBS: f64 = 85.48;

/// Number of tips on the 8-channel arm.
pub const FCA_TIP_COUNT: usize = 8;
