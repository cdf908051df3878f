//! Caller-facing step arguments.
//!
//! One tagged record per user-authored step kind, supplied by the
//! excluded authoring layer. Policy enums ([`ChangeTip`],
//! [`BlowoutLocation`]) live only at this level — compound command
//! creators resolve them into fully-numeric instructions.

use crate::command::ProfileStep;
use crate::id::{EquipmentId, LabwareId, ModuleId, PipetteId, WellName};
use crate::state::{DeckLocation, NozzleLayout};
use serde::{Deserialize, Serialize};

/// How often a transfer-family step replaces its tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeTip {
    /// Fresh tip before every chunk.
    Always,
    /// Fresh tip once at the start of the step.
    Once,
    /// Reuse whatever tip the pipette already carries.
    Never,
}

/// Where a blow-out discharges leftover liquid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlowoutLocation {
    /// Back into the chunk's source well.
    SourceWell,
    /// Into the destination well.
    DestWell,
    /// Into well A1 of the named labware.
    Labware(LabwareId),
    /// Into a trash bin or waste chute.
    Equipment(EquipmentId),
}

/// A repeated aspirate/dispense agitation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixSettings {
    pub volume: f64,
    pub times: usize,
}

/// A pause taken at a fixed height inside the current well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelaySettings {
    pub seconds: f64,
    pub mm_from_bottom: f64,
}

/// Knobs shared by every transfer-family step (transfer, consolidate,
/// distribute, mix).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferFamilyOptions {
    /// Definition URI of the tiprack model this step draws from.
    pub tip_rack_uri: String,
    /// Requested nozzle layout for high-throughput pipettes.
    pub nozzles: Option<NozzleLayout>,
    /// Where replaced tips are dropped.
    pub drop_tip_location: EquipmentId,
    pub change_tip: ChangeTip,
    pub aspirate_flow_rate: f64,
    pub dispense_flow_rate: f64,
    pub aspirate_offset_from_bottom_mm: f64,
    pub dispense_offset_from_bottom_mm: f64,
    pub aspirate_x_offset: f64,
    pub aspirate_y_offset: f64,
    pub dispense_x_offset: f64,
    pub dispense_y_offset: f64,
    pub aspirate_delay: Option<DelaySettings>,
    pub dispense_delay: Option<DelaySettings>,
    /// Touch-tip height after each aspirate, mm from well bottom.
    pub touch_tip_after_aspirate_mm_from_bottom: Option<f64>,
    /// Touch-tip height after each dispense, mm from well bottom.
    pub touch_tip_after_dispense_mm_from_bottom: Option<f64>,
    /// Air gap drawn after each aspirate (0 disables).
    pub aspirate_air_gap_volume: f64,
    /// Air gap drawn after the final dispense of a chunk (0 disables).
    pub dispense_air_gap_volume: f64,
    pub blowout_location: Option<BlowoutLocation>,
    pub blowout_flow_rate: f64,
    pub blowout_offset_from_top_mm: f64,
}

/// Move a uniform volume from each source well to the paired
/// destination well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferArgs {
    pub pipette: PipetteId,
    pub source_labware: LabwareId,
    pub source_wells: Vec<WellName>,
    pub dest_labware: LabwareId,
    pub dest_wells: Vec<WellName>,
    /// Volume per well pair, µL.
    pub volume: f64,
    pub pre_wet_tip: bool,
    pub mix_before_aspirate: Option<MixSettings>,
    pub mix_in_destination: Option<MixSettings>,
    pub options: TransferFamilyOptions,
}

/// Aspirate from several source wells in sequence, dispensing the
/// accumulated volume into one destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidateArgs {
    pub pipette: PipetteId,
    pub source_labware: LabwareId,
    pub source_wells: Vec<WellName>,
    /// Destination id: labware, waste chute, or trash bin.
    pub dest: String,
    /// Destination well when `dest` is labware.
    pub dest_well: Option<WellName>,
    /// Volume per source well, µL.
    pub volume: f64,
    pub pre_wet_tip: bool,
    pub mix_first_aspirate: Option<MixSettings>,
    pub mix_in_destination: Option<MixSettings>,
    pub options: TransferFamilyOptions,
}

/// Aspirate once from a single source, dispensing a uniform volume
/// into several destination wells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributeArgs {
    pub pipette: PipetteId,
    pub source_labware: LabwareId,
    pub source_well: WellName,
    pub dest_labware: LabwareId,
    pub dest_wells: Vec<WellName>,
    /// Volume per destination well, µL.
    pub volume: f64,
    /// Extra volume aspirated per chunk to guard against short
    /// delivery on the chunk's last dispense.
    pub disposal_volume: Option<f64>,
    pub mix_before_aspirate: Option<MixSettings>,
    pub options: TransferFamilyOptions,
}

/// Repeatedly aspirate and dispense in place within each listed well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixArgs {
    pub pipette: PipetteId,
    pub labware: LabwareId,
    pub wells: Vec<WellName>,
    pub volume: f64,
    pub times: usize,
    /// Touch-tip height after mixing each well, mm from well bottom.
    pub touch_tip_mm_from_bottom: Option<f64>,
    pub options: TransferFamilyOptions,
}

/// Move labware between deck locations, manually or with the gripper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveLabwareArgs {
    pub labware: LabwareId,
    pub new_location: DeckLocation,
    pub use_gripper: bool,
}

/// One group of profile steps executed `repetitions` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCycle {
    pub steps: Vec<ProfileStep>,
    pub repetitions: u32,
}

/// Run a thermocycler temperature profile, then hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermocyclerProfileArgs {
    pub module: ModuleId,
    pub cycles: Vec<ProfileCycle>,
    /// Lid target held for the whole profile.
    pub profile_target_lid_temp: f64,
    /// Liquid volume in the block wells, µL.
    pub profile_volume: f64,
    /// Block target after the profile completes, if held.
    pub block_target_temp_hold: Option<f64>,
    /// Lid target after the profile completes, if held.
    pub lid_target_temp_hold: Option<f64>,
    /// Whether the lid is left open after the profile.
    pub lid_open_hold: bool,
}

/// Drive the thermocycler to a target state (lid, block, both).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermocyclerStateArgs {
    pub module: ModuleId,
    pub block_target_temp: Option<f64>,
    pub lid_target_temp: Option<f64>,
    pub lid_open: bool,
}

/// Set a module's target temperature and keep going.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetTemperatureArgs {
    pub module: ModuleId,
    pub celsius: f64,
}

/// Pause until a module reaches its target temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitForTemperatureArgs {
    pub module: ModuleId,
    /// Explicit target; defaults to the module's current target.
    pub celsius: Option<f64>,
}

/// Deactivate a temperature module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeactivateTemperatureArgs {
    pub module: ModuleId,
}

/// Configure a heater-shaker: temperature, shake, latch, optional
/// timed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaterShakerArgs {
    pub module: ModuleId,
    pub target_temperature: Option<f64>,
    pub rpm: Option<f64>,
    pub latch_open: bool,
    /// When set, run for this long and then deactivate.
    pub timer_seconds: Option<f64>,
}

/// Engage the magnetic block at a height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngageMagnetArgs {
    pub module: ModuleId,
    pub height_mm: f64,
}

/// Disengage the magnetic block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisengageMagnetArgs {
    pub module: ModuleId,
}

/// One user-authored step, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum StepArgs {
    Transfer(TransferArgs),
    Consolidate(ConsolidateArgs),
    Distribute(DistributeArgs),
    Mix(MixArgs),
    MoveLabware(MoveLabwareArgs),
    ThermocyclerProfile(ThermocyclerProfileArgs),
    ThermocyclerState(ThermocyclerStateArgs),
    SetTemperature(SetTemperatureArgs),
    WaitForTemperature(WaitForTemperatureArgs),
    DeactivateTemperature(DeactivateTemperatureArgs),
    HeaterShaker(HeaterShakerArgs),
    EngageMagnet(EngageMagnetArgs),
    DisengageMagnet(DisengageMagnetArgs),
}
