//! The fixed instruction vocabulary emitted by the engine.
//!
//! Every [`Instruction`] carries fully-resolved numeric parameters —
//! no step-level policy enums survive into this layer. The on-device
//! interpreter and the visualization layer both consume this
//! vocabulary; the engine's state transition functions are keyed by it.
//!
//! Identical engine inputs always produce identical instructions:
//! instructions carry no random keys or timestamps, so a whole
//! timeline can be memoized by value.

use crate::id::{LabwareId, ModuleId, PipetteId, WellName};
use crate::state::{DeckLocation, Mount, NozzleLayout};
use serde::{Deserialize, Serialize};

/// Offset from a well's bottom center, in mm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WellOffset {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WellOffset {
    /// An offset straight up from the well bottom.
    #[must_use]
    pub fn z(z: f64) -> Self {
        Self { x: 0.0, y: 0.0, z }
    }
}

/// One temperature plateau of a thermocycler profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileStep {
    pub celsius: f64,
    pub hold_seconds: f64,
}

/// A single low-level hardware instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Instruction {
    Aspirate {
        pipette: PipetteId,
        labware: LabwareId,
        well: WellName,
        volume: f64,
        flow_rate: f64,
        offset: WellOffset,
        /// Set when this aspirate draws air rather than liquid.
        is_air_gap: bool,
    },
    AspirateInPlace {
        pipette: PipetteId,
        volume: f64,
        flow_rate: f64,
    },
    Dispense {
        pipette: PipetteId,
        labware: LabwareId,
        well: WellName,
        volume: f64,
        flow_rate: f64,
        offset: WellOffset,
        is_air_gap: bool,
    },
    DispenseInPlace {
        pipette: PipetteId,
        volume: f64,
        flow_rate: f64,
    },
    BlowOut {
        pipette: PipetteId,
        labware: LabwareId,
        well: WellName,
        flow_rate: f64,
        /// Offset below the well top, in mm.
        offset_from_top_mm: f64,
    },
    BlowOutInPlace {
        pipette: PipetteId,
        flow_rate: f64,
    },
    TouchTip {
        pipette: PipetteId,
        labware: LabwareId,
        well: WellName,
        offset_from_bottom_mm: f64,
    },
    PickUpTip {
        pipette: PipetteId,
        tiprack: LabwareId,
        well: WellName,
    },
    DropTip {
        pipette: PipetteId,
        labware: LabwareId,
        well: WellName,
    },
    DropTipInPlace {
        pipette: PipetteId,
    },
    MoveToWell {
        pipette: PipetteId,
        labware: LabwareId,
        well: WellName,
        offset: WellOffset,
    },
    MoveToAddressableArea {
        pipette: PipetteId,
        area: String,
    },
    MoveLabware {
        labware: LabwareId,
        new_location: DeckLocation,
        use_gripper: bool,
    },
    ConfigureForVolume {
        pipette: PipetteId,
        volume: f64,
    },
    ConfigureNozzleLayout {
        pipette: PipetteId,
        layout: NozzleLayout,
    },
    WaitForDuration {
        seconds: f64,
    },
    LoadPipette {
        pipette: PipetteId,
        mount: Mount,
    },
    Home,
    TemperatureModuleSetTarget {
        module: ModuleId,
        celsius: f64,
    },
    TemperatureModuleWaitForTarget {
        module: ModuleId,
        celsius: f64,
    },
    TemperatureModuleDeactivate {
        module: ModuleId,
    },
    HeaterShakerSetTargetTemperature {
        module: ModuleId,
        celsius: f64,
    },
    HeaterShakerWaitForTemperature {
        module: ModuleId,
    },
    HeaterShakerSetShakeSpeed {
        module: ModuleId,
        rpm: f64,
    },
    HeaterShakerDeactivateShaker {
        module: ModuleId,
    },
    HeaterShakerDeactivateHeater {
        module: ModuleId,
    },
    HeaterShakerOpenLatch {
        module: ModuleId,
    },
    HeaterShakerCloseLatch {
        module: ModuleId,
    },
    MagneticModuleEngage {
        module: ModuleId,
        height_mm: f64,
    },
    MagneticModuleDisengage {
        module: ModuleId,
    },
    ThermocyclerOpenLid {
        module: ModuleId,
    },
    ThermocyclerCloseLid {
        module: ModuleId,
    },
    ThermocyclerSetTargetBlockTemperature {
        module: ModuleId,
        celsius: f64,
    },
    ThermocyclerWaitForBlockTemperature {
        module: ModuleId,
    },
    ThermocyclerSetTargetLidTemperature {
        module: ModuleId,
        celsius: f64,
    },
    ThermocyclerWaitForLidTemperature {
        module: ModuleId,
    },
    ThermocyclerDeactivateBlock {
        module: ModuleId,
    },
    ThermocyclerDeactivateLid {
        module: ModuleId,
    },
    ThermocyclerRunProfile {
        module: ModuleId,
        profile: Vec<ProfileStep>,
        /// Liquid volume in the block wells, used by the device to
        /// model thermal mass.
        block_max_volume: Option<f64>,
    },
}

impl Instruction {
    /// Stable kind tag, for logging and test assertions.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Aspirate { .. } => "aspirate",
            Self::AspirateInPlace { .. } => "aspirateInPlace",
            Self::Dispense { .. } => "dispense",
            Self::DispenseInPlace { .. } => "dispenseInPlace",
            Self::BlowOut { .. } => "blowout",
            Self::BlowOutInPlace { .. } => "blowOutInPlace",
            Self::TouchTip { .. } => "touchTip",
            Self::PickUpTip { .. } => "pickUpTip",
            Self::DropTip { .. } => "dropTip",
            Self::DropTipInPlace { .. } => "dropTipInPlace",
            Self::MoveToWell { .. } => "moveToWell",
            Self::MoveToAddressableArea { .. } => "moveToAddressableArea",
            Self::MoveLabware { .. } => "moveLabware",
            Self::ConfigureForVolume { .. } => "configureForVolume",
            Self::ConfigureNozzleLayout { .. } => "configureNozzleLayout",
            Self::WaitForDuration { .. } => "waitForDuration",
            Self::LoadPipette { .. } => "loadPipette",
            Self::Home => "home",
            Self::TemperatureModuleSetTarget { .. } => "temperatureModule/setTargetTemperature",
            Self::TemperatureModuleWaitForTarget { .. } => "temperatureModule/waitForTemperature",
            Self::TemperatureModuleDeactivate { .. } => "temperatureModule/deactivate",
            Self::HeaterShakerSetTargetTemperature { .. } => {
                "heaterShaker/setTargetTemperature"
            }
            Self::HeaterShakerWaitForTemperature { .. } => "heaterShaker/waitForTemperature",
            Self::HeaterShakerSetShakeSpeed { .. } => "heaterShaker/setAndWaitForShakeSpeed",
            Self::HeaterShakerDeactivateShaker { .. } => "heaterShaker/deactivateShaker",
            Self::HeaterShakerDeactivateHeater { .. } => "heaterShaker/deactivateHeater",
            Self::HeaterShakerOpenLatch { .. } => "heaterShaker/openLabwareLatch",
            Self::HeaterShakerCloseLatch { .. } => "heaterShaker/closeLabwareLatch",
            Self::MagneticModuleEngage { .. } => "magneticModule/engage",
            Self::MagneticModuleDisengage { .. } => "magneticModule/disengage",
            Self::ThermocyclerOpenLid { .. } => "thermocycler/openLid",
            Self::ThermocyclerCloseLid { .. } => "thermocycler/closeLid",
            Self::ThermocyclerSetTargetBlockTemperature { .. } => {
                "thermocycler/setTargetBlockTemperature"
            }
            Self::ThermocyclerWaitForBlockTemperature { .. } => {
                "thermocycler/waitForBlockTemperature"
            }
            Self::ThermocyclerSetTargetLidTemperature { .. } => {
                "thermocycler/setTargetLidTemperature"
            }
            Self::ThermocyclerWaitForLidTemperature { .. } => {
                "thermocycler/waitForLidTemperature"
            }
            Self::ThermocyclerDeactivateBlock { .. } => "thermocycler/deactivateBlock",
            Self::ThermocyclerDeactivateLid { .. } => "thermocycler/deactivateLid",
            Self::ThermocyclerRunProfile { .. } => "thermocycler/runProfile",
        }
    }
}
