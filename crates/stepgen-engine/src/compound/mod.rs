//! Compound command creators.
//!
//! Each creator plans one user-authored step as a flat
//! [`CommandIntent`] sequence and runs it through the pipeline fold.
//! Planning validates step-level preconditions up front (the pipette
//! must exist, chunk math must be satisfiable) and bails on the first
//! failure; per-intent hazards are left to the atomic creators inside
//! the fold.

mod liquid;
mod modules;
mod thermocycler;

pub use liquid::{consolidate, distribute, mix, transfer};
pub use modules::{
    deactivate_temperature, disengage_magnet, engage_magnet, heater_shaker, set_temperature,
    wait_for_temperature,
};
pub use thermocycler::{thermocycler_profile, thermocycler_state};

use crate::atomic::motion::MoveLabwareParams;
use crate::atomic::pipetting::{AspirateParams, DispenseParams, MoveToWellParams, TouchTipParams};
use crate::creator::StepOutput;
use crate::dest::LiquidDestination;
use crate::intent::CommandIntent;
use crate::pipeline;
use stepgen_types::{
    ChangeTip, DelaySettings, EntityCatalog, EquipmentId, EquipmentKind, GenerationError,
    LabwareId, MoveLabwareArgs, PipetteId, RobotState, TransferFamilyOptions, WellName, WellOffset,
};

/// Height above the well top at which air gaps are drawn, mm.
pub(crate) const AIR_GAP_ABOVE_WELL_TOP_MM: f64 = 1.0;

pub fn move_labware(
    args: &MoveLabwareArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let intents = vec![CommandIntent::MoveLabware(MoveLabwareParams {
        labware: args.labware.clone(),
        new_location: args.new_location.clone(),
        use_gripper: args.use_gripper,
    })];
    pipeline::reduce_intents(&intents, catalog, state.clone())
}

/// Whether the tip is replaced before the chunk at `chunk_index`.
pub(crate) fn replaces_tip(change_tip: ChangeTip, chunk_index: usize) -> bool {
    match change_tip {
        ChangeTip::Always => true,
        ChangeTip::Once => chunk_index == 0,
        ChangeTip::Never => false,
    }
}

pub(crate) fn replace_tip_intent(
    pipette: &PipetteId,
    options: &TransferFamilyOptions,
) -> CommandIntent {
    CommandIntent::ReplaceTip {
        pipette: pipette.clone(),
        tip_rack_uri: options.tip_rack_uri.clone(),
        drop_tip_location: options.drop_tip_location.clone(),
        nozzles: options.nozzles,
    }
}

pub(crate) fn aspirate_intent(
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    volume: f64,
    options: &TransferFamilyOptions,
) -> CommandIntent {
    CommandIntent::Aspirate(AspirateParams {
        pipette: pipette.clone(),
        labware: labware.clone(),
        well: well.clone(),
        volume,
        flow_rate: options.aspirate_flow_rate,
        offset: WellOffset {
            x: options.aspirate_x_offset,
            y: options.aspirate_y_offset,
            z: options.aspirate_offset_from_bottom_mm,
        },
        is_air_gap: false,
        tip_rack_uri: options.tip_rack_uri.clone(),
    })
}

pub(crate) fn dispense_intent(
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    volume: f64,
    options: &TransferFamilyOptions,
) -> CommandIntent {
    CommandIntent::Dispense(DispenseParams {
        pipette: pipette.clone(),
        labware: labware.clone(),
        well: well.clone(),
        volume,
        flow_rate: options.dispense_flow_rate,
        offset: WellOffset {
            x: options.dispense_x_offset,
            y: options.dispense_y_offset,
            z: options.dispense_offset_from_bottom_mm,
        },
        is_air_gap: false,
        tip_rack_uri: options.tip_rack_uri.clone(),
    })
}

/// An air-gap dispense at the top of a well, emitted before the
/// liquid dispense so the gap never mixes into the destination.
pub(crate) fn dispense_air_gap_intent(
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    volume: f64,
    options: &TransferFamilyOptions,
    catalog: &EntityCatalog,
) -> CommandIntent {
    let top = catalog
        .labware_def(labware)
        .and_then(|def| def.well_depth(well))
        .unwrap_or(0.0);
    CommandIntent::Dispense(DispenseParams {
        pipette: pipette.clone(),
        labware: labware.clone(),
        well: well.clone(),
        volume,
        flow_rate: options.dispense_flow_rate,
        offset: WellOffset::z(top),
        is_air_gap: true,
        tip_rack_uri: options.tip_rack_uri.clone(),
    })
}

pub(crate) fn touch_tip_intent(
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    offset_from_bottom_mm: f64,
) -> CommandIntent {
    CommandIntent::TouchTip(TouchTipParams {
        pipette: pipette.clone(),
        labware: labware.clone(),
        well: well.clone(),
        offset_from_bottom_mm,
    })
}

/// A pause at a fixed height inside a well: move there, then wait.
pub(crate) fn delay_in_well_intents(
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    delay: &DelaySettings,
) -> Vec<CommandIntent> {
    vec![
        CommandIntent::MoveToWell(MoveToWellParams {
            pipette: pipette.clone(),
            labware: labware.clone(),
            well: well.clone(),
            offset: WellOffset::z(delay.mm_from_bottom),
        }),
        CommandIntent::Delay {
            seconds: delay.seconds,
        },
    ]
}

/// In-well mix cycles: aspirate then dispense `times` times.
pub(crate) fn mix_intents(
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    volume: f64,
    times: usize,
    options: &TransferFamilyOptions,
) -> Vec<CommandIntent> {
    let mut intents = Vec::with_capacity(times * 2);
    for _ in 0..times {
        intents.push(aspirate_intent(pipette, labware, well, volume, options));
        intents.push(dispense_intent(pipette, labware, well, volume, options));
    }
    intents
}

/// Resolves a step-level blow-out policy into a concrete destination.
pub(crate) fn resolve_blowout_destination(
    location: &stepgen_types::BlowoutLocation,
    source: (&LabwareId, &WellName),
    dest: &LiquidDestination,
    catalog: &EntityCatalog,
) -> Result<LiquidDestination, Vec<GenerationError>> {
    use stepgen_types::BlowoutLocation;
    match location {
        BlowoutLocation::SourceWell => Ok(LiquidDestination::Well {
            labware: source.0.clone(),
            well: source.1.clone(),
        }),
        BlowoutLocation::DestWell => Ok(dest.clone()),
        BlowoutLocation::Labware(labware) => Ok(LiquidDestination::Well {
            labware: labware.clone(),
            well: WellName::new("A1"),
        }),
        BlowoutLocation::Equipment(equipment) => equipment_destination(equipment, catalog),
    }
}

pub(crate) fn equipment_destination(
    equipment: &EquipmentId,
    catalog: &EntityCatalog,
) -> Result<LiquidDestination, Vec<GenerationError>> {
    match catalog.equipment_spec(equipment).map(|spec| spec.kind) {
        Some(EquipmentKind::WasteChute) => Ok(LiquidDestination::WasteChute(equipment.clone())),
        Some(EquipmentKind::TrashBin) => Ok(LiquidDestination::TrashBin(equipment.clone())),
        _ => Err(vec![GenerationError::EquipmentDoesNotExist]),
    }
}
