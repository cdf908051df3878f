//! Destination-polymorphic emission helpers.
//!
//! Compound creators stay agnostic about whether liquid leaves the tip
//! into a labware well, a trash bin, or the waste chute. They resolve
//! the destination id once (through
//! [`EntityCatalog::destination_kind`]) into a [`LiquidDestination`]
//! and hand it to these helpers, which expand to the right intent
//! sequence: a well gets a direct instruction, the fixtures get a
//! move-to-area followed by the matching in-place instruction.

use crate::intent::CommandIntent;
use crate::atomic::pipetting::{AspirateParams, BlowOutParams, DispenseParams};
use stepgen_types::{
    ChannelCount, EntityCatalog, EquipmentId, GenerationError, LabwareId, NozzleLayout, PipetteId,
    RobotState, WellName, WellOffset,
};

/// A fully-resolved place liquid can go.
#[derive(Debug, Clone, PartialEq)]
pub enum LiquidDestination {
    Well { labware: LabwareId, well: WellName },
    WasteChute(EquipmentId),
    TrashBin(EquipmentId),
}

/// Resolves a raw destination id (and optional well) against the
/// catalog.
pub fn resolve_destination(
    id: &str,
    well: Option<&WellName>,
    catalog: &EntityCatalog,
) -> Result<LiquidDestination, Vec<GenerationError>> {
    match catalog.destination_kind(id) {
        Some(stepgen_types::DestinationKind::Labware) => {
            let labware = LabwareId::new(id);
            let well = well.cloned().ok_or_else(|| {
                vec![GenerationError::LabwareDoesNotExist {
                    labware: labware.clone(),
                }]
            })?;
            Ok(LiquidDestination::Well { labware, well })
        }
        Some(stepgen_types::DestinationKind::WasteChute) => {
            Ok(LiquidDestination::WasteChute(EquipmentId::new(id)))
        }
        Some(stepgen_types::DestinationKind::TrashBin) => {
            Ok(LiquidDestination::TrashBin(EquipmentId::new(id)))
        }
        None => Err(vec![GenerationError::EquipmentDoesNotExist]),
    }
}

/// Addressable-area name for the waste chute, sized to the active
/// channel layout.
#[must_use]
pub fn waste_chute_area(
    pipette: &PipetteId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> String {
    let channels = catalog
        .pipette(pipette)
        .map(|spec| {
            let nozzles = state.pipettes.get(pipette).and_then(|p| p.nozzles);
            match (spec.channels, nozzles) {
                (ChannelCount::NinetySix, Some(NozzleLayout::Column)) => 8,
                (c, _) => c.count(),
            }
        })
        .unwrap_or(1);
    format!("{channels}ChannelWasteChute")
}

/// Addressable-area name for a movable trash bin.
#[must_use]
pub fn trash_bin_area(equipment: &EquipmentId, catalog: &EntityCatalog) -> String {
    let cutout = catalog
        .equipment_spec(equipment)
        .and_then(|spec| spec.location.clone())
        .unwrap_or_default();
    format!("movableTrash{cutout}")
}

fn area_for(
    destination: &LiquidDestination,
    pipette: &PipetteId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Option<String> {
    match destination {
        LiquidDestination::Well { .. } => None,
        LiquidDestination::WasteChute(_) => Some(waste_chute_area(pipette, catalog, state)),
        LiquidDestination::TrashBin(equipment) => Some(trash_bin_area(equipment, catalog)),
    }
}

/// Dispense `volume` at the destination.
#[must_use]
pub fn dispense_at(
    pipette: &PipetteId,
    destination: &LiquidDestination,
    volume: f64,
    flow_rate: f64,
    offset: WellOffset,
    tip_rack_uri: &str,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Vec<CommandIntent> {
    match destination {
        LiquidDestination::Well { labware, well } => vec![CommandIntent::Dispense(DispenseParams {
            pipette: pipette.clone(),
            labware: labware.clone(),
            well: well.clone(),
            volume,
            flow_rate,
            offset,
            is_air_gap: false,
            tip_rack_uri: tip_rack_uri.to_string(),
        })],
        _ => vec![
            CommandIntent::MoveToAddressableArea {
                pipette: pipette.clone(),
                area: area_for(destination, pipette, catalog, state).unwrap_or_default(),
            },
            CommandIntent::DispenseInPlace {
                pipette: pipette.clone(),
                volume,
                flow_rate,
            },
        ],
    }
}

/// Draw an air gap over the destination after dispensing there.
#[must_use]
pub fn air_gap_at(
    pipette: &PipetteId,
    destination: &LiquidDestination,
    volume: f64,
    flow_rate: f64,
    well_top_offset_mm: f64,
    tip_rack_uri: &str,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Vec<CommandIntent> {
    match destination {
        LiquidDestination::Well { labware, well } => {
            let z = catalog
                .labware_def(labware)
                .and_then(|def| def.well_depth(well))
                .unwrap_or(0.0)
                + well_top_offset_mm;
            vec![CommandIntent::Aspirate(AspirateParams {
                pipette: pipette.clone(),
                labware: labware.clone(),
                well: well.clone(),
                volume,
                flow_rate,
                offset: WellOffset::z(z),
                is_air_gap: true,
                tip_rack_uri: tip_rack_uri.to_string(),
            })]
        }
        _ => vec![
            CommandIntent::MoveToAddressableArea {
                pipette: pipette.clone(),
                area: area_for(destination, pipette, catalog, state).unwrap_or_default(),
            },
            CommandIntent::AspirateInPlace {
                pipette: pipette.clone(),
                volume,
                flow_rate,
            },
        ],
    }
}

/// Blow leftover liquid out at the destination.
#[must_use]
pub fn blow_out_at(
    pipette: &PipetteId,
    destination: &LiquidDestination,
    flow_rate: f64,
    offset_from_top_mm: f64,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Vec<CommandIntent> {
    match destination {
        LiquidDestination::Well { labware, well } => {
            vec![CommandIntent::BlowOut(BlowOutParams {
                pipette: pipette.clone(),
                labware: labware.clone(),
                well: well.clone(),
                flow_rate,
                offset_from_top_mm,
            })]
        }
        _ => vec![
            CommandIntent::MoveToAddressableArea {
                pipette: pipette.clone(),
                area: area_for(destination, pipette, catalog, state).unwrap_or_default(),
            },
            CommandIntent::BlowOutInPlace {
                pipette: pipette.clone(),
                flow_rate,
            },
        ],
    }
}

/// Drop the current tip at a drop-tip equipment fixture.
pub fn drop_tip_at(
    pipette: &PipetteId,
    location: &EquipmentId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<Vec<CommandIntent>, Vec<GenerationError>> {
    if !state.pipette_has_tip(pipette) {
        return Ok(Vec::new());
    }
    let area = match catalog.equipment_spec(location).map(|spec| spec.kind) {
        Some(stepgen_types::EquipmentKind::WasteChute) => {
            waste_chute_area(pipette, catalog, state)
        }
        Some(stepgen_types::EquipmentKind::TrashBin) => trash_bin_area(location, catalog),
        _ => return Err(vec![GenerationError::DropTipLocationDoesNotExist]),
    };
    Ok(vec![
        CommandIntent::MoveToAddressableArea {
            pipette: pipette.clone(),
            area,
        },
        CommandIntent::DropTipInPlace {
            pipette: pipette.clone(),
        },
    ])
}
