//! Labware movement, addressable-area motion, and support creators.

use crate::collision;
use crate::creator::{CreatorOutput, CreatorResult};
use stepgen_types::{
    DeckLocation, EntityCatalog, GenerationError, Instruction, LabwareCategory, LabwareId,
    ModuleState, NozzleLayout, PipetteId, RobotState,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MoveLabwareParams {
    pub labware: LabwareId,
    pub new_location: DeckLocation,
    pub use_gripper: bool,
}

/// Whether a heater-shaker's latch currently blocks putting labware
/// on or taking it off the module.
fn heater_shaker_blocks_move(labware: &LabwareId, state: &RobotState) -> Option<GenerationError> {
    let module = collision::module_under_labware(labware, state)?;
    match state.module_state(module) {
        Some(ModuleState::HeaterShaker {
            target_speed: Some(_),
            ..
        }) => Some(GenerationError::HeaterShakerIsShaking),
        Some(ModuleState::HeaterShaker {
            latch_open: false, ..
        }) => Some(GenerationError::HeaterShakerLatchClosed),
        _ => None,
    }
}

/// Validation battery for moving labware, gathered in one pass.
fn move_labware_errors(
    params: &MoveLabwareParams,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Vec<GenerationError> {
    let mut errors = Vec::new();

    let Some(current) = state.labware.get(&params.labware) else {
        return vec![GenerationError::LabwareDoesNotExist {
            labware: params.labware.clone(),
        }];
    };
    if *current == DeckLocation::WasteChute {
        errors.push(GenerationError::LabwareDiscardedInWasteChute);
    }

    if params.use_gripper {
        if !catalog.has_gripper() {
            errors.push(GenerationError::GripperRequired);
        }
        if state.tip_state.pipettes.values().any(|has| *has) {
            errors.push(GenerationError::PipetteHasTip);
        }
        let ungrippable = catalog.labware_def(&params.labware).is_some_and(|def| {
            matches!(
                def.display_category,
                LabwareCategory::Adapter | LabwareCategory::AluminumBlock
            )
        });
        if ungrippable {
            errors.push(GenerationError::CannotMoveWithGripper);
        }
    } else if params.new_location == DeckLocation::WasteChute {
        // only the gripper can reach into the chute
        errors.push(GenerationError::GripperRequired);
    }

    if let Some(err) = heater_shaker_blocks_move(&params.labware, state) {
        errors.push(err);
    }
    if collision::thermocycler_lid_blocks(&params.labware, state) {
        errors.push(GenerationError::ThermocyclerLidClosed);
    }

    match &params.new_location {
        DeckLocation::Slot(slot) => {
            let occupied_by_labware = state.labware.iter().any(|(id, loc)| {
                id != &params.labware && loc.slot_name() == Some(slot.as_str())
            });
            let occupied_by_module = state.modules.values().any(|m| m.slot == *slot);
            if occupied_by_labware || occupied_by_module {
                errors.push(GenerationError::MultipleEntitiesOnSameSlot);
            }
        }
        DeckLocation::Module(module) => match state.module_state(module) {
            None => errors.push(GenerationError::MissingModule {
                module: module.clone(),
            }),
            Some(ModuleState::Thermocycler { lid_open, .. }) if *lid_open != Some(true) => {
                errors.push(GenerationError::ThermocyclerLidClosed);
            }
            Some(ModuleState::HeaterShaker {
                latch_open: false, ..
            }) => {
                errors.push(GenerationError::HeaterShakerLatchClosed);
            }
            _ => {
                let occupied = state.labware.iter().any(|(id, loc)| {
                    id != &params.labware && *loc == DeckLocation::Module(module.clone())
                });
                if occupied {
                    errors.push(GenerationError::MultipleEntitiesOnSameSlot);
                }
            }
        },
        DeckLocation::Labware(adapter) => {
            if !state.labware.contains_key(adapter) {
                errors.push(GenerationError::LabwareDoesNotExist {
                    labware: adapter.clone(),
                });
            }
        }
        DeckLocation::WasteChute => {
            if !catalog.has_waste_chute() {
                errors.push(GenerationError::EquipmentDoesNotExist);
            }
        }
        DeckLocation::OffDeck => {}
    }

    errors
}

pub fn move_labware(
    params: &MoveLabwareParams,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    let errors = move_labware_errors(params, catalog, state);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CreatorOutput::one(Instruction::MoveLabware {
        labware: params.labware.clone(),
        new_location: params.new_location.clone(),
        use_gripper: params.use_gripper,
    }))
}

pub fn move_to_addressable_area(
    pipette: &PipetteId,
    area: &str,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    let errors = super::pipetting::in_place_errors(pipette, catalog, state);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CreatorOutput::one(Instruction::MoveToAddressableArea {
        pipette: pipette.clone(),
        area: area.to_string(),
    }))
}

pub fn delay(seconds: f64) -> CreatorResult {
    Ok(CreatorOutput::one(Instruction::WaitForDuration { seconds }))
}

pub fn configure_for_volume(
    pipette: &PipetteId,
    volume: f64,
    catalog: &EntityCatalog,
) -> CreatorResult {
    if catalog.pipette(pipette).is_none() {
        return Err(vec![GenerationError::PipetteDoesNotExist {
            pipette: pipette.clone(),
        }]);
    }
    Ok(CreatorOutput::one(Instruction::ConfigureForVolume {
        pipette: pipette.clone(),
        volume,
    }))
}

pub fn configure_nozzle_layout(
    pipette: &PipetteId,
    layout: NozzleLayout,
    catalog: &EntityCatalog,
) -> CreatorResult {
    if catalog.pipette(pipette).is_none() {
        return Err(vec![GenerationError::PipetteDoesNotExist {
            pipette: pipette.clone(),
        }]);
    }
    Ok(CreatorOutput::one(Instruction::ConfigureNozzleLayout {
        pipette: pipette.clone(),
        layout,
    }))
}
